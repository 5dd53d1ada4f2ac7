use chrono::{NaiveDate, NaiveTime};
use odonto::{
    database, load_config,
    models::{
        scheduling::Appointment,
        users::{NewUser, Role, User},
    },
    queries,
    services::users::hash_password,
};
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Teste123";

/// Test database wrapper for test isolation
///
/// Every account a test creates gets an email starting with
/// `test_<test_name>`; availabilities, appointments and records hang off
/// those accounts and go away with them (ON DELETE CASCADE).
pub struct TestDb {
    pub pool: PgPool,
    test_prefix: String,
}

impl TestDb {
    /// Connects to the configured database and claims a data namespace.
    ///
    /// # Important Rules:
    /// - **Use a name unique to the test**, usually the test function name
    /// - Existing rows with this prefix are removed first (handles test retries)
    /// - Panics when the database is unreachable; these tests need Postgres
    ///
    /// # Example Usage:
    /// ```rust
    /// #[tokio::test]
    /// async fn test_booking() {
    ///     let test_db = TestDb::new("test_booking").await;
    ///     // ... test logic
    /// }
    /// ```
    pub async fn new(test_name: &str) -> Self {
        let config = load_config().expect("Failed to load config");

        let pool = database::connect(&config.database)
            .await
            .expect("Failed to connect to database");

        database::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let test_prefix = format!("test_{}", test_name).to_lowercase();
        Self::cleanup_prefix(&pool, &test_prefix).await;

        Self { pool, test_prefix }
    }

    pub async fn get_connection(&self) -> sqlx::pool::PoolConnection<sqlx::Postgres> {
        self.pool
            .acquire()
            .await
            .expect("Failed to get database connection")
    }

    /// Get the test prefix for this test instance
    pub fn test_prefix(&self) -> &str {
        &self.test_prefix
    }

    /// Generate a unique test email with proper prefix
    pub fn email(&self, label: &str) -> String {
        let uuid = Uuid::now_v7().simple().to_string();
        format!("{}_{}_{}@example.com", self.test_prefix, label, &uuid[24..])
    }

    /// Inserts an account directly, password `TEST_PASSWORD`.
    pub async fn create_account(&self, label: &str, role: Role, dentist_id: Option<Uuid>) -> User {
        let mut conn = self.get_connection().await;
        queries::users::create_user(
            &mut conn,
            NewUser {
                name: format!("{} {}", role, label),
                email: self.email(label),
                password_hash: hash_password(TEST_PASSWORD).expect("Failed to hash password"),
                role,
                age: None,
                phone: None,
                photo: None,
                dentist_id,
            },
        )
        .await
        .expect("Failed to create test account")
    }

    pub async fn create_dentist(&self, label: &str) -> User {
        self.create_account(label, Role::Dentist, None).await
    }

    /// A patient owned by `dentist_id`.
    pub async fn create_patient(&self, label: &str, dentist_id: Uuid) -> User {
        self.create_account(label, Role::Patient, Some(dentist_id)).await
    }

    pub async fn find_appointment(&self, id: Uuid) -> Option<Appointment> {
        sqlx::query_as::<_, Appointment>(
            "SELECT id, patient_id, dentist_id, date, time, created_at FROM appointments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .expect("Failed to load appointment")
    }

    /// Number of appointment rows stored for one exact slot.
    pub async fn appointments_at(&self, dentist_id: Uuid, date: NaiveDate, time: NaiveTime) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM appointments WHERE dentist_id = $1 AND date = $2 AND time = $3",
        )
        .bind(dentist_id)
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to count appointments")
    }

    /// Clean up users with specific test prefix
    async fn cleanup_prefix(pool: &PgPool, prefix: &str) {
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(format!("{}%", prefix))
            .execute(pool)
            .await
            .expect("Failed to cleanup test data");
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // Cleanup test data when TestDb is dropped
        let pool = self.pool.clone();
        let prefix = self.test_prefix.clone();
        tokio::spawn(async move {
            let _ = sqlx::query("DELETE FROM users WHERE email LIKE $1")
                .bind(format!("{}%", prefix))
                .execute(&pool)
                .await;
        });
    }
}
