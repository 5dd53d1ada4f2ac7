use crate::{
    error::{Error, Result},
    models::users::{NewUser, Role, User},
    queries::is_unique_violation,
};
use sqlx::Postgres;
use uuid::Uuid;

use crate::DbConn;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, age, phone, photo, dentist_id, created_at, updated_at";

/// Creates a new user in the database.
pub async fn create_user(conn: &mut DbConn, new_user: NewUser) -> Result<User> {
    let sql = format!(
        r#"
        INSERT INTO users (name, email, password_hash, role, age, phone, photo, dentist_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "#
    );

    let user = sqlx::query_as::<Postgres, User>(&sql)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.age)
        .bind(&new_user.phone)
        .bind(&new_user.photo)
        .bind(new_user.dentist_id)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "users_email_key") {
                Error::Conflict("E-mail already registered".to_string())
            } else {
                Error::Sqlx(e)
            }
        })?;

    Ok(user)
}

/// Gets a single user by their ID. The user may not exist.
pub async fn get_user_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

    let user = sqlx::query_as::<Postgres, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(user)
}

/// Gets a single user by their email address. The user may not exist.
pub async fn get_user_by_email(conn: &mut DbConn, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

    let user = sqlx::query_as::<Postgres, User>(&sql)
        .bind(email)
        .fetch_optional(conn)
        .await?;

    Ok(user)
}

/// Lists users, optionally restricted to one role, ordered by name.
pub async fn list_users(conn: &mut DbConn, role: Option<Role>) -> Result<Vec<User>> {
    let sql = format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE $1::text IS NULL OR role = $1
        ORDER BY name ASC
        "#
    );

    let users = sqlx::query_as::<Postgres, User>(&sql)
        .bind(role)
        .fetch_all(conn)
        .await?;

    Ok(users)
}

/// Patients a dentist can see: the ones they own plus unowned clinic patients.
pub async fn list_patients_for_dentist(conn: &mut DbConn, dentist_id: Uuid) -> Result<Vec<User>> {
    let sql = format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE role = 'patient' AND (dentist_id = $1 OR dentist_id IS NULL)
        ORDER BY name ASC
        "#
    );

    let patients = sqlx::query_as::<Postgres, User>(&sql)
        .bind(dentist_id)
        .fetch_all(conn)
        .await?;

    Ok(patients)
}

/// The clinic's first registered dentist, used for patients without an owner.
pub async fn get_default_dentist(conn: &mut DbConn) -> Result<Option<User>> {
    let sql = format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE role = 'dentist'
        ORDER BY created_at ASC, id ASC
        LIMIT 1
        "#
    );

    let dentist = sqlx::query_as::<Postgres, User>(&sql)
        .fetch_optional(conn)
        .await?;

    Ok(dentist)
}

/// Updates a user's password hash.
pub async fn update_user_password(conn: &mut DbConn, user_id: Uuid, password_hash: &str) -> Result<()> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(conn)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(Error::NotFound(format!("User with ID {} not found", user_id)));
    }

    Ok(())
}

/// Counts all accounts.
pub async fn count_users(conn: &mut DbConn) -> Result<i64> {
    let count = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(conn)
        .await?;

    Ok(count)
}
