use async_trait::async_trait;
use odonto::{
    AppState, Config, create_router, database, load_config,
    models::users::Role,
    services::{
        jwt::issue_access_token,
        notifications::{EmailMessage, Mailer},
        uploads::PHOTOS_DIR,
    },
};
use reqwest::{
    Client,
    multipart::{Form, Part},
    redirect::Policy,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Mailer that keeps every message in memory
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> odonto::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Patient form as the dentist area posts it, with a small png photo.
pub fn patient_form_with_photo(name: &str, email: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("email", email.to_string())
        .part(
            "photo",
            Part::bytes(b"\x89PNG fake".to_vec()).file_name("retrato.png"),
        )
}

/// HTTP test application wrapper
///
/// Runs the real router on a random port. Each test gets its own server
/// instance to allow parallel test execution.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// HTTP client for making requests (keeps cookies)
    pub client: Client,
    pub config: Config,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Server over a lazily connected pool: fine for every request that is
    /// answered before a handler touches the database.
    pub async fn new() -> Self {
        let config = load_config().expect("Failed to load config");
        let pool = database::connect_lazy(&config.database).expect("Failed to build lazy pool");
        Self::with_pool(pool, config).await
    }

    /// Server over an already connected pool.
    pub async fn with_pool(pool: PgPool, mut config: Config) -> Self {
        config.uploads.dir = std::env::temp_dir()
            .join(format!("odonto_test_uploads_{}", Uuid::now_v7()))
            .to_string_lossy()
            .to_string();

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(pool, config.clone()).with_mailer(mailer.clone());
        state.uploads.init().await.expect("Failed to create upload dirs");

        let app = create_router(state);

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            config,
            mailer,
        }
    }

    /// Get the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Files currently stored in the patient photo directory.
    pub fn stored_photos(&self) -> Vec<std::path::PathBuf> {
        let dir = std::path::Path::new(&self.config.uploads.dir).join(PHOTOS_DIR);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Signs an access token the way login does.
    pub fn token_for(&self, user_id: Uuid, role: Role) -> String {
        let (token, _) = issue_access_token(
            user_id,
            role,
            self.config.jwt.secret.expose_secret(),
            self.config.jwt.access_token_expiration_minutes,
        )
        .expect("Failed to generate token");
        token
    }
}
