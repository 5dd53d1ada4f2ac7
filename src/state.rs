use crate::{
    config::Config,
    database::DbPool,
    services::{
        notifications::{Mailer, mailer_from_config},
        uploads::UploadStore,
    },
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers
///
/// Everything here is immutable or internally synchronized; request-scoped
/// data (the caller's identity) travels in request extensions instead.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool; handlers acquire one connection per request
    pub pool: DbPool,
    /// Configuration loaded once at startup
    pub config: Arc<Config>,
    /// Outbound email transport
    pub mailer: Arc<dyn Mailer>,
    /// Image storage for record scans and profile photos
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    /// Create a new AppState instance
    ///
    /// The mailer and upload store are derived from `config`.
    pub fn new(pool: DbPool, config: Config) -> Self {
        let mailer = mailer_from_config(&config.mail);
        let uploads = Arc::new(UploadStore::new(&config.uploads.dir));
        Self {
            pool,
            config: Arc::new(config),
            mailer,
            uploads,
        }
    }

    /// Replaces the mailer, e.g. with a recording one in tests.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
