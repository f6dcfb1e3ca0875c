use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::Result;
use crate::services::auth::AuthService;
use crate::services::jwt::JwtManager;
use crate::services::oauth::GoogleOAuth;
use crate::services::registration::{PendingRegistrations, RegistrationService};
use crate::utils::email::Mailer;
use crate::utils::middleware::RateLimiter;
use crate::utils::sms::SmsSender;
use crate::utils::upload::MediaUploader;

/// Everything the handlers share: the database pool, the pending-registration
/// store, external collaborators and the rate limiters. Owned here and
/// injected through axum state, never via module-level globals.
pub struct AppState {
    pub config: Config,
    pub db: Arc<SqliteDatabase>,
    pub pending: Arc<PendingRegistrations>,
    pub jwt: JwtManager,
    pub sms: SmsSender,
    pub mailer: Mailer,
    pub uploader: MediaUploader,
    pub oauth: GoogleOAuth,
    pub global_limiter: RateLimiter,
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let db = Arc::new(SqliteDatabase::new(&config.database_path).await?);
        Ok(Self::with_database(config, db))
    }

    pub fn with_database(config: Config, db: Arc<SqliteDatabase>) -> Arc<Self> {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_expire_days);
        let global_limiter = RateLimiter::new(
            config.rate_limit_per_sec as u32,
            Duration::from_secs(1),
        );
        let auth_limiter = RateLimiter::new(
            config.auth_rate_limit_max,
            Duration::from_secs(15 * 60),
        );

        Arc::new(Self {
            sms: SmsSender::new(&config),
            mailer: Mailer::new(&config),
            uploader: MediaUploader::new(&config),
            oauth: GoogleOAuth::new(&config),
            jwt,
            global_limiter,
            auth_limiter,
            pending: Arc::new(PendingRegistrations::new()),
            db,
            config,
        })
    }

    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(
            self.db.clone(),
            self.pending.clone(),
            self.sms.clone(),
            self.mailer.clone(),
        )
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.jwt.clone())
    }
}
