use std::{env, fmt::Display, str::FromStr};

use tracing::info;

/// All environment-driven settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub fast2sms_api_key: Option<String>,
    pub brevo_api_key: Option<String>,
    pub email_from: Option<String>,
    pub email_from_name: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_callback_url: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub frontend_url: String,
    pub rate_limit_per_sec: u64,
    pub auth_rate_limit_max: u32,
    pub max_file_size: usize,
    pub environment: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "5000"),
            database_path: try_load("DATABASE_PATH", "matrimony.db"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set in environment for production!"),
            jwt_expire_days: try_load("JWT_EXPIRE_DAYS", "7"),
            fast2sms_api_key: optional("FAST2SMS_API_KEY"),
            brevo_api_key: optional("BREVO_API_KEY"),
            email_from: optional("EMAIL_FROM"),
            email_from_name: optional("EMAIL_FROM_NAME"),
            google_client_id: optional("GOOGLE_CLIENT_ID"),
            google_client_secret: optional("GOOGLE_CLIENT_SECRET"),
            google_callback_url: optional("GOOGLE_CALLBACK_URL"),
            cloudinary_cloud_name: optional("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: optional("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: optional("CLOUDINARY_API_SECRET"),
            frontend_url: try_load("FRONTEND_URL", "http://localhost:5173"),
            rate_limit_per_sec: try_load("RATE_LIMIT_PER_SEC", "25"),
            auth_rate_limit_max: try_load("AUTH_RATE_LIMIT_MAX", "5"),
            max_file_size: try_load("MAX_FILE_SIZE", "52428800"),
            environment: try_load("ENVIRONMENT", "development"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Google OAuth needs a real client id/secret pair, not the .env.example
    /// placeholders people leave in place.
    pub fn google_oauth_configured(&self) -> bool {
        let invalid = [
            "your-google-client-id-here.apps.googleusercontent.com",
            "your-google-client-secret-here",
        ];
        match (&self.google_client_id, &self.google_client_secret) {
            (Some(id), Some(secret)) => {
                !id.is_empty()
                    && !secret.is_empty()
                    && !invalid.contains(&id.as_str())
                    && !invalid.contains(&secret.as_str())
            }
            _ => false,
        }
    }

    pub fn cloudinary_configured(&self) -> bool {
        self.cloudinary_cloud_name.is_some()
            && self.cloudinary_api_key.is_some()
            && self.cloudinary_api_secret.is_some()
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| format!("Invalid {key} value: {e}"))
        .expect("Environment misconfigured!")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn google_oauth_rejects_placeholders() {
        let mut config = test_config();
        config.google_client_id =
            Some("your-google-client-id-here.apps.googleusercontent.com".to_string());
        config.google_client_secret = Some("your-google-client-secret-here".to_string());
        assert!(!config.google_oauth_configured());

        config.google_client_id = Some("1234.apps.googleusercontent.com".to_string());
        config.google_client_secret = Some("real-secret".to_string());
        assert!(config.google_oauth_configured());
    }

    #[test]
    fn google_oauth_requires_both_credentials() {
        let mut config = test_config();
        config.google_client_id = Some("1234.apps.googleusercontent.com".to_string());
        config.google_client_secret = None;
        assert!(!config.google_oauth_configured());
    }

    pub(crate) fn test_config() -> Config {
        Config {
            port: 5000,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expire_days: 7,
            fast2sms_api_key: None,
            brevo_api_key: None,
            email_from: None,
            email_from_name: None,
            google_client_id: None,
            google_client_secret: None,
            google_callback_url: None,
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
            frontend_url: "http://localhost:5173".to_string(),
            rate_limit_per_sec: 25,
            auth_rate_limit_max: 5,
            max_file_size: 52_428_800,
            environment: "development".to_string(),
        }
    }
}
