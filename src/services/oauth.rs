use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::user::{AuthProvider, Role, User};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Google OAuth delegation: redirect out, exchange the callback code for an
/// access token, fetch the profile, find-or-create the account.
#[derive(Clone)]
pub struct GoogleOAuth {
    client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    callback_url: Option<String>,
    configured: bool,
}

impl GoogleOAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            callback_url: config.google_callback_url.clone(),
            configured: config.google_oauth_configured() && config.google_callback_url.is_some(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn require_configured(&self) -> Result<(&str, &str, &str)> {
        match (&self.client_id, &self.client_secret, &self.callback_url) {
            (Some(id), Some(secret), Some(callback)) if self.configured => {
                Ok((id, secret, callback))
            }
            _ => Err(AppError::ServiceUnavailable(
                "Google OAuth is not configured on the server".to_string(),
            )),
        }
    }

    /// URL the browser is redirected to; the state parameter comes back on
    /// the callback.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let (client_id, _, callback_url) = self.require_configured()?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20profile%20email&state={}",
            AUTH_ENDPOINT,
            urlencode(client_id),
            urlencode(callback_url),
            urlencode(state),
        ))
    }

    pub async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile> {
        let (client_id, client_secret, callback_url) = self.require_configured()?;

        let token: TokenResponse = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::AuthenticationError(format!("OAuth code exchange failed: {}", e)))?
            .json()
            .await?;

        let profile: GoogleProfile = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::AuthenticationError(format!("OAuth userinfo failed: {}", e)))?
            .json()
            .await?;

        Ok(profile)
    }

    /// Find-or-create semantics: an account already carrying the google id
    /// wins; otherwise an account with the same email gets the google id
    /// linked; otherwise a new google-provider account is created.
    pub async fn find_or_create_user(
        &self,
        db: &Arc<SqliteDatabase>,
        profile: &GoogleProfile,
    ) -> Result<User> {
        if let Some(user) = db.get_user_by_google_id(&profile.id).await? {
            return Ok(user);
        }

        if let Some(email) = &profile.email {
            if let Some(mut user) = db.get_user_by_email(email).await? {
                user.google_id = Some(profile.id.clone());
                user.is_email_verified = true;
                user.is_phone_verified = true;
                db.update_user(&user).await?;
                info!(action = "google_account_linked", user_id = %user.id);
                return Ok(user);
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            phone: None,
            full_name: profile.name.clone(),
            email: profile.email.clone(),
            password_hash: None,
            google_id: Some(profile.id.clone()),
            auth_provider: AuthProvider::Google,
            is_phone_verified: true,
            is_email_verified: true,
            is_profile_approved: false,
            role: Role::User,
            is_active: true,
            is_blocked: false,
            community_certificate: None,
            otp: None,
            otp_expiry: None,
            profile_id: None,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };
        db.create_user(&user).await?;

        info!(action = "google_account_created", user_id = %user.id);
        Ok(user)
    }
}

fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn configured() -> GoogleOAuth {
        let mut config = test_config();
        config.google_client_id = Some("1234.apps.googleusercontent.com".to_string());
        config.google_client_secret = Some("real-secret".to_string());
        config.google_callback_url =
            Some("http://localhost:5000/api/auth/google/callback".to_string());
        GoogleOAuth::new(&config)
    }

    #[test]
    fn unconfigured_oauth_reports_service_unavailable() {
        let oauth = GoogleOAuth::new(&test_config());
        assert!(!oauth.is_configured());
        let err = oauth.authorization_url("state123").unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn authorization_url_carries_client_and_state() {
        let oauth = configured();
        let url = oauth.authorization_url("state123").unwrap();
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("client_id=1234.apps.googleusercontent.com"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000"));
    }

    #[tokio::test]
    async fn find_or_create_links_by_email_then_matches_by_google_id() {
        use crate::utils::crypto::PasswordManager;

        let oauth = configured();
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());

        let now = Utc::now();
        let existing = User {
            id: Uuid::new_v4(),
            phone: Some("+919876543210".to_string()),
            full_name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            password_hash: Some(PasswordManager::hash_password("secret1").unwrap()),
            google_id: None,
            auth_provider: AuthProvider::Local,
            is_phone_verified: false,
            is_email_verified: false,
            is_profile_approved: false,
            role: Role::User,
            is_active: true,
            is_blocked: false,
            community_certificate: None,
            otp: None,
            otp_expiry: None,
            profile_id: None,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };
        db.create_user(&existing).await.unwrap();

        let profile = GoogleProfile {
            id: "google-123".to_string(),
            email: Some("asha@example.com".to_string()),
            name: Some("Asha".to_string()),
        };

        let linked = oauth.find_or_create_user(&db, &profile).await.unwrap();
        assert_eq!(linked.id, existing.id);
        assert_eq!(linked.google_id.as_deref(), Some("google-123"));
        assert!(linked.is_email_verified);
        assert!(linked.is_phone_verified);

        // second login resolves by google id without touching anything
        let again = oauth.find_or_create_user(&db, &profile).await.unwrap();
        assert_eq!(again.id, existing.id);
    }

    #[tokio::test]
    async fn find_or_create_makes_a_new_google_account() {
        let oauth = configured();
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let profile = GoogleProfile {
            id: "google-456".to_string(),
            email: Some("new@example.com".to_string()),
            name: Some("New Person".to_string()),
        };
        let user = oauth.find_or_create_user(&db, &profile).await.unwrap();
        assert_eq!(user.auth_provider, AuthProvider::Google);
        assert!(user.phone.is_none());
        assert!(user.password_hash.is_none());
    }
}
