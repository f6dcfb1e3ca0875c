use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::user::User;
use crate::services::jwt::JwtManager;
use crate::utils::crypto::PasswordManager;
use crate::utils::validation::{format_phone_number, Validator};

pub struct AuthService {
    db: Arc<SqliteDatabase>,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(db: Arc<SqliteDatabase>, jwt: JwtManager) -> Self {
        Self { db, jwt }
    }

    /// Phone + password login. Credentials are checked first; the phone
    /// verification and account status gates apply even to correct
    /// credentials.
    pub async fn login(&self, raw_phone: &str, password: &str) -> Result<(User, String)> {
        let phone = format_phone_number(raw_phone);
        if phone.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Please provide phone and password".to_string(),
            ));
        }

        let user = self.db.get_user_by_phone(&phone).await?;
        let mut user = match user {
            Some(user) => user,
            None => {
                return Err(AppError::AuthenticationError(
                    "Invalid phone or password".to_string(),
                ))
            }
        };

        let password_matches = match &user.password_hash {
            Some(hash) => PasswordManager::verify_password(password, hash)?,
            None => false,
        };
        if !password_matches {
            return Err(AppError::AuthenticationError(
                "Invalid phone or password".to_string(),
            ));
        }

        if !user.is_phone_verified {
            return Err(AppError::AuthorizationError(
                "Please verify your phone number first".to_string(),
            ));
        }

        if !user.is_active || user.is_blocked {
            return Err(AppError::AuthorizationError(
                "Your account has been deactivated or blocked".to_string(),
            ));
        }

        user.last_login = Some(Utc::now());
        user.login_count += 1;
        self.db.update_user(&user).await?;

        let token = self.jwt.generate_token(&user.id)?;
        info!(action = "login_success", user_id = %user.id);
        Ok((user, token))
    }

    pub fn issue_token(&self, user_id: &Uuid) -> Result<String> {
        self.jwt.generate_token(user_id)
    }

    /// Resolve a bearer/cookie token to a live user record. Distinct 401s
    /// per failure cause; 403 for deactivated or blocked accounts.
    pub async fn resolve_token(&self, token: &str) -> Result<User> {
        let user_id = self.jwt.validate_token(token)?;

        let user = self
            .db
            .get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::AuthenticationError("User no longer exists.".to_string()))?;

        if !user.is_active || user.is_blocked {
            return Err(AppError::AuthorizationError(
                "Your account has been deactivated or blocked.".to_string(),
            ));
        }

        Ok(user)
    }

    pub async fn update_password(
        &self,
        user_id: &Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(User, String)> {
        let mut user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let current_matches = match &user.password_hash {
            Some(hash) => PasswordManager::verify_password(current_password, hash)?,
            None => false,
        };
        if !current_matches {
            return Err(AppError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        Validator::validate_password(new_password)?;
        user.password_hash = Some(PasswordManager::hash_password(new_password)?);
        self.db.update_user(&user).await?;

        let token = self.jwt.generate_token(&user.id)?;
        info!(action = "password_updated", user_id = %user.id);
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::models::user::{AuthProvider, Role};

    async fn seeded_service() -> (AuthService, Arc<SqliteDatabase>, Uuid) {
        let config = test_config();
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_expire_days);
        let service = AuthService::new(db.clone(), jwt);

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            phone: Some("+919876543210".to_string()),
            full_name: Some("Asha".to_string()),
            email: None,
            password_hash: Some(PasswordManager::hash_password("secret1").unwrap()),
            google_id: None,
            auth_provider: AuthProvider::Local,
            is_phone_verified: true,
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
        db.create_user(&user).await.unwrap();
        (service, db, user.id)
    }

    #[tokio::test]
    async fn login_succeeds_and_tracks_logins() {
        let (service, db, user_id) = seeded_service().await;
        let (user, token) = service.login("+919876543210", "secret1").await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.login_count, 1);
        assert!(user.last_login.is_some());
        assert!(!token.is_empty());

        let stored = db.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.login_count, 1);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let (service, _, _) = seeded_service().await;
        let err = service.login("+919876543210", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn login_rejects_unverified_phone_despite_correct_credentials() {
        let (service, db, user_id) = seeded_service().await;
        let mut user = db.get_user_by_id(&user_id).await.unwrap().unwrap();
        user.is_phone_verified = false;
        db.update_user(&user).await.unwrap();

        let err = service.login("+919876543210", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthorizationError(_)));
        assert_eq!(err.to_string(), "Please verify your phone number first");
    }

    #[tokio::test]
    async fn login_rejects_blocked_account_despite_correct_credentials() {
        let (service, db, user_id) = seeded_service().await;
        let mut user = db.get_user_by_id(&user_id).await.unwrap().unwrap();
        user.is_blocked = true;
        db.update_user(&user).await.unwrap();

        let err = service.login("+919876543210", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthorizationError(_)));
    }

    #[tokio::test]
    async fn login_normalizes_the_phone() {
        let (service, _, user_id) = seeded_service().await;
        let (user, _) = service.login("9876543210", "secret1").await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn resolve_token_round_trip_and_blocked_rejection() {
        let (service, db, user_id) = seeded_service().await;
        let token = service.issue_token(&user_id).unwrap();
        let user = service.resolve_token(&token).await.unwrap();
        assert_eq!(user.id, user_id);

        let mut user = db.get_user_by_id(&user_id).await.unwrap().unwrap();
        user.is_active = false;
        db.update_user(&user).await.unwrap();
        let err = service.resolve_token(&token).await.unwrap_err();
        assert!(matches!(err, AppError::AuthorizationError(_)));
    }

    #[tokio::test]
    async fn update_password_requires_the_current_one() {
        let (service, _, user_id) = seeded_service().await;
        let err = service
            .update_password(&user_id, "wrong", "newsecret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));

        service
            .update_password(&user_id, "secret1", "newsecret1")
            .await
            .unwrap();
        service.login("+919876543210", "newsecret1").await.unwrap();
    }
}
