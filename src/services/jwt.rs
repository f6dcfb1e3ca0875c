use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    expire_days: i64,
}

impl JwtManager {
    pub fn new(secret: String, expire_days: i64) -> Self {
        Self {
            secret,
            expire_days,
        }
    }

    pub fn generate_token(&self, user_id: &Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.expire_days)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::JwtError(format!("Failed to generate token: {}", e)))
    }

    /// Decode a token to the user id it was issued for. Expired and invalid
    /// tokens fail with distinct messages so clients can tell them apart.
    pub fn validate_token(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::AuthenticationError("Token expired. Please login again.".to_string())
            }
            _ => AppError::AuthenticationError("Invalid token. Please login again.".to_string()),
        })?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid token. Please login again.".to_string()))
    }

    pub fn expire_days(&self) -> i64 {
        self.expire_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let manager = JwtManager::new("test-secret".to_string(), 7);
        let user_id = Uuid::new_v4();
        let token = manager.generate_token(&user_id).unwrap();
        assert_eq!(manager.validate_token(&token).unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), 7);
        let other = JwtManager::new("other-secret".to_string(), 7);
        let token = manager.generate_token(&Uuid::new_v4()).unwrap();
        let err = other.validate_token(&token).unwrap_err();
        assert!(err.to_string().contains("Invalid token"));
    }

    #[test]
    fn expired_token_gets_a_distinct_message() {
        let manager = JwtManager::new("test-secret".to_string(), -1);
        let token = manager.generate_token(&Uuid::new_v4()).unwrap();
        let err = manager.validate_token(&token).unwrap_err();
        assert!(err.to_string().contains("Token expired"));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let manager = JwtManager::new("test-secret".to_string(), 7);
        let err = manager.validate_token("not.a.token").unwrap_err();
        assert!(err.to_string().contains("Invalid token"));
    }
}
