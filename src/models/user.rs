use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Phone,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Phone => "phone",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "google" => AuthProvider::Google,
            "phone" => AuthProvider::Phone,
            _ => AuthProvider::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Uploaded eligibility document, pending admin review until `verified`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityCertificate {
    pub filename: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub is_profile_approved: bool,
    pub role: Role,
    pub is_active: bool,
    pub is_blocked: bool,
    pub community_certificate: Option<CommunityCertificate>,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    pub profile_id: Option<Uuid>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Literal comparison against the OTP stored on the user row, valid only
    /// within the expiry window. Used by the resend-verification path.
    pub fn verify_otp(&self, otp: &str) -> bool {
        match (&self.otp, self.otp_expiry) {
            (Some(stored), Some(expiry)) => stored == otp && Utc::now() <= expiry,
            _ => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// User as returned to clients: password and OTP fields stripped.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub is_profile_approved: bool,
    pub role: Role,
    pub is_active: bool,
    pub is_blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_certificate: Option<CommunityCertificate>,
    pub profile_id: Option<Uuid>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            phone: user.phone,
            full_name: user.full_name,
            email: user.email,
            auth_provider: user.auth_provider,
            is_phone_verified: user.is_phone_verified,
            is_email_verified: user.is_email_verified,
            is_profile_approved: user.is_profile_approved,
            role: user.role,
            is_active: user.is_active,
            is_blocked: user.is_blocked,
            community_certificate: user.community_certificate,
            profile_id: user.profile_id,
            last_login: user.last_login,
            login_count: user.login_count,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_with_otp(otp: &str, expiry: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            phone: Some("+919876543210".to_string()),
            full_name: Some("Test".to_string()),
            email: None,
            password_hash: None,
            google_id: None,
            auth_provider: AuthProvider::Local,
            is_phone_verified: false,
            is_email_verified: false,
            is_profile_approved: false,
            role: Role::User,
            is_active: true,
            is_blocked: false,
            community_certificate: None,
            otp: Some(otp.to_string()),
            otp_expiry: Some(expiry),
            profile_id: None,
            last_login: None,
            login_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn verify_otp_accepts_matching_unexpired_code() {
        let user = user_with_otp("482913", Utc::now() + Duration::minutes(10));
        assert!(user.verify_otp("482913"));
    }

    #[test]
    fn verify_otp_rejects_wrong_or_expired_code() {
        let user = user_with_otp("482913", Utc::now() + Duration::minutes(10));
        assert!(!user.verify_otp("000000"));

        let expired = user_with_otp("482913", Utc::now() - Duration::minutes(1));
        assert!(!expired.verify_otp("482913"));
    }

    #[test]
    fn verify_otp_rejects_when_no_code_is_set() {
        let mut user = user_with_otp("482913", Utc::now() + Duration::minutes(10));
        user.otp = None;
        assert!(!user.verify_otp("482913"));
    }
}
