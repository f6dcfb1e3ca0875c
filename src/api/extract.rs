use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// Authenticated caller: token from the bearer header or the session cookie,
/// resolved to a live user record on every request.
pub struct CurrentUser(pub User);

/// Caller restricted to the admin role.
pub struct AdminUser(pub User);

/// Caller whose phone is verified. Admins pass regardless.
pub struct PhoneVerifiedUser(pub User);

/// Caller whose profile has been approved. Admins pass regardless.
pub struct ApprovedUser(pub User);

fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get("token")
        .map(|cookie| cookie.value().to_string())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(|| {
            AppError::AuthenticationError(
                "Not authorized. Please login to access this resource.".to_string(),
            )
        })?;

        let user = state.auth().resolve_token(&token).await?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::AuthorizationError(
                "You do not have permission to perform this action.".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for PhoneVerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() && !user.is_phone_verified {
            return Err(AppError::AuthorizationError(
                "Please verify your phone number first.".to_string(),
            ));
        }
        Ok(PhoneVerifiedUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ApprovedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() && !user.is_profile_approved {
            return Err(AppError::AuthorizationError(
                "Your profile is pending admin approval.".to_string(),
            ));
        }
        Ok(ApprovedUser(user))
    }
}
