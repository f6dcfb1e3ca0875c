use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::extract::{AdminUser, ApprovedUser, CurrentUser, PhoneVerifiedUser};
use crate::api::types::*;
use crate::errors::{AppError, Result};
use crate::models::profile::Profile;
use crate::models::user::CommunityCertificate;
use crate::services::registration::VerifiedPhone;
use crate::state::AppState;
use crate::utils::upload::is_allowed_certificate;
use crate::utils::validation::{format_phone_number, validate_phone_number};

// ---- routers ----

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/register-with-firebase", post(register_with_firebase))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/update-password", put(update_password))
        .route("/upload-certificate", post(upload_certificate))
        .route("/google", get(google_auth))
        .route("/google/callback", get(google_callback))
        .route("/onboarding", post(onboarding))
}

pub fn profile_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_profiles).post(upsert_profile))
        .route("/me", get(get_my_profile).put(upsert_profile_update))
        .route("/:id", get(get_profile_by_id))
}

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/profiles/pending", get(pending_profiles))
        .route("/profiles/:id/approve", put(approve_profile))
        .route("/profiles/:id/reject", put(reject_profile))
        .route("/users", get(all_users))
        .route("/users/:id/block", put(toggle_block_user))
}

// ---- session cookie helpers ----

fn session_cookie(state: &AppState, token: &str) -> String {
    let max_age = state.jwt.expire_days() * 24 * 60 * 60;
    let mut cookie = format!(
        "token={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        token, max_age
    );
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

fn expired_cookie(state: &AppState) -> String {
    let mut cookie = "token=none; Max-Age=10; Path=/; HttpOnly; SameSite=Strict".to_string();
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

async fn auth_response(
    state: &AppState,
    status: StatusCode,
    message: &str,
    user: crate::models::user::User,
    token: String,
) -> Result<impl IntoResponse> {
    let profile = state.db.get_profile_by_user(&user.id).await?;
    let cookie = session_cookie(state, &token);
    Ok((
        status,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthResponse {
            status: "success",
            message: message.to_string(),
            token,
            data: AuthData {
                user: UserWithProfile::new(user, profile),
            },
        }),
    ))
}

// ---- auth handlers ----

/// Send an OTP and stash the payload; no account exists until verification.
#[utoipa::path(post, path = "/api/auth/register", request_body = RegisterRequest,
    responses((status = 200, body = RegisterResponse), (status = 400, description = "Validation failure")),
    tag = "Auth")]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let phone = state
        .registration()
        .register(&req.full_name, &req.phone, &req.password, req.email)
        .await?;

    Ok(Json(RegisterResponse {
        status: "success",
        message: "OTP sent successfully. Please verify to complete registration.".to_string(),
        data: RegisterData { phone },
    }))
}

/// Confirm the OTP: either finishes a pending registration or verifies an
/// existing user down the resend path. Both outcomes open a session.
#[utoipa::path(post, path = "/api/auth/verify-otp", request_body = VerifyOtpRequest,
    responses((status = 201, body = AuthResponse, description = "Account created"),
              (status = 200, body = AuthResponse, description = "Phone verified"),
              (status = 400, description = "Invalid or expired OTP")),
    tag = "Auth")]
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse> {
    let verified = state
        .registration()
        .verify_otp(&req.phone, &req.otp)
        .await?;

    let (status, message, user) = match verified {
        VerifiedPhone::Created(outcome) => (
            StatusCode::CREATED,
            "Account created successfully",
            outcome.into_user(),
        ),
        VerifiedPhone::Existing(user) => (StatusCode::OK, "Phone verified successfully", user),
    };

    let token = state.auth().issue_token(&user.id)?;
    auth_response(&state, status, message, user, token).await
}

/// Path B: the phone was already verified with the third-party phone-auth
/// provider on the client.
#[utoipa::path(post, path = "/api/auth/register-with-firebase", request_body = FirebaseRegisterRequest,
    responses((status = 201, body = AuthResponse), (status = 400, description = "Validation failure")),
    tag = "Auth")]
pub async fn register_with_firebase(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FirebaseRegisterRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .registration()
        .register_with_external_assertion(
            &req.phone,
            &req.password,
            &req.full_name,
            &req.firebase_id_token,
        )
        .await?;

    let user = outcome.into_user();
    let token = state.auth().issue_token(&user.id)?;
    auth_response(
        &state,
        StatusCode::CREATED,
        "Account created successfully. Please upload your certificate.",
        user,
        token,
    )
    .await
}

#[utoipa::path(post, path = "/api/auth/resend-otp", request_body = ResendOtpRequest,
    responses((status = 200, body = ApiMessage), (status = 404, description = "User not found")),
    tag = "Auth")]
pub async fn resend_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse> {
    state.registration().resend_otp(&req.phone).await?;
    Ok(Json(ApiMessage::success("OTP sent successfully")))
}

#[utoipa::path(post, path = "/api/auth/login", request_body = LoginRequest,
    responses((status = 200, body = AuthResponse),
              (status = 401, description = "Invalid credentials"),
              (status = 403, description = "Unverified phone or blocked account")),
    tag = "Auth")]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = state.auth().login(&req.phone, &req.password).await?;
    auth_response(&state, StatusCode::OK, "Login successful", user, token).await
}

#[utoipa::path(post, path = "/api/auth/logout",
    responses((status = 200, body = ApiMessage)), tag = "Auth")]
pub async fn logout(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    info!(action = "logout", user_id = %user.id);
    Ok((
        AppendHeaders([(SET_COOKIE, expired_cookie(&state))]),
        Json(ApiMessage::success("Logged out successfully")),
    ))
}

#[utoipa::path(get, path = "/api/auth/me",
    responses((status = 200, body = UserEnvelope), (status = 401, description = "Not authenticated")),
    tag = "Auth")]
pub async fn me(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let profile = state.db.get_profile_by_user(&user.id).await?;
    Ok(Json(UserEnvelope {
        status: "success",
        message: None,
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

#[utoipa::path(put, path = "/api/auth/update-password", request_body = UpdatePasswordRequest,
    responses((status = 200, body = AuthResponse), (status = 401, description = "Wrong current password")),
    tag = "Auth")]
pub async fn update_password(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse> {
    let (user, token) = state
        .auth()
        .update_password(&user.id, &req.current_password, &req.new_password)
        .await?;
    auth_response(
        &state,
        StatusCode::OK,
        "Password updated successfully",
        user,
        token,
    )
    .await
}

async fn read_certificate_part(
    multipart: &mut Multipart,
) -> Result<Option<(String, String, Vec<u8>)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("communityCertificate") {
            continue;
        }
        let filename = field
            .file_name()
            .unwrap_or("certificate")
            .to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?;
        return Ok(Some((filename, content_type, data.to_vec())));
    }
    Ok(None)
}

/// Certificate upload after phone verification; gates admin approval.
#[utoipa::path(post, path = "/api/auth/upload-certificate",
    responses((status = 200, body = CertificateResponse),
              (status = 400, description = "Missing or invalid file"),
              (status = 403, description = "Phone not verified")),
    tag = "Auth")]
pub async fn upload_certificate(
    CurrentUser(mut user): CurrentUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    if !user.is_phone_verified {
        return Err(AppError::AuthorizationError(
            "Please verify your phone number first.".to_string(),
        ));
    }

    let (filename, content_type, data) = read_certificate_part(&mut multipart)
        .await?
        .ok_or_else(|| AppError::ValidationError("Certificate file is required".to_string()))?;

    if !is_allowed_certificate(&content_type) {
        return Err(AppError::ValidationError(
            "Only image and PDF files are allowed".to_string(),
        ));
    }

    let uploaded = state.uploader.upload_certificate(data, &filename).await?;

    let certificate = CommunityCertificate {
        filename: uploaded.filename,
        url: uploaded.url,
        uploaded_at: Utc::now(),
        verified: false,
        verified_by: None,
    };
    user.community_certificate = Some(certificate.clone());
    state.db.update_user(&user).await?;

    info!(action = "certificate_uploaded", user_id = %user.id);
    Ok(Json(CertificateResponse {
        status: "success",
        message: "Certificate uploaded successfully. It will be verified by our team.".to_string(),
        data: CertificateData { certificate },
    }))
}

/// OAuth-entry users land here to attach a phone and certificate in one
/// multipart request. The phone is taken on trust, without an OTP round.
#[utoipa::path(post, path = "/api/auth/onboarding",
    responses((status = 200, body = UserEnvelope),
              (status = 400, description = "Missing phone or certificate")),
    tag = "Auth")]
pub async fn onboarding(
    CurrentUser(mut user): CurrentUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut raw_phone: Option<String> = None;
    let mut certificate: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("phone") => {
                raw_phone = Some(field.text().await.map_err(|e| {
                    AppError::ValidationError(format!("Invalid phone field: {}", e))
                })?);
            }
            Some("communityCertificate") => {
                let filename = field.file_name().unwrap_or("certificate").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::ValidationError(format!("Failed to read upload: {}", e))
                })?;
                certificate = Some((filename, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let (raw_phone, (filename, content_type, data)) = match (raw_phone, certificate) {
        (Some(phone), Some(cert)) => (phone, cert),
        _ => {
            return Err(AppError::ValidationError(
                "Phone number and certificate file are required".to_string(),
            ))
        }
    };

    let phone = format_phone_number(&raw_phone);
    if !validate_phone_number(&phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format".to_string(),
        ));
    }

    if !is_allowed_certificate(&content_type) {
        return Err(AppError::ValidationError(
            "Only image and PDF files are allowed".to_string(),
        ));
    }

    if let Some(existing) = state.db.get_user_by_phone(&phone).await? {
        if existing.id != user.id {
            return Err(AppError::ValidationError(
                "Phone number already registered with another account".to_string(),
            ));
        }
    }

    let uploaded = state.uploader.upload_certificate(data, &filename).await?;

    user.phone = Some(phone.clone());
    user.is_phone_verified = true;
    user.community_certificate = Some(CommunityCertificate {
        filename: uploaded.filename,
        url: uploaded.url,
        uploaded_at: Utc::now(),
        verified: false,
        verified_by: None,
    });
    state.db.update_user(&user).await?;

    // Keep the profile's contact phone in step with the account.
    if let Some(mut profile) = state.db.get_profile_by_user(&user.id).await? {
        profile.phone = phone;
        state.db.update_profile(&profile).await?;
    }

    let profile = state.db.get_profile_by_user(&user.id).await?;
    info!(action = "onboarding_completed", user_id = %user.id);
    Ok(Json(UserEnvelope {
        status: "success",
        message: Some("Onboarding completed successfully".to_string()),
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

// ---- Google OAuth ----

#[utoipa::path(get, path = "/api/auth/google",
    responses((status = 307, description = "Redirect to the provider"),
              (status = 503, description = "OAuth not configured")),
    tag = "Auth")]
pub async fn google_auth(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let url = state.oauth.authorization_url(&Uuid::new_v4().to_string())?;
    Ok(Redirect::temporary(&url))
}

/// Provider redirects back here; on success the browser is forwarded to the
/// frontend callback route with the session token as a query parameter.
#[utoipa::path(get, path = "/api/auth/google/callback",
    responses((status = 307, description = "Redirect to the frontend with a token")),
    tag = "Auth")]
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse> {
    if !state.oauth.is_configured() {
        return Err(AppError::ServiceUnavailable(
            "Google OAuth is not configured on the server".to_string(),
        ));
    }

    let failure = format!("{}/login?error=auth_failed", state.config.frontend_url);

    let code = match (query.code, query.error) {
        (Some(code), None) => code,
        _ => return Ok(Redirect::temporary(&failure)),
    };

    let redirect = async {
        let profile = state.oauth.fetch_profile(&code).await?;
        let user = state.oauth.find_or_create_user(&state.db, &profile).await?;
        let token = state.auth().issue_token(&user.id)?;
        Ok::<String, AppError>(format!(
            "{}/auth/callback?token={}",
            state.config.frontend_url, token
        ))
    }
    .await;

    match redirect {
        Ok(url) => Ok(Redirect::temporary(&url)),
        Err(e) => {
            error!(action = "google_callback_failed", error = %e);
            Ok(Redirect::temporary(&failure))
        }
    }
}

// ---- profile handlers ----

/// Browse candidate profiles. Non-admins only see approved members; the
/// caller is always excluded.
#[utoipa::path(get, path = "/api/profiles", params(BrowseQuery),
    responses((status = 200, body = ProfilesResponse),
              (status = 403, description = "Profile pending approval")),
    tag = "Profiles")]
pub async fn get_profiles(
    ApprovedUser(user): ApprovedUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;
    let approved_only = !user.is_admin();

    let total = state
        .db
        .count_browsable_users(&user.id, approved_only)
        .await?;
    let users = state
        .db
        .list_browsable_users(&user.id, approved_only, limit, offset)
        .await?;

    let mut profiles = Vec::with_capacity(users.len());
    for candidate in users {
        if let Some(profile) = state.db.get_profile_by_user(&candidate.id).await? {
            profiles.push(BrowseProfile {
                id: candidate.id,
                full_name: candidate.full_name,
                is_profile_approved: candidate.is_profile_approved,
                profile: ProfileSummary::from(&profile),
            });
        }
    }

    Ok(Json(ProfilesResponse {
        status: "success",
        results: profiles.len(),
        total,
        page,
        pages: (total + limit - 1) / limit,
        data: ProfilesData { profiles },
    }))
}

#[utoipa::path(get, path = "/api/profiles/me",
    responses((status = 200, body = UserEnvelope)), tag = "Profiles")]
pub async fn get_my_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let profile = state.db.get_profile_by_user(&user.id).await?;
    Ok(Json(UserEnvelope {
        status: "success",
        message: None,
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

#[utoipa::path(get, path = "/api/profiles/{id}",
    responses((status = 200, body = UserEnvelope),
              (status = 404, description = "Profile not found"),
              (status = 403, description = "Target profile pending approval")),
    tag = "Profiles")]
pub async fn get_profile_by_id(
    ApprovedUser(viewer): ApprovedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let target = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let profile = state
        .db
        .get_profile_by_user(&target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    if !viewer.is_admin() && !target.is_profile_approved {
        return Err(AppError::AuthorizationError(
            "This profile is pending approval".to_string(),
        ));
    }

    Ok(Json(UserEnvelope {
        status: "success",
        message: None,
        data: UserData {
            user: UserWithProfile::new(target, Some(profile)),
        },
    }))
}

async fn save_profile(
    state: &AppState,
    user: crate::models::user::User,
    req: UpsertProfileRequest,
) -> Result<Profile> {
    let existing = state.db.get_profile_by_user(&user.id).await?;
    let creating = existing.is_none();

    let mut profile = existing.unwrap_or_else(|| {
        Profile::with_defaults(
            user.id,
            user.full_name.as_deref().unwrap_or_default(),
            user.phone.as_deref().unwrap_or_default(),
            user.email.clone(),
        )
    });

    req.apply_to(&mut profile);

    // Identity fields always come from the account, not the payload.
    profile.user_id = user.id;
    if let Some(phone) = &user.phone {
        profile.phone = phone.clone();
    }
    profile.email = user.email.clone();
    if let Some(full_name) = &user.full_name {
        profile.full_name = full_name.clone();
    }

    profile.calculate_completeness();
    profile.updated_at = Utc::now();

    if creating {
        state.db.create_profile(&profile).await?;
        let mut user = user;
        user.profile_id = Some(profile.id);
        state.db.update_user(&user).await?;
    } else {
        state.db.update_profile(&profile).await?;
    }

    Ok(profile)
}

/// Create or update the caller's profile; completeness is recomputed on
/// every write.
#[utoipa::path(post, path = "/api/profiles", request_body = UpsertProfileRequest,
    responses((status = 200, body = ProfileResponse)), tag = "Profiles")]
pub async fn upsert_profile(
    PhoneVerifiedUser(user): PhoneVerifiedUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<impl IntoResponse> {
    let profile = save_profile(&state, user, req).await?;
    Ok(Json(ProfileResponse {
        status: "success",
        data: ProfileData { profile },
    }))
}

#[utoipa::path(put, path = "/api/profiles/me", request_body = UpsertProfileRequest,
    responses((status = 200, body = ProfileResponse)), tag = "Profiles")]
pub async fn upsert_profile_update(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<impl IntoResponse> {
    let profile = save_profile(&state, user, req).await?;
    Ok(Json(ProfileResponse {
        status: "success",
        data: ProfileData { profile },
    }))
}

// ---- admin handlers ----

#[utoipa::path(get, path = "/api/admin/dashboard",
    responses((status = 200, body = DashboardResponse)), tag = "Admin")]
pub async fn dashboard(
    AdminUser(_admin): AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let stats = DashboardStats {
        total_users: state.db.count_members().await?,
        pending_approvals: state.db.count_pending_approvals().await?,
        active_profiles: state.db.count_active_profiles().await?,
        blocked_users: state.db.count_blocked_users().await?,
    };
    Ok(Json(DashboardResponse {
        status: "success",
        data: DashboardData { stats },
    }))
}

#[utoipa::path(get, path = "/api/admin/profiles/pending",
    responses((status = 200, body = UsersResponse)), tag = "Admin")]
pub async fn pending_profiles(
    AdminUser(_admin): AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let users = state.db.get_pending_certificate_users().await?;
    let users = with_profiles(&state, users).await?;
    Ok(Json(UsersResponse {
        status: "success",
        results: users.len(),
        data: UsersData { users },
    }))
}

async fn with_profiles(
    state: &AppState,
    users: Vec<crate::models::user::User>,
) -> Result<Vec<UserWithProfile>> {
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        let profile = state.db.get_profile_by_user(&user.id).await?;
        out.push(UserWithProfile::new(user, profile));
    }
    Ok(out)
}

/// Mark the certificate verified and the profile approved. Idempotent:
/// approving an approved user changes nothing.
#[utoipa::path(put, path = "/api/admin/profiles/{id}/approve",
    responses((status = 200, body = UserEnvelope),
              (status = 404, description = "User not found"),
              (status = 400, description = "No certificate uploaded")),
    tag = "Admin")]
pub async fn approve_profile(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let mut user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let certificate = user
        .community_certificate
        .as_mut()
        .filter(|cert| !cert.url.is_empty())
        .ok_or_else(|| {
            AppError::ValidationError("No certificate found for this user".to_string())
        })?;

    certificate.verified = true;
    certificate.verified_by = Some(admin.id);
    user.is_profile_approved = true;
    state.db.update_user(&user).await?;

    if let (Some(email), Some(name)) = (&user.email, &user.full_name) {
        if let Err(e) = state.mailer.send_approval_email(email, name, true).await {
            error!(action = "approval_email_failed", email = %email, error = %e);
        }
    }

    info!(action = "profile_approved", user_id = %user.id, admin_id = %admin.id);
    let profile = state.db.get_profile_by_user(&user.id).await?;
    Ok(Json(UserEnvelope {
        status: "success",
        message: Some("Profile approved successfully".to_string()),
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

#[utoipa::path(put, path = "/api/admin/profiles/{id}/reject", request_body = RejectRequest,
    responses((status = 200, body = UserEnvelope),
              (status = 404, description = "User not found")),
    tag = "Admin")]
pub async fn reject_profile(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    req: Option<Json<RejectRequest>>,
) -> Result<impl IntoResponse> {
    let _reason = req.map(|Json(r)| r.reason).unwrap_or_default();

    let mut user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(certificate) = user.community_certificate.as_mut() {
        certificate.verified = false;
        certificate.verified_by = None;
    }
    user.is_profile_approved = false;
    state.db.update_user(&user).await?;

    if let (Some(email), Some(name)) = (&user.email, &user.full_name) {
        if let Err(e) = state.mailer.send_approval_email(email, name, false).await {
            error!(action = "rejection_email_failed", email = %email, error = %e);
        }
    }

    info!(action = "profile_rejected", user_id = %user.id, admin_id = %admin.id);
    let profile = state.db.get_profile_by_user(&user.id).await?;
    Ok(Json(UserEnvelope {
        status: "success",
        message: Some("Profile rejected successfully".to_string()),
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

#[utoipa::path(get, path = "/api/admin/users",
    responses((status = 200, body = UsersResponse)), tag = "Admin")]
pub async fn all_users(
    AdminUser(_admin): AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let users = state.db.get_all_users().await?;
    let users = with_profiles(&state, users).await?;
    Ok(Json(UsersResponse {
        status: "success",
        results: users.len(),
        data: UsersData { users },
    }))
}

/// Flip the blocked flag; a blocked account is also deactivated. Admins
/// cannot block themselves.
#[utoipa::path(put, path = "/api/admin/users/{id}/block",
    responses((status = 200, body = UserEnvelope),
              (status = 400, description = "Cannot block yourself"),
              (status = 404, description = "User not found")),
    tag = "Admin")]
pub async fn toggle_block_user(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let mut user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.id == admin.id {
        return Err(AppError::ValidationError(
            "You cannot block yourself".to_string(),
        ));
    }

    user.is_blocked = !user.is_blocked;
    user.is_active = !user.is_blocked;
    state.db.update_user(&user).await?;

    let message = if user.is_blocked {
        "User blocked successfully"
    } else {
        "User unblocked successfully"
    };
    info!(action = "user_block_toggled", user_id = %user.id, blocked = user.is_blocked);

    let profile = state.db.get_profile_by_user(&user.id).await?;
    Ok(Json(UserEnvelope {
        status: "success",
        message: Some(message.to_string()),
        data: UserData {
            user: UserWithProfile::new(user, profile),
        },
    }))
}

// ---- stub routers (declared surface, not yet implemented) ----

fn stub(message: &'static str) -> Json<serde_json::Value> {
    Json(json!({ "message": message }))
}

pub fn interest_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(|ApprovedUser(_): ApprovedUser| async { stub("Send interest endpoint") }),
        )
        .route(
            "/sent",
            get(|CurrentUser(_): CurrentUser| async { stub("Get sent interests endpoint") }),
        )
        .route(
            "/received",
            get(|CurrentUser(_): CurrentUser| async { stub("Get received interests endpoint") }),
        )
        .route(
            "/:id/accept",
            put(|CurrentUser(_): CurrentUser| async { stub("Accept interest endpoint") }),
        )
        .route(
            "/:id/reject",
            put(|CurrentUser(_): CurrentUser| async { stub("Reject interest endpoint") }),
        )
}

pub fn match_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(|ApprovedUser(_): ApprovedUser| async { stub("Get matches endpoint") }),
        )
        .route(
            "/suggestions",
            get(|ApprovedUser(_): ApprovedUser| async { stub("Get match suggestions endpoint") }),
        )
}

pub fn message_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(|ApprovedUser(_): ApprovedUser| async { stub("Send message endpoint") }),
        )
        .route(
            "/conversations",
            get(|CurrentUser(_): CurrentUser| async { stub("Get conversations endpoint") }),
        )
        .route(
            "/conversation/:user_id",
            get(|CurrentUser(_): CurrentUser| async { stub("Get conversation with user endpoint") }),
        )
}

pub fn upload_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/profile-photo",
            post(|CurrentUser(_): CurrentUser| async { stub("Upload profile photo endpoint") }),
        )
        .route(
            "/photos",
            post(|CurrentUser(_): CurrentUser| async { stub("Upload multiple photos endpoint") }),
        )
}

// ---- health ----

#[utoipa::path(get, path = "/api/health",
    responses((status = 200, description = "Liveness probe")), tag = "Health")]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "message": "Matrimony API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
