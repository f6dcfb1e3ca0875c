use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::errors::Result;
use crate::state::AppState;
use crate::utils::middleware::{auth_rate_limit, global_rate_limit};

pub mod extract;
pub mod routes;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::register,
        routes::verify_otp,
        routes::register_with_firebase,
        routes::resend_otp,
        routes::login,
        routes::logout,
        routes::me,
        routes::update_password,
        routes::upload_certificate,
        routes::onboarding,
        routes::google_auth,
        routes::google_callback,
        routes::get_profiles,
        routes::get_my_profile,
        routes::get_profile_by_id,
        routes::upsert_profile,
        routes::upsert_profile_update,
        routes::dashboard,
        routes::pending_profiles,
        routes::approve_profile,
        routes::reject_profile,
        routes::all_users,
        routes::toggle_block_user,
        routes::health,
    ),
    components(
        schemas(
            types::RegisterRequest,
            types::VerifyOtpRequest,
            types::FirebaseRegisterRequest,
            types::ResendOtpRequest,
            types::LoginRequest,
            types::UpdatePasswordRequest,
            types::RejectRequest,
            types::UpsertProfileRequest,
            types::ApiMessage,
            types::RegisterData,
            types::RegisterResponse,
            types::UserWithProfile,
            types::AuthData,
            types::AuthResponse,
            types::UserData,
            types::UserEnvelope,
            types::CertificateData,
            types::CertificateResponse,
            types::BrowseProfile,
            types::ProfileSummary,
            types::ProfilesData,
            types::ProfilesResponse,
            types::ProfileData,
            types::ProfileResponse,
            types::DashboardStats,
            types::DashboardData,
            types::DashboardResponse,
            types::UsersData,
            types::UsersResponse,
            crate::models::user::User,
            crate::models::user::UserResponse,
            crate::models::user::AuthProvider,
            crate::models::user::Role,
            crate::models::user::CommunityCertificate,
            crate::models::profile::Profile,
            crate::models::profile::Photo,
            crate::models::profile::PartnerPreferences,
            crate::models::profile::PrivacySettings,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, phone verification and session endpoints"),
        (name = "Profiles", description = "Profile browsing and management. Requires a session; browsing requires an approved profile."),
        (name = "Admin", description = "Moderation endpoints, admin role only"),
        (name = "Health", description = "Liveness probe")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
        openapi.security = Some(vec![utoipa::openapi::security::SecurityRequirement::new(
            "bearerAuth",
            Vec::<String>::new(),
        )]);
    }
}

/// Tags every request with a UUID carried in the tracing span.
pub async fn request_id_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!("request", request_id = %request_id, method = %req.method(), uri = %req.uri());
    let _enter = span.enter();
    next.run(req).await
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .frontend_url
                .parse::<HeaderValue>()
                .expect("FRONTEND_URL must be a valid origin"),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let auth = routes::auth_router().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth_rate_limit,
    ));

    Router::new()
        .nest("/api/auth", auth)
        .nest("/api/profiles", routes::profile_router())
        .nest("/api/admin", routes::admin_router())
        .nest("/api/interests", routes::interest_router())
        .nest("/api/matches", routes::match_router())
        .nest("/api/messages", routes::message_router())
        .nest("/api/upload", routes::upload_router())
        .route("/api/health", axum::routing::get(routes::health))
        .route("/api/openapi.json", axum::routing::get(openapi_json))
        .merge(SwaggerUi::new("/api/docs").url("/api/api-docs.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_file_size))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_http_server(state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", state.config.port)
        .parse()
        .expect("invalid listen address");

    let app = build_router(state);

    info!(action = "server_listening", addr = %addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| crate::errors::AppError::InternalError(format!("Failed to bind: {}", e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| crate::errors::AppError::InternalError(format!("Server error: {}", e)))?;

    Ok(())
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "status": "error",
            "message": "Route not found",
        })),
    )
}

async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or_default())
}
