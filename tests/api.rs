use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use matrimony_backend::api::build_router;
use matrimony_backend::config::Config;
use matrimony_backend::database::sqlite::SqliteDatabase;
use matrimony_backend::models::user::{CommunityCertificate, Role};
use matrimony_backend::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: ":memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
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
        // generous limits so tests never trip the per-IP windows
        rate_limit_per_sec: 10_000,
        auth_rate_limit_max: 10_000,
        max_file_size: 52_428_800,
        environment: "development".to_string(),
    }
}

async fn setup() -> (Router, Arc<AppState>) {
    let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
    let state = AppState::with_database(test_config(), db);
    (build_router(state.clone()), state)
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Drive the backend-OTP path end to end and return the session token.
async fn register_and_verify(router: &Router, state: &AppState, phone: &str) -> (String, Value) {
    let (status, body) = call(
        router,
        "POST",
        "/api/auth/register",
        Some(json!({ "fullName": "Asha", "phone": phone, "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    let normalized = body["data"]["phone"].as_str().unwrap().to_string();

    let otp = state.pending.get(&normalized).unwrap().otp;
    let (status, body) = call(
        router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "phone": normalized, "otp": otp })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "verify failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    (token, body)
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let (router, _state) = setup().await;

    let (status, body) = call(&router, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["timestamp"].is_string());

    let (status, body) = call(&router, "GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn register_verify_login_flow() {
    let (router, state) = setup().await;

    let (token, body) = register_and_verify(&router, &state, "+919876543210").await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["user"]["isPhoneVerified"], true);
    assert_eq!(body["data"]["user"]["profile"]["city"], "Chennai");

    // session token works against /me
    let (status, body) = call(&router, "GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["phone"], "+919876543210");
    // sensitive fields never leave the server
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["user"].get("otp").is_none());

    // password login also opens a session
    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/login",
        Some(json!({ "phone": "+919876543210", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["loginCount"], 1);
}

#[tokio::test]
async fn wrong_and_unknown_otp_paths() {
    let (router, _state) = setup().await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/register",
        Some(json!({ "fullName": "Asha", "phone": "+919876543210", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "phone": "+919876543210", "otp": "000000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid OTP");

    // no pending entry and no persisted user
    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "phone": "+919999999999", "otp": "000000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "No pending registration found. Please register first."
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected_after_commit() {
    let (router, state) = setup().await;
    register_and_verify(&router, &state, "+919876543210").await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/register",
        Some(json!({ "fullName": "Asha", "phone": "+919876543210", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone number already registered");
}

#[tokio::test]
async fn browse_requires_an_approved_profile() {
    let (router, state) = setup().await;
    let (token, _) = register_and_verify(&router, &state, "+919876543210").await;

    let (status, body) = call(&router, "GET", "/api/profiles", None, Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Your profile is pending admin approval.");

    // admins bypass the approval gate regardless of their own approval state
    let mut user = state
        .db
        .get_user_by_phone("+919876543210")
        .await
        .unwrap()
        .unwrap();
    user.role = Role::Admin;
    state.db.update_user(&user).await.unwrap();

    let (status, body) = call(&router, "GET", "/api/profiles", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (router, _state) = setup().await;
    let (status, body) = call(&router, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, _) = call(&router, "GET", "/api/auth/me", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_moderation_flow() {
    let (router, state) = setup().await;

    // the member under review, with an uploaded certificate
    let (member_token, _) = register_and_verify(&router, &state, "+919876543210").await;
    let mut member = state
        .db
        .get_user_by_phone("+919876543210")
        .await
        .unwrap()
        .unwrap();
    member.community_certificate = Some(CommunityCertificate {
        filename: "cert.pdf".to_string(),
        url: "https://example.com/cert.pdf".to_string(),
        uploaded_at: chrono::Utc::now(),
        verified: false,
        verified_by: None,
    });
    state.db.update_user(&member).await.unwrap();

    // the admin
    let (admin_token, _) = register_and_verify(&router, &state, "+919876543211").await;
    let mut admin = state
        .db
        .get_user_by_phone("+919876543211")
        .await
        .unwrap()
        .unwrap();
    admin.role = Role::Admin;
    state.db.update_user(&admin).await.unwrap();

    // the member shows up in the pending queue
    let (status, body) = call(
        &router,
        "GET",
        "/api/admin/profiles/pending",
        None,
        Some(&admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 1);

    // non-admins are turned away
    let (status, _) = call(
        &router,
        "GET",
        "/api/admin/profiles/pending",
        None,
        Some(&member_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // approve, twice: idempotent
    let approve_uri = format!("/api/admin/profiles/{}/approve", member.id);
    for _ in 0..2 {
        let (status, body) = call(&router, "PUT", &approve_uri, None, Some(&admin_token)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["user"]["communityCertificate"]["verified"], true);
        assert_eq!(body["data"]["user"]["isProfileApproved"], true);
    }

    // dashboard reflects the state
    let (status, body) = call(&router, "GET", "/api/admin/dashboard", None, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stats"]["pendingApprovals"], 0);
    assert_eq!(body["data"]["stats"]["activeProfiles"], 1);

    // the approved member can browse now
    let (status, _) = call(&router, "GET", "/api/profiles", None, Some(&member_token)).await;
    assert_eq!(status, StatusCode::OK);

    // self-block is refused
    let self_block = format!("/api/admin/users/{}/block", admin.id);
    let (status, body) = call(&router, "PUT", &self_block, None, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot block yourself");

    // blocking the member locks them out even with a valid session
    let block_uri = format!("/api/admin/users/{}/block", member.id);
    let (status, body) = call(&router, "PUT", &block_uri, None, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User blocked successfully");

    let (status, _) = call(&router, "GET", "/api/auth/me", None, Some(&member_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // and login is refused with correct credentials
    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/login",
        Some(json!({ "phone": "+919876543210", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Your account has been deactivated or blocked");
}

#[tokio::test]
async fn firebase_path_and_profile_upsert() {
    let (router, state) = setup().await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/register-with-firebase",
        Some(json!({
            "phone": "+919876543210",
            "password": "secret1",
            "fullName": "Asha",
            "firebaseIdToken": "client-side-assertion"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["user"]["authProvider"], "phone");
    assert_eq!(body["data"]["user"]["isPhoneVerified"], true);
    let token = body["token"].as_str().unwrap().to_string();

    // a missing assertion token is a validation failure
    let (status, _) = call(
        &router,
        "POST",
        "/api/auth/register-with-firebase",
        Some(json!({
            "phone": "+919876543212",
            "password": "secret1",
            "fullName": "Asha",
            "firebaseIdToken": ""
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // filling in profile fields bumps completeness
    let before = state
        .db
        .get_profile_by_user(
            &state
                .db
                .get_user_by_phone("+919876543210")
                .await
                .unwrap()
                .unwrap()
                .id,
        )
        .await
        .unwrap()
        .unwrap()
        .profile_completeness;

    let (status, body) = call(
        &router,
        "POST",
        "/api/profiles",
        Some(json!({
            "religion": "Hindu",
            "caste": "Devendra Kula Vellalar",
            "motherTongue": "Tamil",
            "aboutMe": "Hello there",
            "fatherName": "Raman",
            "motherName": "Lakshmi"
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let after = body["data"]["profile"]["profileCompleteness"].as_i64().unwrap();
    assert!(after > before, "completeness should rise: {before} -> {after}");
}

#[tokio::test]
async fn stub_surfaces_acknowledge_behind_auth() {
    let (router, state) = setup().await;
    let (token, _) = register_and_verify(&router, &state, "+919876543210").await;

    // approval-gated stub rejects an unapproved member
    let (status, _) = call(
        &router,
        "GET",
        "/api/matches",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // plain-auth stub answers with its placeholder
    let (status, body) = call(&router, "GET", "/api/interests/sent", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Get sent interests endpoint");
}
