// tests/integration/auth_tests.rs

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::common::app_helper::setup_app;
use crate::common::auth_helper::{
    create_admin, register_patient, signin, signup_body, unique_email, verify_registration_email,
    TEST_PASSWORD,
};
use crate::common::request::{json_request, read_json, send};

#[tokio::test]
async fn test_signup_requires_verified_email() {
    let app = setup_app().await;
    let email = unique_email("unverified");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/signup",
        None,
        Some(signup_body(&email)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_signup_creates_patient_and_consumes_otp() {
    let app = setup_app().await;
    let email = unique_email("patient");
    verify_registration_email(&app, &email).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/signup",
        None,
        Some(signup_body(&email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["account"]["role"], "patient");
    assert_eq!(body["data"]["account"]["email"], email.as_str());
    assert!(body["data"]["tokens"]["access_token"].is_string());

    // 同じメールでの再登録は 409
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/signup",
        None,
        Some(signup_body(&email)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_sets_auth_cookies() {
    let app = setup_app().await;
    let email = unique_email("cookie");
    verify_registration_email(&app, &email).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(&signup_body(&email)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("access_token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    assert!(cookies.iter().all(|c| c.contains("SameSite=Strict")));
}

#[tokio::test]
async fn test_signin_with_wrong_password_is_unauthorized() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": patient.email, "password": "Wrong#Password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_signin_normalizes_email() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let account = signin(&app, &patient.email.to_uppercase(), TEST_PASSWORD).await;
    assert_eq!(account.id, patient.id);
}

#[tokio::test]
async fn test_me_returns_current_account() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (status, body) = send(&app.router, "GET", "/api/auth/me", patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account_id"], patient.id.to_string());
    assert_eq!(body["data"]["account_kind"], "user");
    assert_eq!(body["data"]["email_verified"], true);

    let (status, body) = send(&app.router, "GET", "/api/auth/me", admin.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account_kind"], "admin");
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = setup_app().await;

    let (status, _) = send(&app.router, "GET", "/api/appointments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        "GET",
        "/api/appointments",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_cookie_is_accepted() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let mut request = json_request("GET", "/api/auth/me", None, None);
    request.headers_mut().insert(
        header::COOKIE,
        format!("access_token={}", patient.access_token).parse().unwrap(),
    );

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_reuse() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": patient.refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["tokens"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated, patient.refresh_token);

    // 使用済みトークンは拒否される
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": patient.refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 新しいトークンは使える
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": rotated })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_from_cookie() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let mut request = json_request("POST", "/api/auth/refresh", None, None);
    request.headers_mut().insert(
        header::COOKIE,
        format!("refresh_token={}", patient.refresh_token)
            .parse()
            .unwrap(),
    );

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["tokens"]["access_token"].is_string());
}

#[tokio::test]
async fn test_refresh_without_token_is_unauthorized() {
    let app = setup_app().await;

    let (status, _) = send(&app.router, "POST", "/api/auth/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signout_revokes_refresh_token_and_clears_cookies() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signout",
            None,
            Some(&json!({ "refresh_token": patient.refresh_token })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert!(cleared.iter().any(|c| c.starts_with("access_token=;")));
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": patient.refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_revokes_sessions() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let new_password = "Clinic#Visit9753";

    let (status, _) = send(
        &app.router,
        "PUT",
        "/api/auth/change-password",
        patient.token(),
        Some(json!({
            "current_password": TEST_PASSWORD,
            "new_password": new_password,
            "new_password_confirmation": new_password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": patient.refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let account = signin(&app, &patient.email, new_password).await;
    assert_eq!(account.id, patient.id);
}

#[tokio::test]
async fn test_reset_password_with_otp() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let new_password = "Clinic#Reset8642";

    let issued = app
        .state
        .otp_service
        .issue(
            &patient.email,
            clinic_backend::domain::otp_model::OtpPurpose::PasswordReset,
        )
        .await
        .unwrap();

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": patient.email,
            "code": issued.code,
            "new_password": new_password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 同じコードは二度使えない
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": patient.email,
            "code": issued.code,
            "new_password": "Clinic#Again1357",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    signin(&app, &patient.email, new_password).await;
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = setup_app().await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": unique_email("nobody") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["message"].is_string());
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_app().await;

    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}
