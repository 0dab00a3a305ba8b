// tests/integration/otp_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use clinic_backend::domain::otp_model::{self, OtpPurpose};
use clinic_backend::repository::otp_repository::OtpRepository;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde_json::{json, Value};

use crate::common::app_helper::{setup_app, TestApp};
use crate::common::auth_helper::{register_patient, unique_email};
use crate::common::request::send;

async fn verify_code(app: &TestApp, email: &str, purpose: &str, code: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        "POST",
        "/api/otp/verify",
        None,
        Some(json!({ "email": email, "purpose": purpose, "code": code })),
    )
    .await
}

/// 有効期限を過去にずらす
async fn expire(app: &TestApp, otp: &otp_model::Model) {
    let mut active = otp.clone().into_active_model();
    active.expires_at = Set(Utc::now() - Duration::minutes(1));
    active.update(&app.state.db).await.unwrap();
}

async fn reload(app: &TestApp, otp: &otp_model::Model) -> otp_model::Model {
    otp_model::Entity::find_by_id(otp.id)
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_send_registration_code() {
    let app = setup_app().await;
    let email = unique_email("otp");

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/otp/send",
        None,
        Some(json!({ "email": email, "purpose": "registration" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["expires_at"].is_string());
    assert!(body["data"]["expires_in_seconds"].as_i64().unwrap() > 0);

    // 再送間隔より早い再送は 429
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/otp/send",
        None,
        Some(json!({ "email": email, "purpose": "registration" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_registration_code_for_existing_account_conflicts() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/otp/send",
        None,
        Some(json!({ "email": patient.email, "purpose": "registration" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_password_reset_code_for_unknown_email_looks_successful() {
    let app = setup_app().await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/otp/send",
        None,
        Some(json!({ "email": unique_email("ghost"), "purpose": "password_reset" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_without_code_issued() {
    let app = setup_app().await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/otp/verify",
        None,
        Some(json!({ "email": unique_email("none"), "purpose": "registration", "code": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_codes_lock_the_otp() {
    let app = setup_app().await;
    let email = unique_email("lock");
    let issued = app
        .state
        .otp_service
        .issue(&email, OtpPurpose::Registration)
        .await
        .unwrap();
    let wrong = if issued.code == "000000" { "111111" } else { "000000" };

    for _ in 0..app.state.otp_service.config().max_attempts {
        let (status, _) = send(
            &app.router,
            "POST",
            "/api/otp/verify",
            None,
            Some(json!({ "email": email, "purpose": "registration", "code": wrong })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // 上限後は正しいコードでも拒否
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/otp/verify",
        None,
        Some(json!({ "email": email, "purpose": "registration", "code": issued.code })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_verify_normalizes_email() {
    let app = setup_app().await;
    let email = unique_email("case");
    let issued = app
        .state
        .otp_service
        .issue(&email, OtpPurpose::Registration)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/otp/verify",
        None,
        Some(json!({
            "email": email.to_uppercase(),
            "purpose": "registration",
            "code": issued.code,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["verified"], true);
    assert_eq!(body["data"]["purpose"], "registration");
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let app = setup_app().await;
    let email = unique_email("expired");
    let issued = app
        .state
        .otp_service
        .issue(&email, OtpPurpose::Registration)
        .await
        .unwrap();
    expire(&app, &issued.otp).await;

    let (status, body) = verify_code(&app, &email, "registration", &issued.code).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("expired"), "{}", body);
    assert!(reload(&app, &issued.otp).await.verified_at.is_none());
}

#[tokio::test]
async fn test_expired_reset_code_keeps_old_password() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let issued = app
        .state
        .otp_service
        .issue(&patient.email, OtpPurpose::PasswordReset)
        .await
        .unwrap();
    expire(&app, &issued.otp).await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "email": patient.email,
            "code": issued.code,
            "new_password": "Clinic#Late9753",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("expired"), "{}", body);
    assert!(reload(&app, &issued.otp).await.consumed_at.is_none());
}

#[tokio::test]
async fn test_reverify_keeps_first_verified_time() {
    let app = setup_app().await;
    let email = unique_email("again");
    let issued = app
        .state
        .otp_service
        .issue(&email, OtpPurpose::Registration)
        .await
        .unwrap();

    let (status, _) = verify_code(&app, &email, "registration", &issued.code).await;
    assert_eq!(status, StatusCode::OK);
    let first = reload(&app, &issued.otp).await;
    assert!(first.verified_at.is_some());
    assert_eq!(first.attempts, 0);

    let (status, _) = verify_code(&app, &email, "registration", &issued.code).await;
    assert_eq!(status, StatusCode::OK);
    let second = reload(&app, &issued.otp).await;
    assert_eq!(second.verified_at, first.verified_at);
    assert_eq!(second.attempts, 0);
}

#[tokio::test]
async fn test_parallel_wrong_codes_never_exceed_attempt_limit() {
    let app = setup_app().await;
    let email = unique_email("burst");
    let issued = app
        .state
        .otp_service
        .issue(&email, OtpPurpose::Registration)
        .await
        .unwrap();
    let wrong = if issued.code == "000000" { "111111" } else { "000000" };

    let (a, b, c, d, e) = tokio::join!(
        verify_code(&app, &email, "registration", wrong),
        verify_code(&app, &email, "registration", wrong),
        verify_code(&app, &email, "registration", wrong),
        verify_code(&app, &email, "registration", wrong),
        verify_code(&app, &email, "registration", wrong),
    );
    let statuses = [a.0, b.0, c.0, d.0, e.0];
    let max_attempts = app.state.otp_service.config().max_attempts;

    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::BAD_REQUEST)
        .count();
    let locked = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(rejected, max_attempts as usize);
    assert_eq!(locked, statuses.len() - max_attempts as usize);
    assert_eq!(reload(&app, &issued.otp).await.attempts, max_attempts);
}

#[tokio::test]
async fn test_attempt_reservation_stops_at_limit() {
    let app = setup_app().await;
    let issued = app
        .state
        .otp_service
        .issue(&unique_email("reserve"), OtpPurpose::PasswordReset)
        .await
        .unwrap();
    let repo = OtpRepository::new(app.state.db.clone());

    assert!(repo.reserve_attempt(issued.otp.id, 2).await.unwrap());
    assert!(repo.reserve_attempt(issued.otp.id, 2).await.unwrap());
    assert!(!repo.reserve_attempt(issued.otp.id, 2).await.unwrap());
    assert_eq!(reload(&app, &issued.otp).await.attempts, 2);
}
