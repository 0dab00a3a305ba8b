// tests/integration/access_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::common::app_helper::setup_app;
use crate::common::auth_helper::{
    create_admin, create_doctor, create_staff_account, register_patient, TEST_PASSWORD,
};
use crate::common::request::send;

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;

    let (status, _) = send(&app.router, "GET", "/api/users", patient.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app.router, "GET", "/api/users", staff.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/users?role=patient",
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], patient.id.to_string());
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_admin_creates_user_with_duplicate_email_conflict() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/users",
        admin.token(),
        Some(json!({
            "email": patient.email,
            "first_name": "Dup",
            "last_name": "User",
            "role": "staff",
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deactivated_user_cannot_sign_in_or_refresh() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/users/{}/status", patient.id),
        admin.token(),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": patient.email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

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
async fn test_invalid_path_uuid_is_bad_request() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;

    let (status, _) = send(
        &app.router,
        "GET",
        "/api/personnels/not-a-uuid",
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/personnels/{}", Uuid::new_v4()),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_personnel_access() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;
    let doctor_id = create_doctor(&app, &admin).await;

    let (status, _) = send(&app.router, "GET", "/api/personnels", patient.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/personnels?position=doctor",
        staff.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], doctor_id.to_string());
    assert_eq!(body["data"][0]["full_name"], "Yuki Tanaka");

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/personnels",
        staff.token(),
        Some(json!({ "first_name": "A", "last_name": "B", "position": "nurse" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/personnels/{}", doctor_id),
        admin.token(),
        Some(json!({ "specialization": "Pediatrics" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["specialization"], "Pediatrics");
}

#[tokio::test]
async fn test_blocked_slot_management() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;
    let date = (Utc::now().date_naive() + Duration::days(20)).to_string();
    let body = json!({
        "start_date": date,
        "end_date": date,
        "start_time": "09:00",
        "end_time": "11:00",
        "reason": "Training",
    });

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        staff.token(),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 終了が開始より前
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        admin.token(),
        Some(json!({
            "start_date": date,
            "end_date": date,
            "start_time": "11:00",
            "end_time": "09:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        admin.token(),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["created_by"], admin.id.to_string());

    // 一覧は認証済みなら誰でも見られる
    let (status, list) = send(
        &app.router,
        "GET",
        "/api/blockedTimeSlots",
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/blockedTimeSlots/{}", created["data"]["id"].as_str().unwrap());
    let (status, updated) = send(
        &app.router,
        "PATCH",
        &uri,
        admin.token(),
        Some(json!({ "end_time": "12:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["end_time"], "12:00");

    let (status, _) = send(&app.router, "DELETE", &uri, admin.token(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_medical_record_access() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let doctor_account = create_staff_account(&app, &admin, "doctor").await;
    let doctor_id = create_doctor(&app, &admin).await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;
    let today = Utc::now().date_naive().to_string();

    let (status, created) = send(
        &app.router,
        "POST",
        "/api/medicalRecords",
        doctor_account.token(),
        Some(json!({
            "patient_id": patient.id,
            "doctor_id": doctor_id,
            "record_date": today,
            "chief_complaint": "Headache",
            "diagnosis": "Tension headache",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let uri = format!("/api/medicalRecords/{}", created["data"]["id"].as_str().unwrap());

    let (status, body) = send(&app.router, "GET", &uri, patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["diagnosis"], "Tension headache");

    let (status, _) = send(&app.router, "GET", &uri, other.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app.router, "GET", "/api/medicalRecords", other.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/medicalRecords",
        patient.token(),
        Some(json!({ "patient_id": patient.id, "record_date": today })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        "PATCH",
        &uri,
        patient.token(),
        Some(json!({ "notes": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &uri,
        doctor_account.token(),
        Some(json!({ "treatment": "Rest and fluids" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["treatment"], "Rest and fluids");
    assert_eq!(body["data"]["diagnosis"], "Tension headache");
}
