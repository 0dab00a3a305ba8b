// tests/integration/notification_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::app_helper::setup_app;
use crate::common::auth_helper::{create_admin, register_patient};
use crate::common::request::send;

#[tokio::test]
async fn test_appointment_events_notify_patient() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;
    let date = (Utc::now().date_naive() + Duration::days(2)).to_string();

    let (status, created) = send(
        &app.router,
        "POST",
        "/api/appointments",
        patient.token(),
        Some(json!({ "appointment_date": date, "appointment_time": "10:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/appointments/{}/status", created["data"]["id"].as_str().unwrap()),
        admin.token(),
        Some(json!({ "status": "scheduled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/notifications/unread-count",
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread_count"], 2);

    // 他の患者には届かない
    let (_, body) = send(
        &app.router,
        "GET",
        "/api/notifications/unread-count",
        other.token(),
        None,
    )
    .await;
    assert_eq!(body["data"]["unread_count"], 0);

    let (status, list) = send(&app.router, "GET", "/api/notifications", patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = list["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n["category"] == "appointment"));
}

#[tokio::test]
async fn test_mark_read_and_delete_own_notifications() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;
    let date = (Utc::now().date_naive() + Duration::days(2)).to_string();

    for time in ["09:00", "09:30"] {
        let (status, _) = send(
            &app.router,
            "POST",
            "/api/appointments",
            patient.token(),
            Some(json!({ "appointment_date": date, "appointment_time": time })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, list) = send(&app.router, "GET", "/api/notifications", patient.token(), None).await;
    let first_id = list["data"][0]["id"].as_str().unwrap().to_string();

    // 他人の通知は見えない
    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/notifications/{}/read", first_id),
        other.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/notifications/{}/read", first_id),
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);
    assert!(body["data"]["read_at"].is_string());

    let (_, unread) = send(
        &app.router,
        "GET",
        "/api/notifications?unread_only=true",
        patient.token(),
        None,
    )
    .await;
    assert_eq!(unread["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app.router,
        "PATCH",
        "/api/notifications/read-all",
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated_count"], 1);

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/notifications/{}", first_id),
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = send(&app.router, "GET", "/api/notifications", patient.token(), None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}
