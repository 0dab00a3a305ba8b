// tests/integration/report_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::app_helper::setup_app;
use crate::common::auth_helper::{create_admin, create_staff_account, register_patient};
use crate::common::fixture_helper::create_inventory_item;
use crate::common::request::send;

#[tokio::test]
async fn test_report_summary() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;
    let today = Utc::now().date_naive();
    let item = create_inventory_item(&app, &admin, "Cough syrup", 10, 700).await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/appointments",
        patient.token(),
        Some(json!({ "appointment_date": today.to_string(), "appointment_time": "16:30" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, paid) = send(
        &app.router,
        "POST",
        "/api/billings",
        staff.token(),
        Some(json!({
            "patient_id": patient.id,
            "doctor_fee": 2000,
            "items": [{ "inventory_item_id": item["id"], "quantity": 2 }],
        })),
    )
    .await;
    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}/payment", paid["data"]["id"].as_str().unwrap()),
        staff.token(),
        Some(json!({ "payment_status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/billings",
        staff.token(),
        Some(json!({ "patient_id": patient.id, "doctor_fee": 1500, "discount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/reports/summary?from={}&to={}", today, today),
        staff.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let data = &body["data"];
    assert_eq!(data["appointments"]["total"], 1);
    assert_eq!(data["appointments"]["by_status"]["pending"], 1);
    assert_eq!(data["appointments"]["by_status"]["completed"], 0);
    assert_eq!(data["billing"]["billing_count"], 2);
    assert_eq!(data["billing"]["paid_count"], 1);
    assert_eq!(data["billing"]["total_billed"], 3400 + 1000);
    assert_eq!(data["billing"]["revenue"], 3400);
    assert_eq!(data["billing"]["outstanding"], 1000);
    assert_eq!(data["inventory_usage"][0]["item_name"], "Cough syrup");
    assert_eq!(data["inventory_usage"][0]["quantity"], 2);
    assert_eq!(data["inventory_usage"][0]["amount"], 1400);
}

#[tokio::test]
async fn test_report_rejects_inverted_range_and_patients() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/reports/summary?from={}&to={}", today, yesterday),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/reports/summary?from={}&to={}", yesterday, today),
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_by_role() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;
    let tomorrow = (Utc::now().date_naive() + Duration::days(1)).to_string();

    for (account, time) in [(&patient, "10:00"), (&other, "11:00")] {
        let (status, _) = send(
            &app.router,
            "POST",
            "/api/appointments",
            account.token(),
            Some(json!({ "appointment_date": tomorrow, "appointment_time": time })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    create_inventory_item(&app, &admin, "Bandage roll", 1, 100).await;

    let (status, body) = send(&app.router, "GET", "/api/dashboard", patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("clinic").is_none());
    assert_eq!(body["data"]["unread_notifications"], 1);
    let upcoming = body["data"]["upcoming_appointments"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["patient_id"], patient.id.to_string());

    let (status, body) = send(&app.router, "GET", "/api/dashboard", admin.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    let clinic = &body["data"]["clinic"];
    assert_eq!(clinic["total_patients"], 2);
    assert_eq!(clinic["pending_appointments"], 2);
    assert_eq!(clinic["low_stock_items"], 1);
    assert_eq!(
        body["data"]["upcoming_appointments"].as_array().unwrap().len(),
        2
    );
}
