// tests/integration/appointment_tests.rs

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::app_helper::{setup_app, TestApp};
use crate::common::auth_helper::{
    create_admin, create_doctor, create_staff_account, register_patient, TestAccount,
};
use crate::common::request::send;

fn future_date(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

async fn book(
    app: &TestApp,
    account: &TestAccount,
    body: Value,
) -> (StatusCode, Value) {
    send(&app.router, "POST", "/api/appointments", account.token(), Some(body)).await
}

async fn book_ok(app: &TestApp, account: &TestAccount, body: Value) -> Value {
    let (status, response) = book(app, account, body).await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {}", response);
    response["data"].clone()
}

async fn set_status(
    app: &TestApp,
    account: &TestAccount,
    appointment_id: &str,
    status: &str,
) -> (StatusCode, Value) {
    send(
        &app.router,
        "PATCH",
        &format!("/api/appointments/{}/status", appointment_id),
        account.token(),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn test_patient_books_own_appointment_as_pending() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let data = book_ok(
        &app,
        &patient,
        json!({
            "appointment_date": future_date(3),
            "appointment_time": "10:30",
            "reason": "Check-up",
        }),
    )
    .await;

    assert_eq!(data["patient_id"], patient.id.to_string());
    assert_eq!(data["status"], "pending");
    assert_eq!(data["appointment_time"], "10:30");
}

#[tokio::test]
async fn test_patient_cannot_book_for_someone_else() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;

    let (status, _) = book(
        &app,
        &patient,
        json!({
            "patient_id": other.id,
            "appointment_date": future_date(3),
            "appointment_time": "10:30",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_appointment_numbers_are_sequential() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let first = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(4), "appointment_time": "09:00" }),
    )
    .await;
    let second = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(4), "appointment_time": "09:30" }),
    )
    .await;

    let first_number = first["appointment_number"].as_i64().unwrap();
    let second_number = second["appointment_number"].as_i64().unwrap();
    assert!(first_number >= 1);
    assert_eq!(second_number, first_number + 1);
}

#[tokio::test]
async fn test_invalid_time_is_rejected() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let (status, _) = book(
        &app,
        &patient,
        json!({ "appointment_date": future_date(3), "appointment_time": "25:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_booking_requires_patient_id() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;

    let (status, _) = book(
        &app,
        &staff,
        json!({ "appointment_date": future_date(3), "appointment_time": "11:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 患者以外のユーザーは予約対象にできない
    let (status, _) = book(
        &app,
        &staff,
        json!({
            "patient_id": staff.id,
            "appointment_date": future_date(3),
            "appointment_time": "11:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_inside_blocked_slot_is_rejected_with_reason() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let date = future_date(5);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        admin.token(),
        Some(json!({
            "start_date": date,
            "end_date": date,
            "start_time": "12:00",
            "end_time": "13:00",
            "reason": "Staff meeting",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // 境界を含む
    for time in ["12:00", "12:30", "13:00"] {
        let (status, body) = book(
            &app,
            &patient,
            json!({ "appointment_date": date, "appointment_time": time }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "time {}", time);
        assert!(body["message"].as_str().unwrap().contains("Staff meeting"));
    }

    book_ok(
        &app,
        &patient,
        json!({ "appointment_date": date, "appointment_time": "13:30" }),
    )
    .await;
}

#[tokio::test]
async fn test_double_booking_same_doctor_is_rejected() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let doctor_id = create_doctor(&app, &admin).await;
    let first_patient = register_patient(&app).await;
    let second_patient = register_patient(&app).await;
    let date = future_date(6);

    let first = book_ok(
        &app,
        &first_patient,
        json!({ "doctor_id": doctor_id, "appointment_date": date, "appointment_time": "14:00" }),
    )
    .await;

    let (status, _) = book(
        &app,
        &second_patient,
        json!({ "doctor_id": doctor_id, "appointment_date": date, "appointment_time": "14:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // 別の医師なら同時刻でも予約できる
    let other_doctor = create_doctor(&app, &admin).await;
    book_ok(
        &app,
        &second_patient,
        json!({ "doctor_id": other_doctor, "appointment_date": date, "appointment_time": "14:00" }),
    )
    .await;

    // 取り消された予約は枠を空ける
    let first_id = first["id"].as_str().unwrap();
    let (status, _) = set_status(&app, &first_patient, first_id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    book_ok(
        &app,
        &second_patient,
        json!({ "doctor_id": doctor_id, "appointment_date": date, "appointment_time": "14:00" }),
    )
    .await;
}

#[tokio::test]
async fn test_booking_with_unknown_doctor_is_rejected() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;

    let (status, _) = book(
        &app,
        &patient,
        json!({
            "doctor_id": Uuid::new_v4(),
            "appointment_date": future_date(3),
            "appointment_time": "10:00",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_transitions() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;

    let appointment = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(7), "appointment_time": "15:00" }),
    )
    .await;
    let id = appointment["id"].as_str().unwrap();

    let (status, _) = set_status(&app, &staff, id, "completed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = set_status(&app, &staff, id, "scheduled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "scheduled");

    // 同じステータスへの変更は成功扱い
    let (status, _) = set_status(&app, &staff, id, "scheduled").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = set_status(&app, &staff, id, "rebooked").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_status(&app, &staff, id, "scheduled").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = set_status(&app, &staff, id, "completed").await;
    assert_eq!(status, StatusCode::OK);

    // 完了は終端
    let (status, _) = set_status(&app, &staff, id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/appointments/{}", id),
        staff.token(),
        Some(json!({ "notes": "late change" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patient_can_only_cancel_own_appointment() {
    let app = setup_app().await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;

    let appointment = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(8), "appointment_time": "16:00" }),
    )
    .await;
    let id = appointment["id"].as_str().unwrap();

    let (status, _) = set_status(&app, &patient, id, "scheduled").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = set_status(&app, &other, id, "cancelled").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/appointments/{}", id),
        other.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = set_status(&app, &patient, id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_patient_list_is_scoped() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;

    book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(9), "appointment_time": "09:00" }),
    )
    .await;
    book_ok(
        &app,
        &other,
        json!({ "appointment_date": future_date(9), "appointment_time": "09:30" }),
    )
    .await;

    let (status, body) = send(&app.router, "GET", "/api/appointments", patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["patient_id"], patient.id.to_string());

    let (status, body) = send(&app.router, "GET", "/api/appointments", admin.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["pagination"]["total_count"], 2);
}

#[tokio::test]
async fn test_patient_cannot_update_or_delete() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let appointment = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": future_date(10), "appointment_time": "10:00" }),
    )
    .await;
    let uri = format!("/api/appointments/{}", appointment["id"].as_str().unwrap());

    let (status, _) = send(
        &app.router,
        "PATCH",
        &uri,
        patient.token(),
        Some(json!({ "appointment_time": "11:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "DELETE", &uri, patient.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "DELETE", &uri, admin.token(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, "GET", &uri, admin.token(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_checks_blocked_slots() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let date = future_date(11);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        admin.token(),
        Some(json!({
            "start_date": date,
            "end_date": date,
            "start_time": "09:00",
            "end_time": "10:00",
            "reason": "Equipment maintenance",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let appointment = book_ok(
        &app,
        &patient,
        json!({ "appointment_date": date, "appointment_time": "15:00" }),
    )
    .await;

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/appointments/{}", appointment["id"].as_str().unwrap()),
        admin.token(),
        Some(json!({ "appointment_time": "09:30" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Equipment maintenance"));
}

#[tokio::test]
async fn test_availability_marks_blocked_and_booked_slots() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let doctor_id = create_doctor(&app, &admin).await;
    let patient = register_patient(&app).await;
    let date = future_date(12);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/blockedTimeSlots",
        admin.token(),
        Some(json!({
            "start_date": date,
            "end_date": date,
            "start_time": "12:00",
            "end_time": "12:30",
            "reason": "Lunch",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    book_ok(
        &app,
        &patient,
        json!({ "doctor_id": doctor_id, "appointment_date": date, "appointment_time": "10:00" }),
    )
    .await;

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/appointments/availability?date={}&doctor_id={}", date, doctor_id),
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let slots = body["data"]["slots"].as_array().unwrap();
    let slot = |time: &str| {
        slots
            .iter()
            .find(|s| s["time"] == time)
            .cloned()
            .unwrap()
    };

    assert_eq!(slots.first().unwrap()["time"], "09:00");
    assert_eq!(slots.last().unwrap()["time"], "16:30");
    assert_eq!(slot("09:30")["available"], true);
    assert_eq!(slot("10:00")["available"], false);
    assert_eq!(slot("12:00")["available"], false);
    assert_eq!(slot("12:00")["reason"], "Lunch");
    assert_eq!(slot("12:30")["reason"], "Lunch");
    assert_eq!(slot("13:00")["available"], true);
}
