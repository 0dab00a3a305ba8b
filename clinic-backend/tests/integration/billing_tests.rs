// tests/integration/billing_tests.rs

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::app_helper::{setup_app, TestApp};
use crate::common::auth_helper::{
    create_admin, create_staff_account, register_patient, TestAccount,
};
use crate::common::fixture_helper::{create_inventory_item, stock_of};
use crate::common::request::send;

async fn create_billing(app: &TestApp, staff: &TestAccount, body: Value) -> (StatusCode, Value) {
    send(&app.router, "POST", "/api/billings", staff.token(), Some(body)).await
}

#[tokio::test]
async fn test_billing_totals_and_stock_deduction() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;
    let item = create_inventory_item(&app, &admin, "Amoxicillin", 10, 1200).await;
    let item_id = item["id"].as_str().unwrap();

    let (status, body) = create_billing(
        &app,
        &staff,
        json!({
            "patient_id": patient.id,
            "doctor_fee": 3000,
            "discount": 600,
            "items": [{ "inventory_item_id": item_id, "quantity": 3 }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let data = &body["data"];
    assert_eq!(data["subtotal"], 3600);
    assert_eq!(data["total_amount"], 6000);
    assert_eq!(data["payment_status"], "unpaid");
    assert_eq!(data["items"][0]["item_name"], "Amoxicillin");
    assert_eq!(data["items"][0]["unit_price"], 1200);
    assert_eq!(data["items"][0]["line_total"], 3600);

    assert_eq!(stock_of(&app, &staff, item_id).await, 7);
}

#[tokio::test]
async fn test_billing_numbers_are_sequential() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (_, first) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": patient.id, "doctor_fee": 1000 }),
    )
    .await;
    let (_, second) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": patient.id, "doctor_fee": 1000 }),
    )
    .await;

    let first_number = first["data"]["billing_number"].as_i64().unwrap();
    let second_number = second["data"]["billing_number"].as_i64().unwrap();
    assert_eq!(second_number, first_number + 1);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_billing() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let plenty = create_inventory_item(&app, &admin, "Gauze", 50, 100).await;
    let scarce = create_inventory_item(&app, &admin, "Insulin", 2, 4500).await;
    let plenty_id = plenty["id"].as_str().unwrap();
    let scarce_id = scarce["id"].as_str().unwrap();

    let (status, body) = create_billing(
        &app,
        &admin,
        json!({
            "patient_id": patient.id,
            "items": [
                { "inventory_item_id": plenty_id, "quantity": 5 },
                { "inventory_item_id": scarce_id, "quantity": 3 },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient stock for Insulin"));

    // どちらの品目も減っていない
    assert_eq!(stock_of(&app, &admin, plenty_id).await, 50);
    assert_eq!(stock_of(&app, &admin, scarce_id).await, 2);

    let (_, list) = send(&app.router, "GET", "/api/billings", admin.token(), None).await;
    assert_eq!(list["meta"]["pagination"]["total_count"], 0);
}

#[tokio::test]
async fn test_duplicate_lines_are_checked_together() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let item = create_inventory_item(&app, &admin, "Saline", 4, 300).await;
    let item_id = item["id"].as_str().unwrap();

    let (status, _) = create_billing(
        &app,
        &admin,
        json!({
            "patient_id": patient.id,
            "items": [
                { "inventory_item_id": item_id, "quantity": 3 },
                { "inventory_item_id": item_id, "quantity": 2 },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stock_of(&app, &admin, item_id).await, 4);
}

#[tokio::test]
async fn test_oversized_duplicate_lines_are_rejected() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let item = create_inventory_item(&app, &admin, "Syringe", 10, 50).await;
    let item_id = item["id"].as_str().unwrap();

    let (status, _) = create_billing(
        &app,
        &admin,
        json!({
            "patient_id": patient.id,
            "items": [
                { "inventory_item_id": item_id, "quantity": i32::MAX },
                { "inventory_item_id": item_id, "quantity": i32::MAX },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stock_of(&app, &admin, item_id).await, 10);

    let (_, list) = send(&app.router, "GET", "/api/billings", admin.token(), None).await;
    assert_eq!(list["meta"]["pagination"]["total_count"], 0);
}

#[tokio::test]
async fn test_discount_larger_than_total_is_rejected() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (status, _) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": patient.id, "doctor_fee": 1000, "discount": 1500 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_items_reconciles_stock() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let first = create_inventory_item(&app, &admin, "Ibuprofen", 10, 500).await;
    let second = create_inventory_item(&app, &admin, "Bandage", 10, 200).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let (_, created) = create_billing(
        &app,
        &admin,
        json!({
            "patient_id": patient.id,
            "items": [{ "inventory_item_id": first_id, "quantity": 3 }],
        }),
    )
    .await;
    let billing_id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(stock_of(&app, &admin, first_id).await, 7);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}", billing_id),
        admin.token(),
        Some(json!({
            "items": [
                { "inventory_item_id": first_id, "quantity": 1 },
                { "inventory_item_id": second_id, "quantity": 4 },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["subtotal"], 500 + 800);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    assert_eq!(stock_of(&app, &admin, first_id).await, 9);
    assert_eq!(stock_of(&app, &admin, second_id).await, 6);

    // 足りない変更は全体が取り消される
    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}", billing_id),
        admin.token(),
        Some(json!({
            "items": [
                { "inventory_item_id": first_id, "quantity": 1 },
                { "inventory_item_id": second_id, "quantity": 11 },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stock_of(&app, &admin, first_id).await, 9);
    assert_eq!(stock_of(&app, &admin, second_id).await, 6);
}

#[tokio::test]
async fn test_delete_restores_stock() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let item = create_inventory_item(&app, &admin, "Vitamin C", 10, 150).await;
    let item_id = item["id"].as_str().unwrap();

    let (_, created) = create_billing(
        &app,
        &admin,
        json!({
            "patient_id": patient.id,
            "items": [{ "inventory_item_id": item_id, "quantity": 3 }],
        }),
    )
    .await;
    let uri = format!("/api/billings/{}", created["data"]["id"].as_str().unwrap());
    assert_eq!(stock_of(&app, &admin, item_id).await, 7);

    let (status, _) = send(&app.router, "DELETE", &uri, admin.token(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stock_of(&app, &admin, item_id).await, 10);

    let (status, _) = send(&app.router, "GET", &uri, admin.token(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 台帳: 初期入庫・出庫・戻し
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/inventoryItems/{}/transactions", item_id),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut quantities: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["quantity"].as_i64().unwrap())
        .collect();
    quantities.sort_unstable();
    assert_eq!(quantities, vec![-3, 3, 10]);
}

#[tokio::test]
async fn test_paid_billing_cannot_be_modified() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;

    let (_, created) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": patient.id, "doctor_fee": 2000 }),
    )
    .await;
    let billing_id = created["data"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}/payment", billing_id),
        admin.token(),
        Some(json!({ "payment_status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "paid");
    assert!(body["data"]["paid_at"].is_string());

    let (status, _) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}", billing_id),
        admin.token(),
        Some(json!({ "doctor_fee": 2500 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 未払いに戻すと paid_at は消える
    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/billings/{}/payment", billing_id),
        admin.token(),
        Some(json!({ "payment_status": "unpaid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["paid_at"].is_null());
}

#[tokio::test]
async fn test_patient_sees_only_own_billings() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let other = register_patient(&app).await;

    let (_, own) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": patient.id, "doctor_fee": 1000 }),
    )
    .await;
    let (_, foreign) = create_billing(
        &app,
        &admin,
        json!({ "patient_id": other.id, "doctor_fee": 1000 }),
    )
    .await;

    let (status, body) = send(&app.router, "GET", "/api/billings", patient.token(), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], own["data"]["id"]);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/billings/{}", foreign["data"]["id"].as_str().unwrap()),
        patient.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = create_billing(
        &app,
        &patient,
        json!({ "patient_id": patient.id, "doctor_fee": 1000 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
