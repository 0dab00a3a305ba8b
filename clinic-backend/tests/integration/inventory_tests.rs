// tests/integration/inventory_tests.rs

use axum::http::StatusCode;
use serde_json::json;

use crate::common::app_helper::setup_app;
use crate::common::auth_helper::{create_admin, create_staff_account, register_patient};
use crate::common::fixture_helper::{create_inventory_item, stock_of};
use crate::common::request::send;

#[tokio::test]
async fn test_create_item_records_initial_stock() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;

    let item = create_inventory_item(&app, &admin, "Paracetamol", 20, 800).await;
    assert_eq!(item["quantity"], 20);
    assert_eq!(item["is_low_stock"], false);

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/inventoryItems/{}/transactions", item["id"].as_str().unwrap()),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["data"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["transaction_type"], "stock_in");
    assert_eq!(transactions[0]["quantity"], 20);
}

#[tokio::test]
async fn test_adjust_stock() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let item = create_inventory_item(&app, &admin, "Syringe", 10, 50).await;
    let item_id = item["id"].as_str().unwrap();
    let uri = format!("/api/inventoryItems/{}/adjust", item_id);

    let (status, body) = send(
        &app.router,
        "POST",
        &uri,
        admin.token(),
        Some(json!({ "transaction_type": "stock_in", "quantity": 5, "note": "Delivery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["item"]["quantity"], 15);
    assert_eq!(body["data"]["transaction"]["quantity"], 5);

    let (status, body) = send(
        &app.router,
        "POST",
        &uri,
        admin.token(),
        Some(json!({ "transaction_type": "stock_out", "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["item"]["quantity"], 11);
    assert_eq!(body["data"]["transaction"]["quantity"], -4);

    let (status, body) = send(
        &app.router,
        "POST",
        &uri,
        admin.token(),
        Some(json!({ "transaction_type": "adjustment", "quantity": -3, "note": "Stocktake" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["item"]["quantity"], 8);

    // 在庫を超える出庫
    let (status, body) = send(
        &app.router,
        "POST",
        &uri,
        admin.token(),
        Some(json!({ "transaction_type": "stock_out", "quantity": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient stock for Syringe"));
    assert_eq!(stock_of(&app, &admin, item_id).await, 8);

    // stock_out は正の数量のみ
    let (status, _) = send(
        &app.router,
        "POST",
        &uri,
        admin.token(),
        Some(json!({ "transaction_type": "stock_out", "quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_low_stock_list() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;

    let low = create_inventory_item(&app, &admin, "Masks", 3, 20).await;
    create_inventory_item(&app, &admin, "Gloves", 40, 10).await;
    assert_eq!(low["is_low_stock"], true);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/inventoryItems/low-stock",
        staff.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Masks");
}

#[tokio::test]
async fn test_inventory_role_access() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let staff = create_staff_account(&app, &admin, "staff").await;
    let patient = register_patient(&app).await;
    let item = create_inventory_item(&app, &admin, "Thermometer", 5, 2500).await;
    let uri = format!("/api/inventoryItems/{}", item["id"].as_str().unwrap());

    let (status, _) = send(&app.router, "GET", "/api/inventoryItems", patient.token(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "GET", "/api/inventoryItems", staff.token(), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        "PATCH",
        &uri,
        staff.token(),
        Some(json!({ "unit_price": 3000 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("{}/adjust", uri),
        staff.token(),
        Some(json!({ "transaction_type": "stock_in", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "PATCH",
        &uri,
        admin.token(),
        Some(json!({ "unit_price": 3000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unit_price"], 3000);
    // 数量は更新では変わらない
    assert_eq!(body["data"]["quantity"], 5);
}

#[tokio::test]
async fn test_item_used_by_billing_cannot_be_deleted() {
    let app = setup_app().await;
    let admin = create_admin(&app).await;
    let patient = register_patient(&app).await;
    let used = create_inventory_item(&app, &admin, "Antiseptic", 10, 600).await;
    let unused = create_inventory_item(&app, &admin, "Cotton", 10, 100).await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/billings",
        admin.token(),
        Some(json!({
            "patient_id": patient.id,
            "items": [{ "inventory_item_id": used["id"], "quantity": 1 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/inventoryItems/{}", used["id"].as_str().unwrap()),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/inventoryItems/{}", unused["id"].as_str().unwrap()),
        admin.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
