// tests/common/fixture_helper.rs

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::app_helper::TestApp;
use super::auth_helper::TestAccount;
use super::request::send;

/// 在庫品目を作成して応答データを返す
pub async fn create_inventory_item(
    app: &TestApp,
    admin: &TestAccount,
    name: &str,
    quantity: i32,
    unit_price: i64,
) -> Value {
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/inventoryItems",
        admin.token(),
        Some(json!({
            "name": name,
            "category": "medicine",
            "unit": "box",
            "quantity": quantity,
            "unit_price": unit_price,
            "reorder_level": 5,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create item failed: {}", body);
    body["data"].clone()
}

/// 在庫数を読む
pub async fn stock_of(app: &TestApp, staff: &TestAccount, item_id: &str) -> i64 {
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/inventoryItems/{}", item_id),
        staff.token(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "get item failed: {}", body);
    body["data"]["quantity"].as_i64().unwrap()
}
