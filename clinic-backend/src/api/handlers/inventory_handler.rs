// src/api/handlers/inventory_handler.rs

use crate::api::dto::inventory_dto::*;
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::{ApiResponse, PaginationQuery};
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

// 閲覧はスタッフ全員、品目の変更と在庫調整は管理者

pub async fn list_inventory_items_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<InventoryItemListQuery>,
) -> AppResult<ApiResponse<Vec<InventoryItemResponse>>> {
    user.ensure_clinic_staff()?;
    let page = app_state.inventory_service.list(query).await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn low_stock_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<InventoryItemResponse>>> {
    user.ensure_clinic_staff()?;
    let items = app_state.inventory_service.low_stock().await?;
    Ok(ApiResponse::success(items))
}

pub async fn get_inventory_item_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<InventoryItemResponse>> {
    user.ensure_clinic_staff()?;
    let item = app_state.inventory_service.get(id).await?;
    Ok(ApiResponse::success(item))
}

pub async fn create_inventory_item_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> AppResult<(StatusCode, ApiResponse<InventoryItemResponse>)> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "inventory_handler::create"))?;

    let item = app_state
        .inventory_service
        .create(&user.claims, payload)
        .await?;
    Ok(ApiResponse::created(item))
}

pub async fn update_inventory_item_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateInventoryItemRequest>,
) -> AppResult<ApiResponse<InventoryItemResponse>> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "inventory_handler::update"))?;

    let item = app_state.inventory_service.update(id, payload).await?;
    Ok(ApiResponse::success(item))
}

pub async fn delete_inventory_item_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    app_state.inventory_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 入庫・出庫・棚卸調整
pub async fn adjust_stock_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<AdjustStockRequest>,
) -> AppResult<ApiResponse<StockAdjustmentResponse>> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "inventory_handler::adjust"))?;

    let adjustment = app_state
        .inventory_service
        .adjust(&user.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(adjustment))
}

pub async fn list_inventory_transactions_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<ApiResponse<Vec<InventoryTransactionResponse>>> {
    user.ensure_clinic_staff()?;
    let page = app_state
        .inventory_service
        .transactions(id, pagination)
        .await?;
    Ok(ApiResponse::paginated(page))
}

pub fn inventory_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/inventoryItems",
            get(list_inventory_items_handler).post(create_inventory_item_handler),
        )
        .route("/inventoryItems/low-stock", get(low_stock_handler))
        .route(
            "/inventoryItems/{id}",
            get(get_inventory_item_handler)
                .patch(update_inventory_item_handler)
                .delete(delete_inventory_item_handler),
        )
        .route("/inventoryItems/{id}/adjust", post(adjust_stock_handler))
        .route(
            "/inventoryItems/{id}/transactions",
            get(list_inventory_transactions_handler),
        )
        .with_state(app_state)
}
