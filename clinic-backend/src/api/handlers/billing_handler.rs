// src/api/handlers/billing_handler.rs

use crate::api::dto::billing_dto::*;
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use validator::Validate;

pub async fn list_billings_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<BillingListQuery>,
) -> AppResult<ApiResponse<Vec<BillingResponse>>> {
    let page = app_state.billing_service.list(&user.claims, query).await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_billing_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<BillingResponse>> {
    let billing = app_state.billing_service.get(&user.claims, id).await?;
    Ok(ApiResponse::success(billing))
}

/// 請求の発行。明細の数量分だけ在庫が減る
pub async fn create_billing_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBillingRequest>,
) -> AppResult<(StatusCode, ApiResponse<BillingResponse>)> {
    user.ensure_clinic_staff()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "billing_handler::create"))?;

    let billing = app_state
        .billing_service
        .create(&user.claims, payload)
        .await?;
    Ok(ApiResponse::created(billing))
}

pub async fn update_billing_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateBillingRequest>,
) -> AppResult<ApiResponse<BillingResponse>> {
    user.ensure_clinic_staff()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "billing_handler::update"))?;

    let billing = app_state
        .billing_service
        .update(&user.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(billing))
}

pub async fn update_payment_status_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<ApiResponse<BillingResponse>> {
    user.ensure_clinic_staff()?;
    let billing = app_state
        .billing_service
        .update_payment_status(&user.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(billing))
}

/// 請求の削除。明細の数量は在庫に戻る
pub async fn delete_billing_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_clinic_staff()?;
    app_state.billing_service.delete(&user.claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn billing_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/billings",
            get(list_billings_handler).post(create_billing_handler),
        )
        .route(
            "/billings/{id}",
            get(get_billing_handler)
                .patch(update_billing_handler)
                .delete(delete_billing_handler),
        )
        .route("/billings/{id}/payment", patch(update_payment_status_handler))
        .with_state(app_state)
}
