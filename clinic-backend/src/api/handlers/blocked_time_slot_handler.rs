// src/api/handlers/blocked_time_slot_handler.rs

use crate::api::dto::blocked_time_slot_dto::*;
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

// 閲覧は予約画面でも使うので認証済みなら誰でも、変更は管理者のみ

pub async fn list_blocked_time_slots_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<BlockedTimeSlotListQuery>,
) -> AppResult<ApiResponse<Vec<BlockedTimeSlotResponse>>> {
    let page = app_state.blocked_time_slot_service.list(query).await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_blocked_time_slot_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<BlockedTimeSlotResponse>> {
    let slot = app_state.blocked_time_slot_service.get(id).await?;
    Ok(ApiResponse::success(slot))
}

pub async fn create_blocked_time_slot_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBlockedTimeSlotRequest>,
) -> AppResult<(StatusCode, ApiResponse<BlockedTimeSlotResponse>)> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "blocked_time_slot_handler::create"))?;

    let slot = app_state
        .blocked_time_slot_service
        .create(&user.claims, payload)
        .await?;
    Ok(ApiResponse::created(slot))
}

pub async fn update_blocked_time_slot_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateBlockedTimeSlotRequest>,
) -> AppResult<ApiResponse<BlockedTimeSlotResponse>> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "blocked_time_slot_handler::update"))?;

    let slot = app_state
        .blocked_time_slot_service
        .update(id, payload)
        .await?;
    Ok(ApiResponse::success(slot))
}

pub async fn delete_blocked_time_slot_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    app_state.blocked_time_slot_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn blocked_time_slot_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/blockedTimeSlots",
            get(list_blocked_time_slots_handler).post(create_blocked_time_slot_handler),
        )
        .route(
            "/blockedTimeSlots/{id}",
            get(get_blocked_time_slot_handler)
                .patch(update_blocked_time_slot_handler)
                .delete(delete_blocked_time_slot_handler),
        )
        .with_state(app_state)
}
