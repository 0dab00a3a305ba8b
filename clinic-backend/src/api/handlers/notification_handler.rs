// src/api/handlers/notification_handler.rs

use crate::api::dto::notification_dto::*;
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::ValidatedUuid;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Router,
};

// 通知は常にログイン中のアカウント宛てのものだけを扱う

pub async fn list_notifications_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let page = app_state
        .notification_service
        .list(&user.claims, query)
        .await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn unread_count_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = app_state
        .notification_service
        .unread_count(&user.claims)
        .await?;
    Ok(ApiResponse::success(count))
}

pub async fn mark_read_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = app_state
        .notification_service
        .mark_read(&user.claims, id)
        .await?;
    Ok(ApiResponse::success(notification))
}

pub async fn mark_all_read_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<MarkAllReadResponse>> {
    let response = app_state
        .notification_service
        .mark_all_read(&user.claims)
        .await?;
    Ok(ApiResponse::success(response))
}

pub async fn delete_notification_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    app_state
        .notification_service
        .delete(&user.claims, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn notification_router(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/unread-count", get(unread_count_handler))
        .route("/notifications/read-all", patch(mark_all_read_handler))
        .route("/notifications/{id}/read", patch(mark_read_handler))
        .route("/notifications/{id}", delete(delete_notification_handler))
        .with_state(app_state)
}
