// src/api/handlers/user_handler.rs

use crate::api::dto::user_dto::*;
use crate::api::AppState;
use crate::domain::user_model::SafeUser;
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
use tracing::info;
use validator::Validate;

// `/api/users` 配下は認証ミドルウェアで管理者に限定済み

pub async fn list_users_handler(
    State(app_state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<ApiResponse<Vec<SafeUser>>> {
    let page = app_state.user_service.list_users(query).await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_user_handler(
    State(app_state): State<AppState>,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<SafeUser>> {
    let user = app_state.user_service.get_user(id).await?;
    Ok(ApiResponse::success(user))
}

/// スタッフ・医師アカウントの作成
pub async fn create_user_handler(
    State(app_state): State<AppState>,
    admin: AuthenticatedUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, ApiResponse<SafeUser>)> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "user_handler::create_user"))?;

    let user = app_state.user_service.create_user(payload).await?;
    info!(admin_id = %admin.account_id(), user_id = %user.id, "User created by admin");

    Ok(ApiResponse::created(user))
}

pub async fn update_user_handler(
    State(app_state): State<AppState>,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<SafeUser>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "user_handler::update_user"))?;

    let user = app_state.user_service.update_user(id, payload).await?;
    Ok(ApiResponse::success(user))
}

pub async fn update_user_status_handler(
    State(app_state): State<AppState>,
    admin: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> AppResult<ApiResponse<SafeUser>> {
    let user = app_state
        .user_service
        .update_status(&admin.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(user))
}

pub async fn delete_user_handler(
    State(app_state): State<AppState>,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    app_state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn user_router(app_state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/users/{id}/status", patch(update_user_status_handler))
        .with_state(app_state)
}
