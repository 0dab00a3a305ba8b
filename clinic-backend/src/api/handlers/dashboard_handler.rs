// src/api/handlers/dashboard_handler.rs

use crate::api::dto::dashboard_dto::DashboardResponse;
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{extract::State, routing::get, Router};

pub async fn dashboard_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<DashboardResponse>> {
    let overview = app_state.dashboard_service.overview(&user.claims).await?;
    Ok(ApiResponse::success(overview))
}

pub fn dashboard_router(app_state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_handler))
        .with_state(app_state)
}
