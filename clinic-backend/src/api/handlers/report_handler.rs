// src/api/handlers/report_handler.rs

use crate::api::dto::report_dto::{ReportQuery, ReportSummaryResponse};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};

/// `from` と `to` を含む期間の集計
pub async fn report_summary_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<ReportSummaryResponse>> {
    user.ensure_clinic_staff()?;
    let summary = app_state.report_service.summary(query).await?;
    Ok(ApiResponse::success(summary))
}

pub fn report_router(app_state: AppState) -> Router {
    Router::new()
        .route("/reports/summary", get(report_summary_handler))
        .with_state(app_state)
}
