// src/api/handlers/otp_handler.rs

use crate::api::dto::otp_dto::*;
use crate::api::AppState;
use crate::error::AppResult;
use crate::types::ApiResponse;
use crate::utils::error_helper::convert_validation_errors;
use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

pub async fn send_otp_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> AppResult<ApiResponse<SendOtpResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "otp_handler::send"))?;

    let response = app_state.otp_service.send(payload).await?;
    Ok(ApiResponse::success(response))
}

pub async fn verify_otp_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<ApiResponse<VerifyOtpResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "otp_handler::verify"))?;

    let response = app_state.otp_service.verify_request(payload).await?;
    Ok(ApiResponse::success(response))
}

pub fn otp_router(app_state: AppState) -> Router {
    Router::new()
        .route("/otp/send", post(send_otp_handler))
        .route("/otp/verify", post(verify_otp_handler))
        .with_state(app_state)
}
