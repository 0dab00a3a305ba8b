// src/api/handlers/appointment_handler.rs

use crate::api::dto::appointment_dto::*;
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

// 一覧・取得・作成・キャンセルは患者も使える。患者の範囲はサービス側で本人に絞る

pub async fn list_appointments_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<ApiResponse<Vec<AppointmentResponse>>> {
    let page = app_state
        .appointment_service
        .list(&user.claims, query)
        .await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_appointment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<AppointmentResponse>> {
    let appointment = app_state.appointment_service.get(&user.claims, id).await?;
    Ok(ApiResponse::success(appointment))
}

pub async fn create_appointment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, ApiResponse<AppointmentResponse>)> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "appointment_handler::create"))?;

    let appointment = app_state
        .appointment_service
        .create(&user.claims, payload)
        .await?;
    Ok(ApiResponse::created(appointment))
}

pub async fn update_appointment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> AppResult<ApiResponse<AppointmentResponse>> {
    user.ensure_clinic_staff()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "appointment_handler::update"))?;

    let appointment = app_state
        .appointment_service
        .update(&user.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(appointment))
}

pub async fn update_appointment_status_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateAppointmentStatusRequest>,
) -> AppResult<ApiResponse<AppointmentResponse>> {
    let appointment = app_state
        .appointment_service
        .update_status(&user.claims, id, payload)
        .await?;
    Ok(ApiResponse::success(appointment))
}

pub async fn delete_appointment_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_clinic_staff()?;
    app_state
        .appointment_service
        .delete(&user.claims, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 指定日の30分刻みの空き状況
pub async fn availability_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<ApiResponse<AvailabilityResponse>> {
    let availability = app_state.appointment_service.availability(query).await?;
    Ok(ApiResponse::success(availability))
}

pub fn appointment_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments_handler).post(create_appointment_handler),
        )
        .route("/appointments/availability", get(availability_handler))
        .route(
            "/appointments/{id}",
            get(get_appointment_handler)
                .patch(update_appointment_handler)
                .delete(delete_appointment_handler),
        )
        .route(
            "/appointments/{id}/status",
            patch(update_appointment_status_handler),
        )
        .with_state(app_state)
}
