// src/api/handlers/medical_record_handler.rs

use crate::api::dto::medical_record_dto::*;
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

pub async fn list_medical_records_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<MedicalRecordListQuery>,
) -> AppResult<ApiResponse<Vec<MedicalRecordResponse>>> {
    let page = app_state
        .medical_record_service
        .list(&user.claims, query)
        .await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_medical_record_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<MedicalRecordResponse>> {
    let record = app_state
        .medical_record_service
        .get(&user.claims, id)
        .await?;
    Ok(ApiResponse::success(record))
}

pub async fn create_medical_record_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateMedicalRecordRequest>,
) -> AppResult<(StatusCode, ApiResponse<MedicalRecordResponse>)> {
    user.ensure_clinic_staff()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "medical_record_handler::create"))?;

    let record = app_state
        .medical_record_service
        .create(&user.claims, payload)
        .await?;
    Ok(ApiResponse::created(record))
}

pub async fn update_medical_record_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdateMedicalRecordRequest>,
) -> AppResult<ApiResponse<MedicalRecordResponse>> {
    user.ensure_clinic_staff()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "medical_record_handler::update"))?;

    let record = app_state.medical_record_service.update(id, payload).await?;
    Ok(ApiResponse::success(record))
}

pub async fn delete_medical_record_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_clinic_staff()?;
    app_state.medical_record_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn medical_record_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/medicalRecords",
            get(list_medical_records_handler).post(create_medical_record_handler),
        )
        .route(
            "/medicalRecords/{id}",
            get(get_medical_record_handler)
                .patch(update_medical_record_handler)
                .delete(delete_medical_record_handler),
        )
        .with_state(app_state)
}
