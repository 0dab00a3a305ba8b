// src/api/handlers/personnel_handler.rs

use crate::api::dto::personnel_dto::*;
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

pub async fn list_personnels_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PersonnelListQuery>,
) -> AppResult<ApiResponse<Vec<PersonnelResponse>>> {
    user.ensure_clinic_staff()?;
    let page = app_state.personnel_service.list(query).await?;
    Ok(ApiResponse::paginated(page))
}

pub async fn get_personnel_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<ApiResponse<PersonnelResponse>> {
    user.ensure_clinic_staff()?;
    let personnel = app_state.personnel_service.get(id).await?;
    Ok(ApiResponse::success(personnel))
}

pub async fn create_personnel_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePersonnelRequest>,
) -> AppResult<(StatusCode, ApiResponse<PersonnelResponse>)> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "personnel_handler::create"))?;

    let personnel = app_state.personnel_service.create(payload).await?;
    Ok(ApiResponse::created(personnel))
}

pub async fn update_personnel_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
    Json(payload): Json<UpdatePersonnelRequest>,
) -> AppResult<ApiResponse<PersonnelResponse>> {
    user.ensure_admin()?;
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "personnel_handler::update"))?;

    let personnel = app_state.personnel_service.update(id, payload).await?;
    Ok(ApiResponse::success(personnel))
}

pub async fn delete_personnel_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedUuid(id): ValidatedUuid,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    app_state.personnel_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn personnel_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/personnels",
            get(list_personnels_handler).post(create_personnel_handler),
        )
        .route(
            "/personnels/{id}",
            get(get_personnel_handler)
                .patch(update_personnel_handler)
                .delete(delete_personnel_handler),
        )
        .with_state(app_state)
}
