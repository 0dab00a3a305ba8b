// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Multiple validation errors")]
    ValidationErrors(Vec<String>),

    #[error("Failed to parse UUID: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    /// 一意制約違反かどうか
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::DbErr(db_err)
                if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        )
    }

    /// 外部キー制約違反かどうか（参照されている行の削除など）
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            AppError::DbErr(db_err)
                if matches!(db_err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
        )
    }
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::DbErr(db_err) => {
                let sql_err = db_err.sql_err();
                if let Some(SqlErr::UniqueConstraintViolation(detail)) = &sql_err {
                    tracing::warn!(detail = %detail, "Unique constraint violation");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::new("conflict", "The resource already exists"),
                    )
                } else if let Some(SqlErr::ForeignKeyConstraintViolation(detail)) = &sql_err {
                    tracing::warn!(detail = %detail, "Foreign key constraint violation");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::new(
                            "conflict",
                            "The resource is referenced by other records",
                        ),
                    )
                } else {
                    tracing::error!(error = ?db_err, "Database error");

                    let status = match db_err {
                        DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                        _ => StatusCode::INTERNAL_SERVER_ERROR,
                    };

                    // クライアントへは詳細を出さない
                    let (message, details) = match &db_err {
                        DbErr::RecordNotFound(entity) => (
                            "The requested resource was not found",
                            Some(json!({ "entity": entity })),
                        ),
                        DbErr::Exec(_) => (
                            "A database operation failed",
                            Some(json!({ "operation": "exec" })),
                        ),
                        DbErr::Query(_) => (
                            "A database query failed",
                            Some(json!({ "operation": "query" })),
                        ),
                        _ => ("A database error occurred", None),
                    };

                    let mut response = ErrorResponse::new("database_error", message);
                    response.details = details;
                    (status, response)
                }
            }
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("not_found", message),
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation_error", message),
            ),
            AppError::ValidationErrors(errors) => {
                let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
                for error in &errors {
                    if let Some((field, message)) = error.split_once(": ") {
                        field_errors
                            .entry(field.to_string())
                            .or_default()
                            .push(message.to_string());
                    }
                }
                let errors_array: Vec<serde_json::Value> =
                    errors.iter().map(|e| json!({"message": e})).collect();

                let mut response = ErrorResponse::new("validation_errors", "Validation failed");
                response.validation_errors = Some(field_errors);
                response.errors = Some(errors_array);
                (StatusCode::BAD_REQUEST, response)
            }
            AppError::UuidError(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("invalid_uuid", format!("Invalid UUID: {}", err)),
            ),
            AppError::ValidationFailure(errors) => {
                let field_errors: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let messages = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                let errors_array: Vec<serde_json::Value> = field_errors
                    .iter()
                    .flat_map(|(field, messages)| {
                        messages
                            .iter()
                            .map(move |msg| json!({"message": format!("{}: {}", field, msg)}))
                    })
                    .collect();

                let mut response = ErrorResponse::new("validation_errors", "Validation failed");
                response.validation_errors = Some(field_errors);
                response.errors = Some(errors_array);
                (StatusCode::BAD_REQUEST, response)
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("bad_request", message),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("unauthorized", message),
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("forbidden", message),
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("conflict", message),
            ),
            AppError::TooManyRequests(message) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new("too_many_requests", message),
            ),
            AppError::InternalServerError(message) => {
                tracing::error!(message = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "internal_server_error",
                        "An internal server error occurred",
                    ),
                )
            }
            AppError::ExternalServiceError(message) => {
                tracing::error!(message = %message, "External service error");
                let mut response =
                    ErrorResponse::new("external_service_error", "External service error");
                response.message = message;
                (StatusCode::SERVICE_UNAVAILABLE, response)
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
    pub error_type: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: message.clone(),
            message,
            details: None,
            validation_errors: None,
            errors: None,
            error_type: error_type.to_string(),
        }
    }
}

/// ApiResponse に埋め込むエラー詳細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
