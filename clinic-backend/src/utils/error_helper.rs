// src/utils/error_helper.rs

//! サービス層とハンドラー層で共通のエラー生成ヘルパー

use crate::domain::account::AuthClaims;
use crate::error::AppError;
use tracing::{error, warn};
use uuid::Uuid;
use validator::ValidationErrors;

/// validatorのValidationErrorsを "field: message" 形式のAppErrorに変換
pub fn convert_validation_errors(validation_errors: ValidationErrors, context: &str) -> AppError {
    warn!(
        context = %context,
        error_count = validation_errors.field_errors().len(),
        "Validation failed"
    );

    let mut errors: Vec<String> = validation_errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| "Invalid value".to_string(), |cow| cow.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    errors.sort();

    AppError::ValidationErrors(errors)
}

/// 内部サーバーエラーをログ付きで生成
pub fn internal_server_error<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
) -> AppError {
    error!(
        error = %error,
        context = %context,
        "Internal server error occurred"
    );
    AppError::InternalServerError(user_message.to_string())
}

/// 権限外のアクセス。誰がどのロールで試みたかを残す
pub fn forbidden_error(message: &str, context: &str, claims: &AuthClaims) -> AppError {
    warn!(
        context = %context,
        message = %message,
        account_id = %claims.account_id,
        account_kind = claims.account_kind.as_str(),
        role = claims.role.as_str(),
        "Forbidden access attempt"
    );
    AppError::Forbidden(message.to_string())
}

/// 患者・予約・請求などのレコードが無い
pub fn not_found_error(resource: &str, id: Uuid, context: &str) -> AppError {
    warn!(
        context = %context,
        resource = %resource,
        id = %id,
        "Resource not found"
    );
    AppError::NotFound(format!("{} {} not found", resource, id))
}

/// 競合エラーをログ付きで生成
pub fn conflict_error(message: &str, context: &str) -> AppError {
    warn!(
        context = %context,
        message = %message,
        "Resource conflict occurred"
    );
    AppError::Conflict(message.to_string())
}

/// Result型にエラー変換ヘルパーメソッドを追加するトレイト
pub trait ErrorHelperExt<T> {
    fn map_internal_error(self, context: &str, user_message: &str) -> Result<T, AppError>;
}

impl<T, E> ErrorHelperExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn map_internal_error(self, context: &str, user_message: &str) -> Result<T, AppError> {
        self.map_err(|e| internal_server_error(e, context, user_message))
    }
}
