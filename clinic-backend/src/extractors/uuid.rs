// src/extractors/uuid.rs

use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// UUIDらしいセグメントの直前のリソース名からパラメータ名を決める
fn uuid_param_name(path: &str) -> &'static str {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    segments
        .windows(2)
        .find(|pair| pair[1].len() == 36 && pair[1].contains('-'))
        .map_or("id", |pair| match pair[0] {
            "users" => "user_id",
            "personnels" => "personnel_id",
            "appointments" => "appointment_id",
            "blockedTimeSlots" => "blocked_time_slot_id",
            "medicalRecords" => "medical_record_id",
            "billings" => "billing_id",
            "inventoryItems" => "inventory_item_id",
            "notifications" => "notification_id",
            _ => "id",
        })
}

/// パスの `{id}` をUUIDとして取り出す
///
/// 形式が不正なら 400 を返す（Path<Uuid> のままだと素のテキストエラーになる）。
#[derive(Debug, Clone, Copy)]
pub struct ValidatedUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidatedUuid
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                AppError::BadRequest(format!(
                    "Missing path parameter '{}': {}",
                    uuid_param_name(parts.uri.path()),
                    e
                ))
            })?;

        let uuid = Uuid::parse_str(&raw).map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid UUID format for '{}': '{}'",
                uuid_param_name(parts.uri.path()),
                raw
            ))
        })?;

        Ok(ValidatedUuid(uuid))
    }
}
