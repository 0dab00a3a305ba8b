// src/api/dto/blocked_time_slot_dto.rs

use crate::domain::blocked_time_slot_model;
use crate::types::PaginationQuery;
use crate::utils::validation::{self, text};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockedTimeSlotListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    /// この日以降も有効な枠だけを返す
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBlockedTimeSlotRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub start_time: String,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub end_time: String,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Reason must be 255 characters or less"
    ))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBlockedTimeSlotRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub start_time: Option<String>,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub end_time: Option<String>,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Reason must be 255 characters or less"
    ))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTimeSlotResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<blocked_time_slot_model::Model> for BlockedTimeSlotResponse {
    fn from(slot: blocked_time_slot_model::Model) -> Self {
        Self {
            id: slot.id,
            start_date: slot.start_date,
            end_date: slot.end_date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            reason: slot.reason,
            created_by: slot.created_by,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}
