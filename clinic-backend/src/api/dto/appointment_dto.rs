// src/api/dto/appointment_dto.rs

use crate::domain::appointment_model;
use crate::domain::appointment_status::AppointmentStatus;
use crate::domain::time_of_day::TimeOfDay;
use crate::types::PaginationQuery;
use crate::utils::validation::{self, text};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 空き枠の表示範囲と刻み
pub const AVAILABILITY_START: TimeOfDay = TimeOfDay::CLINIC_OPEN;
pub const AVAILABILITY_END: TimeOfDay = TimeOfDay::CLINIC_CLOSE;
pub const AVAILABILITY_INTERVAL_MINUTES: u16 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// 予約作成
///
/// 患者が自分で予約する場合 `patient_id` は省略でき、指定しても本人以外は拒否される。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub appointment_date: NaiveDate,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub appointment_time: String,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Reason must be 255 characters or less"
    ))]
    pub reason: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

/// 予約の変更（日時変更は空き枠チェックをやり直す）
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub doctor_id: Option<Uuid>,
    pub appointment_date: Option<NaiveDate>,

    #[validate(custom(function = validation::validate_time_of_day))]
    pub appointment_time: Option<String>,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Reason must be 255 characters or less"
    ))]
    pub reason: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn changes_schedule(&self) -> bool {
        self.doctor_id.is_some() || self.appointment_date.is_some() || self.appointment_time.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub appointment_number: i64,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<appointment_model::Model> for AppointmentResponse {
    fn from(appointment: appointment_model::Model) -> Self {
        Self {
            status: appointment.status(),
            id: appointment.id,
            appointment_number: appointment.appointment_number,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            reason: appointment.reason,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: TimeOfDay,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub doctor_id: Option<Uuid>,
    pub slots: Vec<TimeSlot>,
}
