// src/api/dto/medical_record_dto.rs

use crate::domain::medical_record_model;
use crate::types::PaginationQuery;
use crate::utils::validation::text;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicalRecordListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub record_date: NaiveDate,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Chief complaint must be 255 characters or less"
    ))]
    pub chief_complaint: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Diagnosis must be 5000 characters or less"
    ))]
    pub diagnosis: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Treatment must be 5000 characters or less"
    ))]
    pub treatment: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Prescription must be 5000 characters or less"
    ))]
    pub prescription: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMedicalRecordRequest {
    pub appointment_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub record_date: Option<NaiveDate>,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Chief complaint must be 255 characters or less"
    ))]
    pub chief_complaint: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Diagnosis must be 5000 characters or less"
    ))]
    pub diagnosis: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Treatment must be 5000 characters or less"
    ))]
    pub treatment: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Prescription must be 5000 characters or less"
    ))]
    pub prescription: Option<String>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub record_date: NaiveDate,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<medical_record_model::Model> for MedicalRecordResponse {
    fn from(record: medical_record_model::Model) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id,
            appointment_id: record.appointment_id,
            doctor_id: record.doctor_id,
            record_date: record.record_date,
            chief_complaint: record.chief_complaint,
            diagnosis: record.diagnosis,
            treatment: record.treatment,
            prescription: record.prescription,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
