// src/service/medical_record_service.rs

use crate::api::dto::medical_record_dto::*;
use crate::db::DbPool;
use crate::domain::account::{AuthClaims, Role};
use crate::domain::medical_record_model::ActiveModel as MedicalRecordActiveModel;
use crate::error::{AppError, AppResult};
use crate::repository::appointment_repository::AppointmentRepository;
use crate::repository::medical_record_repository::{MedicalRecordFilter, MedicalRecordRepository};
use crate::repository::personnel_repository::PersonnelRepository;
use crate::repository::user_repository::UserRepository;
use crate::types::PaginatedResponse;
use crate::utils::error_helper::{forbidden_error, not_found_error};
use sea_orm::{ActiveModelBehavior, IntoActiveModel, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct MedicalRecordService {
    record_repo: Arc<MedicalRecordRepository>,
    appointment_repo: Arc<AppointmentRepository>,
    user_repo: Arc<UserRepository>,
    personnel_repo: Arc<PersonnelRepository>,
}

impl MedicalRecordService {
    pub fn new(db: DbPool) -> Self {
        Self {
            record_repo: Arc::new(MedicalRecordRepository::new(db.clone())),
            appointment_repo: Arc::new(AppointmentRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db.clone())),
            personnel_repo: Arc::new(PersonnelRepository::new(db)),
        }
    }

    pub async fn list(
        &self,
        claims: &AuthClaims,
        query: MedicalRecordListQuery,
    ) -> AppResult<PaginatedResponse<MedicalRecordResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let filter = MedicalRecordFilter {
            patient_id: if claims.is_clinic_staff() {
                query.patient_id
            } else {
                Some(claims.account_id)
            },
            doctor_id: query.doctor_id,
            appointment_id: query.appointment_id,
            date_from: query.date_from,
            date_to: query.date_to,
        };

        let (records, total) = self
            .record_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            records.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get(&self, claims: &AuthClaims, id: Uuid) -> AppResult<MedicalRecordResponse> {
        let record = self.record_repo.find_by_id(id).await?.ok_or_else(|| {
            not_found_error("MedicalRecord", id, "medical_record_service::get")
        })?;

        if !claims.is_clinic_staff() && !claims.is_self(record.patient_id) {
            return Err(forbidden_error(
                "You can only access your own medical records",
                "medical_record_service::get",
                claims,
            ));
        }

        Ok(record.into())
    }

    pub async fn create(
        &self,
        claims: &AuthClaims,
        request: CreateMedicalRecordRequest,
    ) -> AppResult<MedicalRecordResponse> {
        self.ensure_patient(request.patient_id).await?;
        if let Some(appointment_id) = request.appointment_id {
            self.ensure_appointment_of(appointment_id, request.patient_id)
                .await?;
        }
        if let Some(doctor_id) = request.doctor_id {
            self.ensure_doctor(doctor_id).await?;
        }

        let record = MedicalRecordActiveModel {
            patient_id: Set(request.patient_id),
            appointment_id: Set(request.appointment_id),
            doctor_id: Set(request.doctor_id),
            record_date: Set(request.record_date),
            chief_complaint: Set(request.chief_complaint),
            diagnosis: Set(request.diagnosis),
            treatment: Set(request.treatment),
            prescription: Set(request.prescription),
            notes: Set(request.notes),
            ..MedicalRecordActiveModel::new()
        };

        let created = self.record_repo.create(record).await?;
        info!(
            medical_record_id = %created.id,
            patient_id = %created.patient_id,
            created_by = %claims.account_id,
            "Medical record created"
        );
        Ok(created.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateMedicalRecordRequest,
    ) -> AppResult<MedicalRecordResponse> {
        let existing = self.record_repo.find_by_id(id).await?.ok_or_else(|| {
            not_found_error("MedicalRecord", id, "medical_record_service::update")
        })?;

        if let Some(appointment_id) = request.appointment_id {
            self.ensure_appointment_of(appointment_id, existing.patient_id)
                .await?;
        }
        if let Some(doctor_id) = request.doctor_id {
            self.ensure_doctor(doctor_id).await?;
        }

        let mut active = existing.into_active_model();
        if let Some(appointment_id) = request.appointment_id {
            active.appointment_id = Set(Some(appointment_id));
        }
        if let Some(doctor_id) = request.doctor_id {
            active.doctor_id = Set(Some(doctor_id));
        }
        if let Some(record_date) = request.record_date {
            active.record_date = Set(record_date);
        }
        if let Some(value) = request.chief_complaint {
            active.chief_complaint = Set(Some(value));
        }
        if let Some(value) = request.diagnosis {
            active.diagnosis = Set(Some(value));
        }
        if let Some(value) = request.treatment {
            active.treatment = Set(Some(value));
        }
        if let Some(value) = request.prescription {
            active.prescription = Set(Some(value));
        }
        if let Some(value) = request.notes {
            active.notes = Set(Some(value));
        }

        let updated = self.record_repo.update(active).await?;
        info!(medical_record_id = %id, "Medical record updated");
        Ok(updated.into())
    }

    /// 請求から参照されていれば請求側の紐づけだけが外れる
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = self.record_repo.delete(id).await?;
        if result.rows_affected == 0 {
            return Err(not_found_error(
                "MedicalRecord",
                id,
                "medical_record_service::delete",
            ));
        }
        info!(medical_record_id = %id, "Medical record deleted");
        Ok(())
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> AppResult<()> {
        match self.user_repo.find_by_id(patient_id).await? {
            Some(user) if user.normalized_role() == Role::Patient => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "User {} is not a patient",
                patient_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Patient {} does not exist",
                patient_id
            ))),
        }
    }

    async fn ensure_appointment_of(&self, appointment_id: Uuid, patient_id: Uuid) -> AppResult<()> {
        let appointment = self
            .appointment_repo
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Appointment {} does not exist", appointment_id))
            })?;
        if appointment.patient_id != patient_id {
            return Err(AppError::BadRequest(
                "Appointment belongs to a different patient".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_doctor(&self, doctor_id: Uuid) -> AppResult<()> {
        match self.personnel_repo.find_by_id(doctor_id).await? {
            Some(personnel) if personnel.is_doctor() => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "Personnel {} is not a doctor",
                doctor_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Doctor {} does not exist",
                doctor_id
            ))),
        }
    }
}
