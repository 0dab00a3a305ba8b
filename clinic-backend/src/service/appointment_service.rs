// src/service/appointment_service.rs

use crate::api::dto::appointment_dto::*;
use crate::db::DbPool;
use crate::domain::account::{AuthClaims, Role};
use crate::domain::appointment_model::{self, ActiveModel as AppointmentActiveModel};
use crate::domain::appointment_status::AppointmentStatus;
use crate::domain::blocked_time_slot_model::find_blocking;
use crate::domain::notification_model::NotificationCategory;
use crate::domain::time_of_day::TimeOfDay;
use crate::error::{AppError, AppResult};
use crate::repository::appointment_repository::{AppointmentFilter, AppointmentRepository};
use crate::repository::blocked_time_slot_repository::BlockedTimeSlotRepository;
use crate::repository::personnel_repository::PersonnelRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::notification_service::NotificationService;
use crate::types::PaginatedResponse;
use crate::utils::error_helper::{forbidden_error, not_found_error};
use crate::utils::transaction::TransactionManager;
use chrono::NaiveDate;
use sea_orm::{ActiveModelBehavior, ConnectionTrait, IntoActiveModel, Set};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct AppointmentService {
    db: DbPool,
    appointment_repo: Arc<AppointmentRepository>,
    user_repo: Arc<UserRepository>,
    personnel_repo: Arc<PersonnelRepository>,
}

/// 予約・日時変更の前に枠を確認する
///
/// ブロック枠に入っていれば理由付きの 409、同じ医師の同時刻予約があれば 409。
async fn ensure_bookable<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    time: TimeOfDay,
    doctor_id: Option<Uuid>,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let slots = BlockedTimeSlotRepository::find_covering(conn, date).await?;
    if let Some(slot) = find_blocking(&slots, date, time) {
        info!(
            blocked_slot_id = %slot.id,
            date = %date,
            time = %time,
            "Booking rejected by blocked time slot"
        );
        return Err(AppError::Conflict(format!(
            "The selected time is not available: {}",
            slot.reason_or_default()
        )));
    }

    if let Some(doctor_id) = doctor_id {
        let conflict = AppointmentRepository::find_doctor_conflict(
            conn,
            doctor_id,
            date,
            &time.to_string(),
            exclude_id,
        )
        .await?;
        if let Some(existing) = conflict {
            info!(
                existing_appointment_id = %existing.id,
                doctor_id = %doctor_id,
                "Double booking rejected"
            );
            return Err(AppError::Conflict(
                "The doctor already has an appointment at this time".to_string(),
            ));
        }
    }

    Ok(())
}

fn parse_time(value: &str) -> AppResult<TimeOfDay> {
    TimeOfDay::parse(value)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid time '{}', expected HH:MM", value)))
}

impl AppointmentService {
    pub fn new(db: DbPool) -> Self {
        Self {
            appointment_repo: Arc::new(AppointmentRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db.clone())),
            personnel_repo: Arc::new(PersonnelRepository::new(db.clone())),
            db,
        }
    }

    /// 患者は自分の予約だけを見られる
    pub async fn list(
        &self,
        claims: &AuthClaims,
        query: AppointmentListQuery,
    ) -> AppResult<PaginatedResponse<AppointmentResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let patient_id = if claims.is_clinic_staff() {
            query.patient_id
        } else {
            Some(claims.account_id)
        };

        let filter = AppointmentFilter {
            patient_id,
            doctor_id: query.doctor_id,
            status: query.status,
            date_from: query.date_from,
            date_to: query.date_to,
        };

        let (items, total) = self
            .appointment_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get(&self, claims: &AuthClaims, id: Uuid) -> AppResult<AppointmentResponse> {
        let appointment = self.find_visible(claims, id, "appointment_service::get").await?;
        Ok(appointment.into())
    }

    /// 予約の作成（Pending で登録し、患者に通知する）
    pub async fn create(
        &self,
        claims: &AuthClaims,
        request: CreateAppointmentRequest,
    ) -> AppResult<AppointmentResponse> {
        let patient_id = self.resolve_patient(claims, request.patient_id).await?;
        let time = parse_time(&request.appointment_time)?;
        if let Some(doctor_id) = request.doctor_id {
            self.ensure_doctor(doctor_id).await?;
        }

        let date = request.appointment_date;
        let doctor_id = request.doctor_id;
        let reason = request.reason;
        let notes = request.notes;

        let appointment = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    ensure_bookable(txn, date, time, doctor_id, None).await?;

                    let number = AppointmentRepository::next_number(txn).await?;
                    let appointment = AppointmentRepository::insert(
                        txn,
                        AppointmentActiveModel {
                            appointment_number: Set(number),
                            patient_id: Set(patient_id),
                            doctor_id: Set(doctor_id),
                            appointment_date: Set(date),
                            appointment_time: Set(time.to_string()),
                            reason: Set(reason),
                            notes: Set(notes),
                            ..AppointmentActiveModel::new()
                        },
                    )
                    .await?;

                    NotificationService::notify_patient(
                        txn,
                        patient_id,
                        NotificationCategory::Appointment,
                        "Appointment requested",
                        format!(
                            "Your appointment #{} on {} at {} has been requested.",
                            appointment.appointment_number,
                            appointment.appointment_date,
                            appointment.appointment_time
                        ),
                    )
                    .await?;

                    Ok(appointment)
                })
            })
            .await?;

        info!(
            appointment_id = %appointment.id,
            appointment_number = appointment.appointment_number,
            patient_id = %appointment.patient_id,
            created_by = %claims.account_id,
            "Appointment created"
        );

        Ok(appointment.into())
    }

    /// 担当医・日時・メモの変更（スタッフのみ）
    pub async fn update(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> AppResult<AppointmentResponse> {
        let existing = self
            .appointment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Appointment", id, "appointment_service::update"))?;

        if existing.status().is_terminal() {
            return Err(AppError::BadRequest(format!(
                "A {} appointment cannot be modified",
                existing.status()
            )));
        }

        let reschedule = request.changes_schedule();
        let date = request.appointment_date.unwrap_or(existing.appointment_date);
        let time = match &request.appointment_time {
            Some(value) => parse_time(value)?,
            None => parse_time(&existing.appointment_time)?,
        };
        let doctor_id = request.doctor_id.or(existing.doctor_id);
        if let Some(new_doctor) = request.doctor_id {
            self.ensure_doctor(new_doctor).await?;
        }

        let mut active = existing.into_active_model();
        active.appointment_date = Set(date);
        active.appointment_time = Set(time.to_string());
        active.doctor_id = Set(doctor_id);
        if let Some(reason) = request.reason {
            active.reason = Set(Some(reason));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let updated = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    if reschedule {
                        ensure_bookable(txn, date, time, doctor_id, Some(id)).await?;
                    }
                    let updated = AppointmentRepository::update(txn, active).await?;

                    if reschedule {
                        NotificationService::notify_patient(
                            txn,
                            updated.patient_id,
                            NotificationCategory::Appointment,
                            "Appointment rescheduled",
                            format!(
                                "Your appointment #{} is now on {} at {}.",
                                updated.appointment_number,
                                updated.appointment_date,
                                updated.appointment_time
                            ),
                        )
                        .await?;
                    }
                    Ok(updated)
                })
            })
            .await?;

        info!(
            appointment_id = %id,
            rescheduled = reschedule,
            updated_by = %claims.account_id,
            "Appointment updated"
        );

        Ok(updated.into())
    }

    /// ステータス変更
    ///
    /// 遷移表にない変更は 400、同じステータスへの変更は何もせず成功。
    /// 患者は自分の予約を取り消すことだけができる。
    pub async fn update_status(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        request: UpdateAppointmentStatusRequest,
    ) -> AppResult<AppointmentResponse> {
        let existing = self
            .find_visible(claims, id, "appointment_service::update_status")
            .await?;
        let current = existing.status();
        let new_status = request.status;

        if !claims.is_clinic_staff() && new_status != AppointmentStatus::Cancelled {
            return Err(forbidden_error(
                "Patients can only cancel their appointments",
                "appointment_service::update_status",
                claims,
            ));
        }

        if current == new_status {
            return Ok(existing.into());
        }

        if !current.can_transition_to(new_status) {
            return Err(AppError::BadRequest(format!(
                "Cannot change appointment status from {} to {}",
                current, new_status
            )));
        }

        let mut active = existing.into_active_model();
        active.status = Set(new_status.to_string());

        let updated = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let updated = AppointmentRepository::update(txn, active).await?;
                    NotificationService::notify_patient(
                        txn,
                        updated.patient_id,
                        NotificationCategory::Appointment,
                        format!("Appointment {}", new_status),
                        format!(
                            "Your appointment #{} on {} at {} is now {}.",
                            updated.appointment_number,
                            updated.appointment_date,
                            updated.appointment_time,
                            new_status
                        ),
                    )
                    .await?;
                    Ok(updated)
                })
            })
            .await?;

        info!(
            appointment_id = %id,
            from = %current,
            to = %new_status,
            changed_by = %claims.account_id,
            "Appointment status changed"
        );

        Ok(updated.into())
    }

    pub async fn delete(&self, claims: &AuthClaims, id: Uuid) -> AppResult<()> {
        let result = self.appointment_repo.delete(id).await?;
        if result.rows_affected == 0 {
            return Err(not_found_error(
                "Appointment",
                id,
                "appointment_service::delete",
            ));
        }
        info!(appointment_id = %id, deleted_by = %claims.account_id, "Appointment deleted");
        Ok(())
    }

    /// 診療時間内の枠ごとの空き状況
    ///
    /// ブロック枠はすべての医師に効く。予約済みの判定は医師を指定したときだけ行う。
    pub async fn availability(&self, query: AvailabilityQuery) -> AppResult<AvailabilityResponse> {
        if let Some(doctor_id) = query.doctor_id {
            self.ensure_doctor(doctor_id).await?;
        }

        let blocked = BlockedTimeSlotRepository::find_covering(&self.db, query.date).await?;
        let booked: HashMap<String, Uuid> = match query.doctor_id {
            Some(doctor_id) => self
                .appointment_repo
                .find_occupying_on(query.date, Some(doctor_id))
                .await?
                .into_iter()
                .map(|a| (a.appointment_time, a.id))
                .collect(),
            None => HashMap::new(),
        };

        let slots = TimeOfDay::slots_between(
            AVAILABILITY_START,
            AVAILABILITY_END,
            AVAILABILITY_INTERVAL_MINUTES,
        )
        .into_iter()
        .map(|time| {
            if let Some(slot) = find_blocking(&blocked, query.date, time) {
                TimeSlot {
                    time,
                    available: false,
                    reason: Some(slot.reason_or_default().to_string()),
                }
            } else if booked.contains_key(&time.to_string()) {
                TimeSlot {
                    time,
                    available: false,
                    reason: Some("Already booked".to_string()),
                }
            } else {
                TimeSlot {
                    time,
                    available: true,
                    reason: None,
                }
            }
        })
        .collect();

        Ok(AvailabilityResponse {
            date: query.date,
            doctor_id: query.doctor_id,
            slots,
        })
    }

    // --- 内部処理 ---

    async fn find_visible(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        context: &str,
    ) -> AppResult<appointment_model::Model> {
        let appointment = self
            .appointment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Appointment", id, context))?;

        if !claims.is_clinic_staff() && !claims.is_self(appointment.patient_id) {
            return Err(forbidden_error(
                "You can only access your own appointments",
                context,
                claims,
            ));
        }
        Ok(appointment)
    }

    /// 予約対象の患者を決める
    async fn resolve_patient(&self, claims: &AuthClaims, requested: Option<Uuid>) -> AppResult<Uuid> {
        if claims.role == Role::Patient {
            return match requested {
                Some(patient_id) if !claims.is_self(patient_id) => Err(forbidden_error(
                    "Patients can only book appointments for themselves",
                    "appointment_service::create",
                    claims,
                )),
                _ => Ok(claims.account_id),
            };
        }

        let patient_id = requested
            .ok_or_else(|| AppError::BadRequest("patient_id is required".to_string()))?;
        let patient = self
            .user_repo
            .find_by_id(patient_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Patient {} does not exist", patient_id)))?;
        if patient.normalized_role() != Role::Patient {
            return Err(AppError::BadRequest(format!(
                "User {} is not a patient",
                patient_id
            )));
        }
        Ok(patient_id)
    }

    async fn ensure_doctor(&self, doctor_id: Uuid) -> AppResult<()> {
        match self.personnel_repo.find_by_id(doctor_id).await? {
            Some(personnel) if personnel.is_doctor() && personnel.is_active => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "Personnel {} is not an active doctor",
                doctor_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Doctor {} does not exist",
                doctor_id
            ))),
        }
    }
}
