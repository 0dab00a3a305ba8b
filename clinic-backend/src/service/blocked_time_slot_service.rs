// src/service/blocked_time_slot_service.rs

use crate::api::dto::blocked_time_slot_dto::*;
use crate::db::DbPool;
use crate::domain::account::AuthClaims;
use crate::domain::blocked_time_slot_model::{validate_range, ActiveModel as BlockedTimeSlotActiveModel};
use crate::domain::time_of_day::TimeOfDay;
use crate::error::{AppError, AppResult};
use crate::repository::blocked_time_slot_repository::BlockedTimeSlotRepository;
use crate::types::PaginatedResponse;
use crate::utils::error_helper::not_found_error;
use sea_orm::{ActiveModelBehavior, IntoActiveModel, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct BlockedTimeSlotService {
    blocked_slot_repo: Arc<BlockedTimeSlotRepository>,
}

fn parse_time(value: &str) -> AppResult<TimeOfDay> {
    TimeOfDay::parse(value)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid time '{}', expected HH:MM", value)))
}

impl BlockedTimeSlotService {
    pub fn new(db: DbPool) -> Self {
        Self {
            blocked_slot_repo: Arc::new(BlockedTimeSlotRepository::new(db)),
        }
    }

    pub async fn list(
        &self,
        query: BlockedTimeSlotListQuery,
    ) -> AppResult<PaginatedResponse<BlockedTimeSlotResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let (slots, total) = self
            .blocked_slot_repo
            .find_paginated(query.from, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            slots.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BlockedTimeSlotResponse> {
        self.blocked_slot_repo
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| {
                not_found_error("BlockedTimeSlot", id, "blocked_time_slot_service::get")
            })
    }

    /// 既存の予約には影響しない（以後の予約だけを止める）
    pub async fn create(
        &self,
        claims: &AuthClaims,
        request: CreateBlockedTimeSlotRequest,
    ) -> AppResult<BlockedTimeSlotResponse> {
        let start_time = parse_time(&request.start_time)?;
        let end_time = parse_time(&request.end_time)?;
        validate_range(request.start_date, request.end_date, start_time, end_time)
            .map_err(AppError::BadRequest)?;

        let slot = BlockedTimeSlotActiveModel {
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            start_time: Set(start_time.to_string()),
            end_time: Set(end_time.to_string()),
            reason: Set(request.reason.filter(|r| !r.trim().is_empty())),
            created_by: Set(Some(claims.account_id)),
            ..BlockedTimeSlotActiveModel::new()
        };

        let created = self.blocked_slot_repo.create(slot).await?;
        info!(
            blocked_slot_id = %created.id,
            start_date = %created.start_date,
            end_date = %created.end_date,
            created_by = %claims.account_id,
            "Blocked time slot created"
        );
        Ok(created.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateBlockedTimeSlotRequest,
    ) -> AppResult<BlockedTimeSlotResponse> {
        let existing = self.blocked_slot_repo.find_by_id(id).await?.ok_or_else(|| {
            not_found_error("BlockedTimeSlot", id, "blocked_time_slot_service::update")
        })?;

        let start_date = request.start_date.unwrap_or(existing.start_date);
        let end_date = request.end_date.unwrap_or(existing.end_date);
        let start_time = parse_time(request.start_time.as_deref().unwrap_or(&existing.start_time))?;
        let end_time = parse_time(request.end_time.as_deref().unwrap_or(&existing.end_time))?;
        validate_range(start_date, end_date, start_time, end_time).map_err(AppError::BadRequest)?;

        let mut active = existing.into_active_model();
        active.start_date = Set(start_date);
        active.end_date = Set(end_date);
        active.start_time = Set(start_time.to_string());
        active.end_time = Set(end_time.to_string());
        if let Some(reason) = request.reason {
            active.reason = Set(Some(reason).filter(|r| !r.trim().is_empty()));
        }

        let updated = self.blocked_slot_repo.update(active).await?;
        info!(blocked_slot_id = %id, "Blocked time slot updated");
        Ok(updated.into())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = self.blocked_slot_repo.delete(id).await?;
        if result.rows_affected == 0 {
            return Err(not_found_error(
                "BlockedTimeSlot",
                id,
                "blocked_time_slot_service::delete",
            ));
        }
        info!(blocked_slot_id = %id, "Blocked time slot deleted");
        Ok(())
    }
}
