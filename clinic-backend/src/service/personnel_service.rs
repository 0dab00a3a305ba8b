// src/service/personnel_service.rs

use crate::api::dto::personnel_dto::{
    CreatePersonnelRequest, PersonnelListQuery, PersonnelResponse, UpdatePersonnelRequest,
};
use crate::db::DbPool;
use crate::domain::personnel_model::ActiveModel as PersonnelActiveModel;
use crate::error::{AppError, AppResult};
use crate::repository::personnel_repository::{PersonnelFilter, PersonnelRepository};
use crate::repository::user_repository::UserRepository;
use crate::types::PaginatedResponse;
use crate::utils::email::normalize_email;
use crate::utils::error_helper::not_found_error;
use sea_orm::{ActiveModelBehavior, IntoActiveModel, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct PersonnelService {
    personnel_repo: Arc<PersonnelRepository>,
    user_repo: Arc<UserRepository>,
}

impl PersonnelService {
    pub fn new(db: DbPool) -> Self {
        Self {
            personnel_repo: Arc::new(PersonnelRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db)),
        }
    }

    pub async fn list(
        &self,
        query: PersonnelListQuery,
    ) -> AppResult<PaginatedResponse<PersonnelResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let filter = PersonnelFilter {
            position: query.position.map(|p| p.as_str().to_string()),
            is_active: query.is_active,
            search: query.search,
        };

        let (personnels, total) = self
            .personnel_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            personnels.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PersonnelResponse> {
        self.personnel_repo
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found_error("Personnel", id, "personnel_service::get"))
    }

    pub async fn create(&self, request: CreatePersonnelRequest) -> AppResult<PersonnelResponse> {
        if let Some(user_id) = request.user_id {
            self.ensure_linkable_user(user_id, None).await?;
        }

        let personnel = PersonnelActiveModel {
            user_id: Set(request.user_id),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            position: Set(request.position.as_str().to_string()),
            specialization: Set(request.specialization),
            email: Set(request.email.as_deref().map(normalize_email)),
            phone: Set(request.phone),
            ..PersonnelActiveModel::new()
        };

        let created = self.personnel_repo.create(personnel).await?;
        info!(personnel_id = %created.id, position = %created.position, "Personnel created");
        Ok(created.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePersonnelRequest,
    ) -> AppResult<PersonnelResponse> {
        let existing = self
            .personnel_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Personnel", id, "personnel_service::update"))?;

        if let Some(user_id) = request.user_id {
            if existing.user_id != Some(user_id) {
                self.ensure_linkable_user(user_id, Some(id)).await?;
            }
        }

        let mut active = existing.into_active_model();
        if let Some(user_id) = request.user_id {
            active.user_id = Set(Some(user_id));
        }
        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(position) = request.position {
            active.position = Set(position.as_str().to_string());
        }
        if let Some(specialization) = request.specialization {
            active.specialization = Set(Some(specialization));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(normalize_email(&email)));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = self.personnel_repo.update(active).await?;
        info!(personnel_id = %id, "Personnel updated");
        Ok(updated.into())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = self.personnel_repo.delete(id).await?;
        if result.rows_affected == 0 {
            return Err(not_found_error(
                "Personnel",
                id,
                "personnel_service::delete",
            ));
        }
        info!(personnel_id = %id, "Personnel deleted");
        Ok(())
    }

    /// 紐づけ先のユーザーが存在し、他の職員レコードに使われていないこと
    async fn ensure_linkable_user(&self, user_id: Uuid, current_id: Option<Uuid>) -> AppResult<()> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("User {} does not exist", user_id)));
        }
        if let Some(linked) = self.personnel_repo.find_by_user_id(user_id).await? {
            if Some(linked.id) != current_id {
                return Err(AppError::Conflict(
                    "User is already linked to another personnel record".to_string(),
                ));
            }
        }
        Ok(())
    }
}
