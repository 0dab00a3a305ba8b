// src/service/user_service.rs

use crate::api::dto::user_dto::{
    CreateUserRequest, UpdateUserRequest, UpdateUserStatusRequest, UserListQuery,
};
use crate::db::DbPool;
use crate::domain::account::{AccountKind, AuthClaims};
use crate::domain::user_model::SafeUser;
use crate::error::{AppError, AppResult};
use crate::repository::refresh_token_repository::RefreshTokenRepository;
use crate::repository::user_repository::{CreateUser, UpdateUser, UserFilter, UserRepository};
use crate::service::otp_service::OtpService;
use crate::types::PaginatedResponse;
use crate::utils::email::normalize_email;
use crate::utils::error_helper::{conflict_error, not_found_error, ErrorHelperExt};
use crate::utils::password::PasswordManager;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 管理者向けのユーザー管理
pub struct UserService {
    db: DbPool,
    user_repo: Arc<UserRepository>,
    password_manager: Arc<PasswordManager>,
    otp_service: Arc<OtpService>,
}

impl UserService {
    pub fn new(
        db: DbPool,
        password_manager: Arc<PasswordManager>,
        otp_service: Arc<OtpService>,
    ) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(db.clone())),
            db,
            password_manager,
            otp_service,
        }
    }

    pub async fn list_users(&self, query: UserListQuery) -> AppResult<PaginatedResponse<SafeUser>> {
        let (page, per_page) = query.pagination.get_pagination();
        let filter = UserFilter {
            search: query.search,
            role: query.role.map(|r| r.as_str().to_string()),
            is_active: query.is_active,
        };

        let (users, total) = self
            .user_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            users.into_iter().map(SafeUser::from).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<SafeUser> {
        self.user_repo
            .find_by_id(id)
            .await?
            .map(SafeUser::from)
            .ok_or_else(|| not_found_error("User", id, "user_service::get_user"))
    }

    /// スタッフ・医師アカウントの作成（メール検証なしで有効化）
    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<SafeUser> {
        let email = normalize_email(&request.email);
        if self.otp_service.is_registered(&email).await? {
            return Err(conflict_error(
                "Email address is already registered",
                "user_service::create_user",
            ));
        }

        self.password_manager
            .validate_password_strength(&request.password)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let password_hash = self
            .password_manager
            .hash_password(&request.password)
            .map_internal_error("user_service::create_user", "Password hashing failed")?;

        let user = self
            .user_repo
            .create(CreateUser {
                email,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                phone: request.phone,
                role: request.role.as_str().to_string(),
                password_hash,
                email_verified: true,
            })
            .await
            .map_err(|e| {
                // 事前チェック後に同じメールで登録された場合
                let error = AppError::from(e);
                if error.is_unique_violation() {
                    conflict_error("Email address is already registered", "user_service::create_user")
                } else {
                    error
                }
            })?;

        info!(user_id = %user.id, role = %user.role, "User account created by admin");
        Ok(user.into())
    }

    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> AppResult<SafeUser> {
        if !request.has_changes() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let email = request.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            let current = self
                .user_repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| not_found_error("User", id, "user_service::update_user"))?;
            if &current.email != email && self.otp_service.is_registered(email).await? {
                return Err(conflict_error(
                    "Email address is already registered",
                    "user_service::update_user",
                ));
            }
        }

        let updated = self
            .user_repo
            .update(
                id,
                UpdateUser {
                    email,
                    first_name: request.first_name.map(|s| s.trim().to_string()),
                    last_name: request.last_name.map(|s| s.trim().to_string()),
                    phone: request.phone,
                    role: request.role.map(|r| r.as_str().to_string()),
                },
            )
            .await?
            .ok_or_else(|| not_found_error("User", id, "user_service::update_user"))?;

        info!(user_id = %id, "User updated");
        Ok(updated.into())
    }

    /// 有効・無効の切り替え。無効化したアカウントのリフレッシュトークンは失効させる
    pub async fn update_status(
        &self,
        admin: &AuthClaims,
        id: Uuid,
        request: UpdateUserStatusRequest,
    ) -> AppResult<SafeUser> {
        let updated = self
            .user_repo
            .set_active(id, request.is_active)
            .await?
            .ok_or_else(|| not_found_error("User", id, "user_service::update_status"))?;

        if !request.is_active {
            let revoked = RefreshTokenRepository::revoke_all_for_account(
                &self.db,
                id,
                AccountKind::User.as_str(),
            )
            .await?;
            info!(user_id = %id, revoked_tokens = revoked, admin_id = %admin.account_id, "User deactivated");
        } else {
            info!(user_id = %id, admin_id = %admin.account_id, "User activated");
        }

        Ok(updated.into())
    }

    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let result = self.user_repo.delete(id).await?;
        if result.rows_affected == 0 {
            return Err(not_found_error(
                "User",
                id,
                "user_service::delete_user",
            ));
        }
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
