// src/service/notification_service.rs

use crate::api::dto::notification_dto::{
    MarkAllReadResponse, NotificationListQuery, NotificationResponse, UnreadCountResponse,
};
use crate::db::DbPool;
use crate::domain::account::{AccountKind, AuthClaims};
use crate::domain::notification_model::{self, CreateNotification, NotificationCategory};
use crate::error::AppResult;
use crate::repository::notification_repository::NotificationRepository;
use crate::types::PaginatedResponse;
use crate::utils::error_helper::not_found_error;
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct NotificationService {
    notification_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(db: DbPool) -> Self {
        Self {
            notification_repo: Arc::new(NotificationRepository::new(db)),
        }
    }

    /// 患者アカウント宛ての通知を作成（業務トランザクションの中から呼ぶ）
    pub async fn notify_patient<C: ConnectionTrait>(
        conn: &C,
        patient_id: Uuid,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> AppResult<notification_model::Model> {
        let notification = NotificationRepository::insert(
            conn,
            CreateNotification {
                recipient_id: patient_id,
                recipient_kind: AccountKind::User,
                title: title.into(),
                message: message.into(),
                category,
            },
        )
        .await?;
        Ok(notification)
    }

    pub async fn list(
        &self,
        claims: &AuthClaims,
        query: NotificationListQuery,
    ) -> AppResult<PaginatedResponse<NotificationResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let (items, total) = self
            .notification_repo
            .find_for_recipient(
                claims.account_id,
                claims.account_kind,
                query.unread_only.unwrap_or(false),
                query.pagination.get_offset(),
                query.pagination.limit(),
            )
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn unread_count(&self, claims: &AuthClaims) -> AppResult<UnreadCountResponse> {
        let unread_count = self
            .notification_repo
            .count_unread(claims.account_id, claims.account_kind)
            .await?;
        Ok(UnreadCountResponse { unread_count })
    }

    /// 他人の通知は存在しないものとして扱う
    pub async fn mark_read(&self, claims: &AuthClaims, id: Uuid) -> AppResult<NotificationResponse> {
        let notification = self
            .notification_repo
            .find_owned(id, claims.account_id, claims.account_kind)
            .await?
            .ok_or_else(|| {
                not_found_error("Notification", id, "notification_service::mark_read")
            })?;

        let updated = self.notification_repo.mark_read(notification).await?;
        Ok(updated.into())
    }

    pub async fn mark_all_read(&self, claims: &AuthClaims) -> AppResult<MarkAllReadResponse> {
        let updated_count = self
            .notification_repo
            .mark_all_read(claims.account_id, claims.account_kind)
            .await?;
        info!(
            account_id = %claims.account_id,
            updated_count,
            "Notifications marked as read"
        );
        Ok(MarkAllReadResponse { updated_count })
    }

    pub async fn delete(&self, claims: &AuthClaims, id: Uuid) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_owned(id, claims.account_id, claims.account_kind)
            .await?
            .ok_or_else(|| {
                not_found_error("Notification", id, "notification_service::delete")
            })?;

        self.notification_repo.delete(notification.id).await?;
        Ok(())
    }
}
