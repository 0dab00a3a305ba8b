// src/repository/notification_repository.rs

use crate::domain::account::AccountKind;
use crate::domain::notification_model::{
    self, ActiveModel as NotificationActiveModel, CreateNotification, Entity as NotificationEntity,
};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    Condition, ConnectionTrait, DbConn, DbErr, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DbConn,
}

fn recipient_condition(recipient_id: Uuid, recipient_kind: AccountKind) -> Condition {
    Condition::all()
        .add(notification_model::Column::RecipientId.eq(recipient_id))
        .add(notification_model::Column::RecipientKind.eq(recipient_kind.as_str()))
}

impl NotificationRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        create: CreateNotification,
    ) -> Result<notification_model::Model, DbErr> {
        let notification: NotificationActiveModel = create.into();
        notification.insert(conn).await
    }

    pub async fn find_for_recipient(
        &self,
        recipient_id: Uuid,
        recipient_kind: AccountKind,
        unread_only: bool,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<notification_model::Model>, u64), DbErr> {
        let mut condition = recipient_condition(recipient_id, recipient_kind);
        if unread_only {
            condition = condition.add(notification_model::Column::IsRead.eq(false));
        }

        let query = NotificationEntity::find().filter(condition);
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(notification_model::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    pub async fn find_owned(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        recipient_kind: AccountKind,
    ) -> Result<Option<notification_model::Model>, DbErr> {
        NotificationEntity::find_by_id(id)
            .filter(recipient_condition(recipient_id, recipient_kind))
            .one(&self.db)
            .await
    }

    pub async fn count_unread(
        &self,
        recipient_id: Uuid,
        recipient_kind: AccountKind,
    ) -> Result<u64, DbErr> {
        NotificationEntity::find()
            .filter(recipient_condition(recipient_id, recipient_kind))
            .filter(notification_model::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    pub async fn mark_read(
        &self,
        notification: notification_model::Model,
    ) -> Result<notification_model::Model, DbErr> {
        if notification.is_read {
            return Ok(notification);
        }
        let mut active_model: NotificationActiveModel = notification.into();
        active_model.is_read = sea_orm::Set(true);
        active_model.read_at = sea_orm::Set(Some(Utc::now()));
        active_model.update(&self.db).await
    }

    pub async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        recipient_kind: AccountKind,
    ) -> Result<u64, DbErr> {
        let now = Utc::now();
        let result = NotificationEntity::update_many()
            .col_expr(notification_model::Column::IsRead, Expr::value(true))
            .col_expr(notification_model::Column::ReadAt, Expr::value(Some(now)))
            .col_expr(notification_model::Column::UpdatedAt, Expr::value(now))
            .filter(recipient_condition(recipient_id, recipient_kind))
            .filter(notification_model::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = NotificationEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
