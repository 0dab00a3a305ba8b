// src/repository/blocked_time_slot_repository.rs

use crate::domain::blocked_time_slot_model::{
    self, ActiveModel as BlockedTimeSlotActiveModel, Entity as BlockedTimeSlotEntity,
};
use chrono::NaiveDate;
use sea_orm::entity::*;
use sea_orm::{
    ConnectionTrait, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BlockedTimeSlotRepository {
    db: DbConn,
}

impl BlockedTimeSlotRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<blocked_time_slot_model::Model>, DbErr> {
        BlockedTimeSlotEntity::find_by_id(id).one(&self.db).await
    }

    /// 指定日以降に終わる枠（from を省略すると全件）
    pub async fn find_paginated(
        &self,
        from: Option<NaiveDate>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<blocked_time_slot_model::Model>, u64), DbErr> {
        let mut query = BlockedTimeSlotEntity::find();
        if let Some(from) = from {
            query = query.filter(blocked_time_slot_model::Column::EndDate.gte(from));
        }

        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(blocked_time_slot_model::Column::StartDate, Order::Asc)
            .order_by(blocked_time_slot_model::Column::StartTime, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    /// 指定日を含む枠を作成順に返す（先頭一致の判定順）
    pub async fn find_covering<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
    ) -> Result<Vec<blocked_time_slot_model::Model>, DbErr> {
        BlockedTimeSlotEntity::find()
            .filter(blocked_time_slot_model::Column::StartDate.lte(date))
            .filter(blocked_time_slot_model::Column::EndDate.gte(date))
            .order_by(blocked_time_slot_model::Column::CreatedAt, Order::Asc)
            .all(conn)
            .await
    }

    pub async fn create(
        &self,
        slot: BlockedTimeSlotActiveModel,
    ) -> Result<blocked_time_slot_model::Model, DbErr> {
        slot.insert(&self.db).await
    }

    pub async fn update(
        &self,
        slot: BlockedTimeSlotActiveModel,
    ) -> Result<blocked_time_slot_model::Model, DbErr> {
        slot.update(&self.db).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        BlockedTimeSlotEntity::delete_by_id(id).exec(&self.db).await
    }
}
