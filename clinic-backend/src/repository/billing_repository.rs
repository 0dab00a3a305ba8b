// src/repository/billing_repository.rs

use crate::domain::billing_item_model::{
    self, ActiveModel as BillingItemActiveModel, Entity as BillingItemEntity,
};
use crate::domain::billing_model::{self, ActiveModel as BillingActiveModel, Entity as BillingEntity};
use crate::domain::payment_status::PaymentStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::{
    Condition, ConnectionTrait, DbConn, DbErr, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BillingRepository {
    db: DbConn,
}

#[derive(Debug, Clone, Default)]
pub struct BillingFilter {
    pub patient_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

impl BillingRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<billing_model::Model>, DbErr> {
        BillingEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<billing_model::Model>, DbErr> {
        BillingEntity::find_by_id(id).one(conn).await
    }

    pub async fn find_paginated(
        &self,
        filter: &BillingFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<billing_model::Model>, u64), DbErr> {
        let mut condition = Condition::all();
        if let Some(patient_id) = filter.patient_id {
            condition = condition.add(billing_model::Column::PatientId.eq(patient_id));
        }
        if let Some(medical_record_id) = filter.medical_record_id {
            condition = condition.add(billing_model::Column::MedicalRecordId.eq(medical_record_id));
        }
        if let Some(status) = filter.payment_status {
            condition = condition.add(billing_model::Column::PaymentStatus.eq(status.as_str()));
        }

        let query = BillingEntity::find().filter(condition);
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(billing_model::Column::BillingNumber, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    pub async fn find_items<C: ConnectionTrait>(
        conn: &C,
        billing_id: Uuid,
    ) -> Result<Vec<billing_item_model::Model>, DbErr> {
        BillingItemEntity::find()
            .filter(billing_item_model::Column::BillingId.eq(billing_id))
            .order_by(billing_item_model::Column::CreatedAt, Order::Asc)
            .all(conn)
            .await
    }

    /// 次の請求番号（空なら1）
    pub async fn next_number<C: ConnectionTrait>(conn: &C) -> Result<i64, DbErr> {
        let max: Option<Option<i64>> = BillingEntity::find()
            .select_only()
            .column_as(billing_model::Column::BillingNumber.max(), "max_number")
            .into_tuple()
            .one(conn)
            .await?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        billing: BillingActiveModel,
    ) -> Result<billing_model::Model, DbErr> {
        billing.insert(conn).await
    }

    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        billing: BillingActiveModel,
    ) -> Result<billing_model::Model, DbErr> {
        billing.update(conn).await
    }

    pub async fn insert_item<C: ConnectionTrait>(
        conn: &C,
        item: BillingItemActiveModel,
    ) -> Result<billing_item_model::Model, DbErr> {
        item.insert(conn).await
    }

    pub async fn delete_items<C: ConnectionTrait>(conn: &C, billing_id: Uuid) -> Result<u64, DbErr> {
        let result = BillingItemEntity::delete_many()
            .filter(billing_item_model::Column::BillingId.eq(billing_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// 在庫品目を参照している明細の数
    pub async fn count_items_for_inventory_item<C: ConnectionTrait>(
        conn: &C,
        inventory_item_id: Uuid,
    ) -> Result<u64, DbErr> {
        BillingItemEntity::find()
            .filter(billing_item_model::Column::InventoryItemId.eq(inventory_item_id))
            .count(conn)
            .await
    }

    pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = BillingEntity::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected)
    }

    // --- 集計 ---

    pub async fn find_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<billing_model::Model>, DbErr> {
        BillingEntity::find()
            .filter(billing_model::Column::CreatedAt.gte(from))
            .filter(billing_model::Column::CreatedAt.lt(to))
            .all(&self.db)
            .await
    }

    pub async fn find_paid_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<billing_model::Model>, DbErr> {
        BillingEntity::find()
            .filter(billing_model::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
            .filter(billing_model::Column::PaidAt.gte(from))
            .filter(billing_model::Column::PaidAt.lt(to))
            .all(&self.db)
            .await
    }

    pub async fn count_by_status(&self, status: PaymentStatus) -> Result<u64, DbErr> {
        BillingEntity::find()
            .filter(billing_model::Column::PaymentStatus.eq(status.as_str()))
            .count(&self.db)
            .await
    }

    /// 期間内に作成された請求の明細
    pub async fn find_items_for_billings(
        &self,
        billing_ids: Vec<Uuid>,
    ) -> Result<Vec<billing_item_model::Model>, DbErr> {
        if billing_ids.is_empty() {
            return Ok(Vec::new());
        }
        BillingItemEntity::find()
            .filter(billing_item_model::Column::BillingId.is_in(billing_ids))
            .all(&self.db)
            .await
    }
}
