// src/repository/inventory_item_repository.rs

use crate::domain::inventory_item_model::{
    self, ActiveModel as InventoryItemActiveModel, Entity as InventoryItemEntity,
};
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    Condition, ConnectionTrait, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InventoryItemRepository {
    db: DbConn,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

fn low_stock_condition() -> Condition {
    Condition::all()
        .add(inventory_item_model::Column::IsActive.eq(true))
        .add(
            Expr::col(inventory_item_model::Column::Quantity)
                .lte(Expr::col(inventory_item_model::Column::ReorderLevel)),
        )
}

impl InventoryItemRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<inventory_item_model::Model>, DbErr> {
        InventoryItemEntity::find_by_id(id).one(&self.db).await
    }

    /// 行ロック付きで取得（PostgreSQL では SELECT ... FOR UPDATE）
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<inventory_item_model::Model>, DbErr> {
        InventoryItemEntity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
    }

    pub async fn find_paginated(
        &self,
        filter: &InventoryItemFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_item_model::Model>, u64), DbErr> {
        let mut condition = Condition::all();
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            condition = condition.add(inventory_item_model::Column::Name.contains(search.trim()));
        }
        if let Some(category) = &filter.category {
            condition = condition.add(inventory_item_model::Column::Category.eq(category.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(inventory_item_model::Column::IsActive.eq(is_active));
        }

        let query = InventoryItemEntity::find().filter(condition);
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(inventory_item_model::Column::Name, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    /// 在庫数が発注点以下の有効な品目
    pub async fn find_low_stock(&self) -> Result<Vec<inventory_item_model::Model>, DbErr> {
        InventoryItemEntity::find()
            .filter(low_stock_condition())
            .order_by(inventory_item_model::Column::Quantity, Order::Asc)
            .order_by(inventory_item_model::Column::Name, Order::Asc)
            .all(&self.db)
            .await
    }

    pub async fn count_low_stock(&self) -> Result<u64, DbErr> {
        InventoryItemEntity::find()
            .filter(low_stock_condition())
            .count(&self.db)
            .await
    }

    pub async fn count_active(&self) -> Result<u64, DbErr> {
        InventoryItemEntity::find()
            .filter(inventory_item_model::Column::IsActive.eq(true))
            .count(&self.db)
            .await
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        item: InventoryItemActiveModel,
    ) -> Result<inventory_item_model::Model, DbErr> {
        item.insert(conn).await
    }

    pub async fn update(
        &self,
        item: InventoryItemActiveModel,
    ) -> Result<inventory_item_model::Model, DbErr> {
        item.update(&self.db).await
    }

    pub async fn set_quantity<C: ConnectionTrait>(
        conn: &C,
        item: inventory_item_model::Model,
        quantity: i32,
    ) -> Result<inventory_item_model::Model, DbErr> {
        let mut active_model: InventoryItemActiveModel = item.into();
        active_model.quantity = sea_orm::Set(quantity);
        active_model.update(conn).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        InventoryItemEntity::delete_by_id(id).exec(&self.db).await
    }
}
