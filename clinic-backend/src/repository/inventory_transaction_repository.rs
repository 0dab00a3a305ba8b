// src/repository/inventory_transaction_repository.rs

use crate::domain::inventory_transaction_model::{
    self, ActiveModel as InventoryTransactionActiveModel, CreateInventoryTransaction,
    Entity as InventoryTransactionEntity,
};
use sea_orm::entity::*;
use sea_orm::{
    ConnectionTrait, DbConn, DbErr, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InventoryTransactionRepository {
    db: DbConn,
}

impl InventoryTransactionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        create: CreateInventoryTransaction,
    ) -> Result<inventory_transaction_model::Model, DbErr> {
        let transaction: InventoryTransactionActiveModel = create.into();
        transaction.insert(conn).await
    }

    /// 品目ごとの入出庫履歴（新しい順）
    pub async fn find_by_item(
        &self,
        item_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_transaction_model::Model>, u64), DbErr> {
        let query = InventoryTransactionEntity::find()
            .filter(inventory_transaction_model::Column::ItemId.eq(item_id));
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(inventory_transaction_model::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }
}
