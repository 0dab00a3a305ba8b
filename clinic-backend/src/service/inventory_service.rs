// src/service/inventory_service.rs

use crate::api::dto::inventory_dto::*;
use crate::db::DbPool;
use crate::domain::account::AuthClaims;
use crate::domain::inventory_item_model::{self, ActiveModel as InventoryItemActiveModel};
use crate::domain::inventory_transaction_model::{
    self, CreateInventoryTransaction, InventoryTransactionType,
};
use crate::error::{AppError, AppResult};
use crate::repository::billing_repository::BillingRepository;
use crate::repository::inventory_item_repository::{InventoryItemFilter, InventoryItemRepository};
use crate::repository::inventory_transaction_repository::InventoryTransactionRepository;
use crate::types::{PaginatedResponse, PaginationQuery};
use crate::utils::error_helper::not_found_error;
use crate::utils::transaction::TransactionManager;
use sea_orm::{ActiveModelBehavior, ConnectionTrait, IntoActiveModel, Set};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 在庫の増減一件分
#[derive(Debug, Clone)]
pub struct StockMovement {
    pub transaction_type: InventoryTransactionType,
    pub delta: i32,
    pub reference_billing_id: Option<Uuid>,
    pub note: Option<String>,
    pub performed_by: Option<Uuid>,
}

pub struct InventoryService {
    db: DbPool,
    item_repo: Arc<InventoryItemRepository>,
    transaction_repo: Arc<InventoryTransactionRepository>,
}

impl InventoryService {
    pub fn new(db: DbPool) -> Self {
        Self {
            item_repo: Arc::new(InventoryItemRepository::new(db.clone())),
            transaction_repo: Arc::new(InventoryTransactionRepository::new(db.clone())),
            db,
        }
    }

    /// ロック済みの品目に増減を適用し、台帳に記録する
    ///
    /// 在庫がマイナスになる場合は 400 で何も書かない。
    pub async fn apply_movement<C: ConnectionTrait>(
        conn: &C,
        item: inventory_item_model::Model,
        movement: StockMovement,
    ) -> AppResult<(inventory_item_model::Model, inventory_transaction_model::Model)> {
        let new_quantity = item.apply_delta(movement.delta).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Insufficient stock for {}: {} available, {} requested",
                item.name,
                item.quantity,
                movement.delta.unsigned_abs()
            ))
        })?;

        let item_id = item.id;
        let updated = InventoryItemRepository::set_quantity(conn, item, new_quantity).await?;
        let transaction = InventoryTransactionRepository::insert(
            conn,
            CreateInventoryTransaction {
                item_id,
                transaction_type: movement.transaction_type,
                quantity: movement.delta,
                reference_billing_id: movement.reference_billing_id,
                note: movement.note,
                performed_by: movement.performed_by,
            },
        )
        .await?;

        if updated.is_low_stock() && updated.is_active {
            warn!(
                item_id = %updated.id,
                quantity = updated.quantity,
                reorder_level = updated.reorder_level,
                "Inventory item is at or below its reorder level"
            );
        }

        Ok((updated, transaction))
    }

    /// 行ロックを取って品目を読む。存在しなければ 400
    pub async fn lock_item<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
    ) -> AppResult<inventory_item_model::Model> {
        InventoryItemRepository::find_for_update(conn, item_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Inventory item {} does not exist", item_id))
            })
    }

    pub async fn list(
        &self,
        query: InventoryItemListQuery,
    ) -> AppResult<PaginatedResponse<InventoryItemResponse>> {
        let (page, per_page) = query.pagination.get_pagination();
        let filter = InventoryItemFilter {
            search: query.search,
            category: query.category,
            is_active: query.is_active,
        };

        let (items, total) = self
            .item_repo
            .find_paginated(&filter, query.pagination.get_offset(), query.pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<InventoryItemResponse> {
        self.item_repo
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found_error("InventoryItem", id, "inventory_service::get"))
    }

    pub async fn low_stock(&self) -> AppResult<Vec<InventoryItemResponse>> {
        let items = self.item_repo.find_low_stock().await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// 品目の登録。初期在庫があれば stock_in として記録する
    pub async fn create(
        &self,
        claims: &AuthClaims,
        request: CreateInventoryItemRequest,
    ) -> AppResult<InventoryItemResponse> {
        let performed_by = claims.account_id;
        let initial_quantity = request.quantity;
        let item = InventoryItemActiveModel {
            name: Set(request.name.trim().to_string()),
            category: Set(request.category.filter(|c| !c.trim().is_empty())),
            unit: Set(request.unit.trim().to_string()),
            unit_price: Set(request.unit_price),
            reorder_level: Set(request.reorder_level),
            ..InventoryItemActiveModel::new()
        };

        let created = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let created = InventoryItemRepository::insert(txn, item).await?;
                    if initial_quantity == 0 {
                        return Ok(created);
                    }

                    let (stocked, _) = Self::apply_movement(
                        txn,
                        created,
                        StockMovement {
                            transaction_type: InventoryTransactionType::StockIn,
                            delta: initial_quantity,
                            reference_billing_id: None,
                            note: Some("Initial stock".to_string()),
                            performed_by: Some(performed_by),
                        },
                    )
                    .await?;
                    Ok(stocked)
                })
            })
            .await?;

        info!(
            item_id = %created.id,
            name = %created.name,
            quantity = created.quantity,
            "Inventory item created"
        );
        Ok(created.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> AppResult<InventoryItemResponse> {
        let existing = self
            .item_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("InventoryItem", id, "inventory_service::update"))?;

        let mut active = existing.into_active_model();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(category) = request.category {
            active.category = Set(Some(category).filter(|c| !c.trim().is_empty()));
        }
        if let Some(unit) = request.unit {
            active.unit = Set(unit.trim().to_string());
        }
        if let Some(unit_price) = request.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(reorder_level) = request.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        let updated = self.item_repo.update(active).await?;
        info!(item_id = %id, "Inventory item updated");
        Ok(updated.into())
    }

    /// 請求明細から参照されている品目は 409（無効化で代用する）
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let in_use = || {
            AppError::Conflict("Inventory item is used by billings. Deactivate it instead".to_string())
        };

        if BillingRepository::count_items_for_inventory_item(&self.db, id).await? > 0 {
            warn!(item_id = %id, "Refused to delete inventory item referenced by billings");
            return Err(in_use());
        }

        // 確認後に明細が追加された場合は外部キー制約で弾かれる
        let result = self.item_repo.delete(id).await.map_err(|e| {
            let error = AppError::from(e);
            if error.is_foreign_key_violation() {
                in_use()
            } else {
                error
            }
        })?;

        if result.rows_affected == 0 {
            return Err(not_found_error(
                "InventoryItem",
                id,
                "inventory_service::delete",
            ));
        }
        info!(item_id = %id, "Inventory item deleted");
        Ok(())
    }

    /// 手動の入庫・出庫・棚卸調整
    pub async fn adjust(
        &self,
        claims: &AuthClaims,
        id: Uuid,
        request: AdjustStockRequest,
    ) -> AppResult<StockAdjustmentResponse> {
        let delta = request.delta().map_err(AppError::BadRequest)?;
        let performed_by = claims.account_id;
        let transaction_type = request.transaction_type;
        let note = request.note;

        let (item, transaction) = self
            .db
            .execute_in_transaction(move |txn| {
                Box::pin(async move {
                    let item = InventoryItemRepository::find_for_update(txn, id)
                        .await?
                        .ok_or_else(|| {
                            not_found_error("InventoryItem", id, "inventory_service::adjust")
                        })?;

                    Self::apply_movement(
                        txn,
                        item,
                        StockMovement {
                            transaction_type,
                            delta,
                            reference_billing_id: None,
                            note,
                            performed_by: Some(performed_by),
                        },
                    )
                    .await
                })
            })
            .await?;

        info!(
            item_id = %item.id,
            transaction_type = %transaction_type,
            delta,
            quantity = item.quantity,
            performed_by = %performed_by,
            "Stock adjusted"
        );

        Ok(StockAdjustmentResponse {
            item: item.into(),
            transaction: transaction.into(),
        })
    }

    pub async fn transactions(
        &self,
        id: Uuid,
        pagination: PaginationQuery,
    ) -> AppResult<PaginatedResponse<InventoryTransactionResponse>> {
        if self.item_repo.find_by_id(id).await?.is_none() {
            return Err(not_found_error(
                "InventoryItem",
                id,
                "inventory_service::transactions",
            ));
        }

        let (page, per_page) = pagination.get_pagination();
        let (transactions, total) = self
            .transaction_repo
            .find_by_item(id, pagination.get_offset(), pagination.limit())
            .await?;

        Ok(PaginatedResponse::new(
            transactions.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total as i64,
        ))
    }
}
