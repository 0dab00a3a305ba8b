// src/domain/inventory_transaction_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 在庫台帳の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryTransactionType {
    StockIn,
    StockOut,
    Adjustment,
}

impl InventoryTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockIn => "stock_in",
            Self::StockOut => "stock_out",
            Self::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for InventoryTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_id: Uuid,

    pub transaction_type: String,

    /// 符号付きの増減量
    pub quantity: i32,

    pub reference_billing_id: Option<Uuid>,

    pub note: Option<String>,

    pub performed_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::inventory_item_model::Entity",
        from = "Column::ItemId",
        to = "crate::domain::inventory_item_model::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Item,
}

impl Related<crate::domain::inventory_item_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

/// 台帳の作成用構造体
#[derive(Debug, Clone)]
pub struct CreateInventoryTransaction {
    pub item_id: Uuid,
    pub transaction_type: InventoryTransactionType,
    pub quantity: i32,
    pub reference_billing_id: Option<Uuid>,
    pub note: Option<String>,
    pub performed_by: Option<Uuid>,
}

impl From<CreateInventoryTransaction> for ActiveModel {
    fn from(create: CreateInventoryTransaction) -> Self {
        Self {
            item_id: Set(create.item_id),
            transaction_type: Set(create.transaction_type.to_string()),
            quantity: Set(create.quantity),
            reference_billing_id: Set(create.reference_billing_id),
            note: Set(create.note),
            performed_by: Set(create.performed_by),
            ..Self::new()
        }
    }
}
