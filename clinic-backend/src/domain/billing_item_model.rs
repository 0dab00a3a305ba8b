// src/domain/billing_item_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

/// 請求明細。品名と単価は請求時点のスナップショット
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub billing_id: Uuid,

    pub inventory_item_id: Uuid,

    pub item_name: String,

    pub quantity: i32,

    pub unit_price: i64,

    pub line_total: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::billing_model::Entity",
        from = "Column::BillingId",
        to = "crate::domain::billing_model::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Billing,

    #[sea_orm(
        belongs_to = "crate::domain::inventory_item_model::Entity",
        from = "Column::InventoryItemId",
        to = "crate::domain::inventory_item_model::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    InventoryItem,
}

impl Related<crate::domain::billing_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Billing.def()
    }
}

impl Related<crate::domain::inventory_item_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
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
