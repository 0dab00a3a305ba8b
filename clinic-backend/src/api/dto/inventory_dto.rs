// src/api/dto/inventory_dto.rs

use crate::domain::inventory_item_model;
use crate::domain::inventory_transaction_model::{self, InventoryTransactionType};
use crate::types::{deserialize_optional_bool_from_string, PaginationQuery};
use crate::utils::validation::{name, text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryItemListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool_from_string")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInventoryItemRequest {
    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = name::MAX_LENGTH, message = "Category must be 100 characters or less"))]
    pub category: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Unit must be between 1 and 20 characters"))]
    pub unit: String,

    /// 初期在庫。0より大きければ入庫として台帳に記録する
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,

    #[validate(range(min = 0, message = "Unit price must not be negative"))]
    pub unit_price: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Reorder level must not be negative"))]
    pub reorder_level: i32,
}

/// 在庫数は adjust でのみ変更する
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateInventoryItemRequest {
    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,

    #[validate(length(max = name::MAX_LENGTH, message = "Category must be 100 characters or less"))]
    pub category: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Unit must be between 1 and 20 characters"))]
    pub unit: Option<String>,

    #[validate(range(min = 0, message = "Unit price must not be negative"))]
    pub unit_price: Option<i64>,

    #[validate(range(min = 0, message = "Reorder level must not be negative"))]
    pub reorder_level: Option<i32>,

    pub is_active: Option<bool>,
}

/// 在庫の手動調整
///
/// stock_in / stock_out は正の数量、adjustment は符号付きの差分。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub transaction_type: InventoryTransactionType,
    pub quantity: i32,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Note must be 255 characters or less"
    ))]
    pub note: Option<String>,
}

impl AdjustStockRequest {
    /// 在庫に適用する差分
    pub fn delta(&self) -> Result<i32, String> {
        match self.transaction_type {
            InventoryTransactionType::StockIn if self.quantity > 0 => Ok(self.quantity),
            InventoryTransactionType::StockOut if self.quantity > 0 => Ok(-self.quantity),
            InventoryTransactionType::Adjustment if self.quantity != 0 => Ok(self.quantity),
            InventoryTransactionType::Adjustment => {
                Err("Adjustment quantity must not be zero".to_string())
            }
            _ => Err(format!(
                "Quantity for {} must be greater than zero",
                self.transaction_type
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub reorder_level: i32,
    pub is_active: bool,
    pub is_low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_item_model::Model> for InventoryItemResponse {
    fn from(item: inventory_item_model::Model) -> Self {
        Self {
            is_low_stock: item.is_low_stock(),
            id: item.id,
            name: item.name,
            category: item.category,
            unit: item.unit,
            quantity: item.quantity,
            unit_price: item.unit_price,
            reorder_level: item.reorder_level,
            is_active: item.is_active,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransactionResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub transaction_type: String,
    pub quantity: i32,
    pub reference_billing_id: Option<Uuid>,
    pub note: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_transaction_model::Model> for InventoryTransactionResponse {
    fn from(transaction: inventory_transaction_model::Model) -> Self {
        Self {
            id: transaction.id,
            item_id: transaction.item_id,
            transaction_type: transaction.transaction_type,
            quantity: transaction.quantity,
            reference_billing_id: transaction.reference_billing_id,
            note: transaction.note,
            performed_by: transaction.performed_by,
            created_at: transaction.created_at,
        }
    }
}

/// 在庫調整の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustmentResponse {
    pub item: InventoryItemResponse,
    pub transaction: InventoryTransactionResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjust(transaction_type: InventoryTransactionType, quantity: i32) -> AdjustStockRequest {
        AdjustStockRequest {
            transaction_type,
            quantity,
            note: None,
        }
    }

    #[test]
    fn test_delta_signs() {
        assert_eq!(adjust(InventoryTransactionType::StockIn, 5).delta(), Ok(5));
        assert_eq!(adjust(InventoryTransactionType::StockOut, 5).delta(), Ok(-5));
        assert_eq!(adjust(InventoryTransactionType::Adjustment, -3).delta(), Ok(-3));
    }

    #[test]
    fn test_delta_rejects_bad_quantities() {
        assert!(adjust(InventoryTransactionType::StockIn, 0).delta().is_err());
        assert!(adjust(InventoryTransactionType::StockOut, -2).delta().is_err());
        assert!(adjust(InventoryTransactionType::Adjustment, 0).delta().is_err());
    }
}
