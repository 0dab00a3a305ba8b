// src/api/dto/billing_dto.rs

use crate::domain::billing_item_model;
use crate::domain::billing_model;
use crate::domain::payment_status::PaymentStatus;
use crate::types::PaginationQuery;
use crate::utils::validation::{quantity, text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub patient_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

/// 請求明細の入力（品名・単価は在庫マスタから写し取る）
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BillingItemInput {
    pub inventory_item_id: Uuid,

    #[validate(range(
        min = quantity::MIN,
        max = quantity::MAX,
        message = "Quantity must be between 1 and 100000"
    ))]
    pub quantity: i32,
}

/// 金額はすべて通貨の最小単位
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBillingRequest {
    pub patient_id: Uuid,
    pub medical_record_id: Option<Uuid>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Doctor fee must not be negative"))]
    pub doctor_fee: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Discount must not be negative"))]
    pub discount: i64,

    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<BillingItemInput>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

/// `items` を指定した場合は明細を丸ごと置き換える
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBillingRequest {
    pub medical_record_id: Option<Uuid>,

    #[validate(range(min = 0, message = "Doctor fee must not be negative"))]
    pub doctor_fee: Option<i64>,

    #[validate(range(min = 0, message = "Discount must not be negative"))]
    pub discount: Option<i64>,

    #[validate(nested)]
    pub items: Option<Vec<BillingItemInput>>,

    #[validate(length(
        max = text::LONG_MAX_LENGTH,
        message = "Notes must be 5000 characters or less"
    ))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingItemResponse {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl From<billing_item_model::Model> for BillingItemResponse {
    fn from(item: billing_item_model::Model) -> Self {
        Self {
            id: item.id,
            inventory_item_id: item.inventory_item_id,
            item_name: item.item_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingResponse {
    pub id: Uuid,
    pub billing_number: i64,
    pub medical_record_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub doctor_fee: i64,
    pub discount: i64,
    pub subtotal: i64,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<BillingItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillingResponse {
    pub fn new(billing: billing_model::Model, items: Vec<billing_item_model::Model>) -> Self {
        Self {
            payment_status: billing.payment_status(),
            id: billing.id,
            billing_number: billing.billing_number,
            medical_record_id: billing.medical_record_id,
            patient_id: billing.patient_id,
            doctor_fee: billing.doctor_fee,
            discount: billing.discount,
            subtotal: billing.subtotal,
            total_amount: billing.total_amount,
            paid_at: billing.paid_at,
            notes: billing.notes,
            items: items.into_iter().map(Into::into).collect(),
            created_at: billing.created_at,
            updated_at: billing.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_item_validation() {
        let request = CreateBillingRequest {
            patient_id: Uuid::new_v4(),
            medical_record_id: None,
            doctor_fee: 3000,
            discount: 0,
            items: vec![BillingItemInput {
                inventory_item_id: Uuid::new_v4(),
                quantity: 0,
            }],
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_quantity_upper_bound() {
        let item = BillingItemInput {
            inventory_item_id: Uuid::new_v4(),
            quantity: i32::MAX,
        };
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_amount_defaults() {
        let request: CreateBillingRequest =
            serde_json::from_str(&format!(r#"{{"patient_id":"{}"}}"#, Uuid::new_v4())).unwrap();
        assert_eq!(request.doctor_fee, 0);
        assert_eq!(request.discount, 0);
        assert!(request.items.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let request = UpdateBillingRequest {
            doctor_fee: Some(-1),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
