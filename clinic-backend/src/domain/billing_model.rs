// src/domain/billing_model.rs

use super::payment_status::PaymentStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub billing_number: i64,

    pub medical_record_id: Option<Uuid>,

    pub patient_id: Uuid,

    // 金額はすべて最小通貨単位
    pub doctor_fee: i64,

    pub discount: i64,

    pub subtotal: i64,

    pub total_amount: i64,

    pub payment_status: String,

    pub paid_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::PatientId",
        to = "crate::domain::user_model::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Patient,

    #[sea_orm(
        belongs_to = "crate::domain::medical_record_model::Entity",
        from = "Column::MedicalRecordId",
        to = "crate::domain::medical_record_model::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    MedicalRecord,

    #[sea_orm(has_many = "crate::domain::billing_item_model::Entity")]
    Items,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<crate::domain::billing_item_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            doctor_fee: Set(0),
            discount: Set(0),
            subtotal: Set(0),
            total_amount: Set(0),
            payment_status: Set(PaymentStatus::Unpaid.to_string()),
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

impl Model {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.payment_status).unwrap_or_default()
    }
}

/// 請求金額の内訳
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingTotals {
    pub subtotal: i64,
    pub doctor_fee: i64,
    pub discount: i64,
    pub total_amount: i64,
}

/// 請求金額の計算エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingTotalsError {
    NegativeAmount(&'static str),
    DiscountExceedsAmount { discount: i64, gross: i64 },
    Overflow,
}

impl std::fmt::Display for BillingTotalsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount(field) => write!(f, "{} must not be negative", field),
            Self::DiscountExceedsAmount { discount, gross } => write!(
                f,
                "discount ({}) must not exceed subtotal plus doctor fee ({})",
                discount, gross
            ),
            Self::Overflow => write!(f, "billing amount is too large"),
        }
    }
}

/// total = Σ(quantity × unit_price) + doctor_fee − discount
///
/// `lines` は (quantity, unit_price) の組。
pub fn compute_totals(
    lines: &[(i32, i64)],
    doctor_fee: i64,
    discount: i64,
) -> Result<BillingTotals, BillingTotalsError> {
    if doctor_fee < 0 {
        return Err(BillingTotalsError::NegativeAmount("doctor_fee"));
    }
    if discount < 0 {
        return Err(BillingTotalsError::NegativeAmount("discount"));
    }

    let mut subtotal: i64 = 0;
    for (quantity, unit_price) in lines {
        let line = i64::from(*quantity)
            .checked_mul(*unit_price)
            .ok_or(BillingTotalsError::Overflow)?;
        subtotal = subtotal
            .checked_add(line)
            .ok_or(BillingTotalsError::Overflow)?;
    }

    let gross = subtotal
        .checked_add(doctor_fee)
        .ok_or(BillingTotalsError::Overflow)?;
    if discount > gross {
        return Err(BillingTotalsError::DiscountExceedsAmount { discount, gross });
    }

    Ok(BillingTotals {
        subtotal,
        doctor_fee,
        discount,
        total_amount: gross - discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_lines_plus_fee_minus_discount() {
        let totals = compute_totals(&[(2, 500), (3, 120)], 3000, 200).unwrap();
        assert_eq!(totals.subtotal, 1360);
        assert_eq!(totals.total_amount, 1360 + 3000 - 200);
    }

    #[test]
    fn test_no_lines() {
        let totals = compute_totals(&[], 2500, 0).unwrap();
        assert_eq!(totals.subtotal, 0);
        assert_eq!(totals.total_amount, 2500);
    }

    #[test]
    fn test_discount_may_equal_gross() {
        let totals = compute_totals(&[(1, 1000)], 500, 1500).unwrap();
        assert_eq!(totals.total_amount, 0);
    }

    #[test]
    fn test_discount_exceeding_gross_is_rejected() {
        assert_eq!(
            compute_totals(&[(1, 1000)], 500, 1501),
            Err(BillingTotalsError::DiscountExceedsAmount {
                discount: 1501,
                gross: 1500
            })
        );
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        assert!(compute_totals(&[], -1, 0).is_err());
        assert!(compute_totals(&[], 0, -1).is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(
            compute_totals(&[(i32::MAX, i64::MAX)], 0, 0),
            Err(BillingTotalsError::Overflow)
        );
    }
}
