// src/api/dto/report_dto.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 集計期間（両端を含む）
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSummary {
    pub total: u64,
    /// ステータスごとの件数（全ステータスを0件でも含める）
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingSummary {
    pub billing_count: u64,
    pub paid_count: u64,
    /// 期間内に作成された請求の合計
    pub total_billed: i64,
    /// 期間内に支払われた請求の合計
    pub revenue: i64,
    /// 期間内に作成された未払い請求の合計
    pub outstanding: i64,
    pub total_discount: i64,
    pub doctor_fees: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryUsage {
    pub inventory_item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummaryResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub appointments: AppointmentSummary,
    pub billing: BillingSummary,
    pub medical_record_count: u64,
    /// 請求明細として払い出された在庫（数量の多い順）
    pub inventory_usage: Vec<InventoryUsage>,
}
