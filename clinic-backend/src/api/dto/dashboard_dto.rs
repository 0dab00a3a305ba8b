// src/api/dto/dashboard_dto.rs

use super::appointment_dto::AppointmentResponse;
use serde::{Deserialize, Serialize};

/// スタッフ向けの医院全体の件数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicCounters {
    pub total_patients: u64,
    pub active_personnel: u64,
    pub appointments_today: u64,
    pub pending_appointments: u64,
    pub unpaid_billings: u64,
    pub low_stock_items: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub unread_notifications: u64,
    pub upcoming_appointments: Vec<AppointmentResponse>,
    /// 患者には返さない
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic: Option<ClinicCounters>,
}
