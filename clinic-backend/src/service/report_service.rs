// src/service/report_service.rs

use crate::api::dto::report_dto::*;
use crate::db::DbPool;
use crate::domain::appointment_model;
use crate::domain::appointment_status::AppointmentStatus;
use crate::domain::billing_item_model;
use crate::domain::billing_model;
use crate::error::{AppError, AppResult};
use crate::repository::appointment_repository::AppointmentRepository;
use crate::repository::billing_repository::BillingRepository;
use crate::repository::medical_record_repository::{MedicalRecordFilter, MedicalRecordRepository};
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 期間レポートの最大日数
pub const MAX_REPORT_DAYS: u64 = 366;

pub struct ReportService {
    appointment_repo: Arc<AppointmentRepository>,
    billing_repo: Arc<BillingRepository>,
    record_repo: Arc<MedicalRecordRepository>,
}

/// [from, to] の日付範囲を UTC の半開区間 [start, end) に直す
fn day_bounds(from: NaiveDate, to: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let end_date = to
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::BadRequest("Invalid report range".to_string()))?;
    let start = from.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    let end = end_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::BadRequest("Invalid report range".to_string())),
    }
}

fn summarize_appointments(appointments: &[appointment_model::Model]) -> AppointmentSummary {
    let mut by_status: BTreeMap<String, u64> = AppointmentStatus::all()
        .into_iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for appointment in appointments {
        *by_status
            .entry(appointment.status().as_str().to_string())
            .or_insert(0) += 1;
    }
    AppointmentSummary {
        total: appointments.len() as u64,
        by_status,
    }
}

/// created: 期間内に作成された請求、paid: 期間内に支払われた請求
fn summarize_billings(
    created: &[billing_model::Model],
    paid: &[billing_model::Model],
) -> BillingSummary {
    let mut summary = BillingSummary {
        billing_count: created.len() as u64,
        paid_count: paid.len() as u64,
        ..BillingSummary::default()
    };
    for billing in created {
        summary.total_billed += billing.total_amount;
        summary.total_discount += billing.discount;
        summary.doctor_fees += billing.doctor_fee;
        if !billing.payment_status().is_paid() {
            summary.outstanding += billing.total_amount;
        }
    }
    summary.revenue = paid.iter().map(|billing| billing.total_amount).sum();
    summary
}

fn summarize_usage(items: &[billing_item_model::Model]) -> Vec<InventoryUsage> {
    let mut usage: HashMap<Uuid, InventoryUsage> = HashMap::new();
    for item in items {
        let entry = usage
            .entry(item.inventory_item_id)
            .or_insert_with(|| InventoryUsage {
                inventory_item_id: item.inventory_item_id,
                item_name: item.item_name.clone(),
                quantity: 0,
                amount: 0,
            });
        entry.quantity += i64::from(item.quantity);
        entry.amount += item.line_total;
    }

    let mut usage: Vec<InventoryUsage> = usage.into_values().collect();
    usage.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    usage
}

impl ReportService {
    pub fn new(db: DbPool) -> Self {
        Self {
            appointment_repo: Arc::new(AppointmentRepository::new(db.clone())),
            billing_repo: Arc::new(BillingRepository::new(db.clone())),
            record_repo: Arc::new(MedicalRecordRepository::new(db)),
        }
    }

    /// 期間サマリー（両端の日付を含む）
    pub async fn summary(&self, query: ReportQuery) -> AppResult<ReportSummaryResponse> {
        if query.from > query.to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        let days = (query.to - query.from).num_days() as u64 + 1;
        if days > MAX_REPORT_DAYS {
            return Err(AppError::BadRequest(format!(
                "Report range must be {} days or less",
                MAX_REPORT_DAYS
            )));
        }

        let (start, end) = day_bounds(query.from, query.to)?;

        let appointments = self
            .appointment_repo
            .find_in_range(query.from, query.to)
            .await?;
        let created = self.billing_repo.find_created_between(start, end).await?;
        let paid = self.billing_repo.find_paid_between(start, end).await?;
        let items = self
            .billing_repo
            .find_items_for_billings(created.iter().map(|b| b.id).collect())
            .await?;
        let medical_record_count = self
            .record_repo
            .count(&MedicalRecordFilter {
                date_from: Some(query.from),
                date_to: Some(query.to),
                ..MedicalRecordFilter::default()
            })
            .await?;

        let response = ReportSummaryResponse {
            from: query.from,
            to: query.to,
            appointments: summarize_appointments(&appointments),
            billing: summarize_billings(&created, &paid),
            medical_record_count,
            inventory_usage: summarize_usage(&items),
        };

        info!(
            from = %query.from,
            to = %query.to,
            appointments = response.appointments.total,
            billings = response.billing.billing_count,
            "Report summary generated"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment_status::PaymentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn billing(total: i64, fee: i64, discount: i64, status: PaymentStatus) -> billing_model::Model {
        let now = Utc::now();
        billing_model::Model {
            id: Uuid::new_v4(),
            billing_number: 1,
            medical_record_id: None,
            patient_id: Uuid::new_v4(),
            doctor_fee: fee,
            discount,
            subtotal: total - fee + discount,
            total_amount: total,
            payment_status: status.to_string(),
            paid_at: status.is_paid().then_some(now),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(item_id: Uuid, name: &str, quantity: i32, unit_price: i64) -> billing_item_model::Model {
        let now = Utc::now();
        billing_item_model::Model {
            id: Uuid::new_v4(),
            billing_id: Uuid::new_v4(),
            inventory_item_id: item_id,
            item_name: name.to_string(),
            quantity,
            unit_price,
            line_total: i64::from(quantity) * unit_price,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_day_bounds_include_last_day() {
        let (start, end) = day_bounds(date(2025, 4, 1), date(2025, 4, 30)).unwrap();
        assert_eq!(start.date_naive(), date(2025, 4, 1));
        assert_eq!(end.date_naive(), date(2025, 5, 1));
    }

    #[test]
    fn test_billing_summary() {
        let paid = billing(5000, 3000, 0, PaymentStatus::Paid);
        let unpaid = billing(2000, 1000, 500, PaymentStatus::Unpaid);
        let created = vec![paid.clone(), unpaid];

        let summary = summarize_billings(&created, &[paid]);
        assert_eq!(summary.billing_count, 2);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.total_billed, 7000);
        assert_eq!(summary.revenue, 5000);
        assert_eq!(summary.outstanding, 2000);
        assert_eq!(summary.total_discount, 500);
        assert_eq!(summary.doctor_fees, 4000);
    }

    #[test]
    fn test_usage_is_grouped_and_sorted() {
        let gauze = Uuid::new_v4();
        let syringe = Uuid::new_v4();
        let usage = summarize_usage(&[
            line(gauze, "Gauze", 2, 100),
            line(syringe, "Syringe", 5, 50),
            line(gauze, "Gauze", 1, 100),
        ]);

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].item_name, "Syringe");
        assert_eq!(usage[0].quantity, 5);
        assert_eq!(usage[1].quantity, 3);
        assert_eq!(usage[1].amount, 300);
    }

    #[test]
    fn test_appointment_summary_lists_every_status() {
        let summary = summarize_appointments(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.by_status.len(), AppointmentStatus::all().len());
        assert!(summary.by_status.values().all(|count| *count == 0));
    }
}
