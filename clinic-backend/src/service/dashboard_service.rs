// src/service/dashboard_service.rs

use crate::api::dto::dashboard_dto::{ClinicCounters, DashboardResponse};
use crate::db::DbPool;
use crate::domain::account::{AuthClaims, UserRole};
use crate::domain::appointment_status::AppointmentStatus;
use crate::domain::payment_status::PaymentStatus;
use crate::error::AppResult;
use crate::repository::appointment_repository::{AppointmentFilter, AppointmentRepository};
use crate::repository::billing_repository::BillingRepository;
use crate::repository::inventory_item_repository::InventoryItemRepository;
use crate::repository::notification_repository::NotificationRepository;
use crate::repository::personnel_repository::PersonnelRepository;
use crate::repository::user_repository::UserRepository;
use chrono::Utc;
use std::sync::Arc;

const UPCOMING_LIMIT: u64 = 5;

pub struct DashboardService {
    appointment_repo: Arc<AppointmentRepository>,
    billing_repo: Arc<BillingRepository>,
    inventory_repo: Arc<InventoryItemRepository>,
    notification_repo: Arc<NotificationRepository>,
    personnel_repo: Arc<PersonnelRepository>,
    user_repo: Arc<UserRepository>,
}

impl DashboardService {
    pub fn new(db: DbPool) -> Self {
        Self {
            appointment_repo: Arc::new(AppointmentRepository::new(db.clone())),
            billing_repo: Arc::new(BillingRepository::new(db.clone())),
            inventory_repo: Arc::new(InventoryItemRepository::new(db.clone())),
            notification_repo: Arc::new(NotificationRepository::new(db.clone())),
            personnel_repo: Arc::new(PersonnelRepository::new(db.clone())),
            user_repo: Arc::new(UserRepository::new(db)),
        }
    }

    /// ログイン直後の画面用。患者には自分の予定と未読数だけを返す
    pub async fn overview(&self, claims: &AuthClaims) -> AppResult<DashboardResponse> {
        let today = Utc::now().date_naive();
        let staff_view = claims.is_clinic_staff();

        let unread_notifications = self
            .notification_repo
            .count_unread(claims.account_id, claims.account_kind)
            .await?;

        let patient_filter = (!staff_view).then_some(claims.account_id);
        let upcoming = self
            .appointment_repo
            .find_upcoming(today, patient_filter, UPCOMING_LIMIT)
            .await?;

        let clinic = if staff_view {
            Some(self.clinic_counters(today).await?)
        } else {
            None
        };

        Ok(DashboardResponse {
            unread_notifications,
            upcoming_appointments: upcoming.into_iter().map(Into::into).collect(),
            clinic,
        })
    }

    async fn clinic_counters(&self, today: chrono::NaiveDate) -> AppResult<ClinicCounters> {
        let appointments_today = self
            .appointment_repo
            .count(&AppointmentFilter {
                date_from: Some(today),
                date_to: Some(today),
                ..AppointmentFilter::default()
            })
            .await?;
        let pending_appointments = self
            .appointment_repo
            .count(&AppointmentFilter {
                status: Some(AppointmentStatus::Pending),
                ..AppointmentFilter::default()
            })
            .await?;

        Ok(ClinicCounters {
            total_patients: self
                .user_repo
                .count_by_role(UserRole::Patient.as_str())
                .await?,
            active_personnel: self.personnel_repo.count_active().await?,
            appointments_today,
            pending_appointments,
            unpaid_billings: self.billing_repo.count_by_status(PaymentStatus::Unpaid).await?,
            low_stock_items: self.inventory_repo.count_low_stock().await?,
        })
    }
}
