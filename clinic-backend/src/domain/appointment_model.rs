// src/domain/appointment_model.rs

use super::appointment_status::AppointmentStatus;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 1 から始まる連番
    #[sea_orm(unique)]
    pub appointment_number: i64,

    pub patient_id: Uuid,

    pub doctor_id: Option<Uuid>,

    pub appointment_date: NaiveDate,

    /// "HH:MM"
    pub appointment_time: String,

    pub reason: Option<String>,

    pub notes: Option<String>,

    pub status: String,

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
        belongs_to = "crate::domain::personnel_model::Entity",
        from = "Column::DoctorId",
        to = "crate::domain::personnel_model::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Doctor,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<crate::domain::personnel_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctor.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            status: Set(AppointmentStatus::Pending.to_string()),
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
    /// 保存値が壊れていても Pending として扱う
    pub fn status(&self) -> AppointmentStatus {
        AppointmentStatus::from_str(&self.status).unwrap_or_default()
    }
}
