// src/domain/medical_record_model.rs

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "medical_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub patient_id: Uuid,

    pub appointment_id: Option<Uuid>,

    pub doctor_id: Option<Uuid>,

    pub record_date: NaiveDate,

    pub chief_complaint: Option<String>,

    pub diagnosis: Option<String>,

    pub treatment: Option<String>,

    pub prescription: Option<String>,

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
        belongs_to = "crate::domain::appointment_model::Entity",
        from = "Column::AppointmentId",
        to = "crate::domain::appointment_model::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Appointment,

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

impl Related<crate::domain::appointment_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointment.def()
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
