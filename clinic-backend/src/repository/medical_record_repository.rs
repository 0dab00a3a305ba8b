// src/repository/medical_record_repository.rs

use crate::domain::medical_record_model::{
    self, ActiveModel as MedicalRecordActiveModel, Entity as MedicalRecordEntity,
};
use chrono::NaiveDate;
use sea_orm::entity::*;
use sea_orm::{
    Condition, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MedicalRecordRepository {
    db: DbConn,
}

#[derive(Debug, Clone, Default)]
pub struct MedicalRecordFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl MedicalRecordFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(patient_id) = self.patient_id {
            condition = condition.add(medical_record_model::Column::PatientId.eq(patient_id));
        }
        if let Some(doctor_id) = self.doctor_id {
            condition = condition.add(medical_record_model::Column::DoctorId.eq(doctor_id));
        }
        if let Some(appointment_id) = self.appointment_id {
            condition =
                condition.add(medical_record_model::Column::AppointmentId.eq(appointment_id));
        }
        if let Some(from) = self.date_from {
            condition = condition.add(medical_record_model::Column::RecordDate.gte(from));
        }
        if let Some(to) = self.date_to {
            condition = condition.add(medical_record_model::Column::RecordDate.lte(to));
        }
        condition
    }
}

impl MedicalRecordRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<medical_record_model::Model>, DbErr> {
        MedicalRecordEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_paginated(
        &self,
        filter: &MedicalRecordFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<medical_record_model::Model>, u64), DbErr> {
        let query = MedicalRecordEntity::find().filter(filter.condition());
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(medical_record_model::Column::RecordDate, Order::Desc)
            .order_by(medical_record_model::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    pub async fn create(
        &self,
        record: MedicalRecordActiveModel,
    ) -> Result<medical_record_model::Model, DbErr> {
        record.insert(&self.db).await
    }

    pub async fn update(
        &self,
        record: MedicalRecordActiveModel,
    ) -> Result<medical_record_model::Model, DbErr> {
        record.update(&self.db).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        MedicalRecordEntity::delete_by_id(id).exec(&self.db).await
    }

    pub async fn count(&self, filter: &MedicalRecordFilter) -> Result<u64, DbErr> {
        MedicalRecordEntity::find()
            .filter(filter.condition())
            .count(&self.db)
            .await
    }
}
