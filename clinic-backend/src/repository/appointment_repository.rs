// src/repository/appointment_repository.rs

use crate::domain::appointment_model::{
    self, ActiveModel as AppointmentActiveModel, Entity as AppointmentEntity,
};
use crate::domain::appointment_status::AppointmentStatus;
use chrono::NaiveDate;
use sea_orm::entity::*;
use sea_orm::{
    Condition, ConnectionTrait, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    db: DbConn,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AppointmentFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(patient_id) = self.patient_id {
            condition = condition.add(appointment_model::Column::PatientId.eq(patient_id));
        }
        if let Some(doctor_id) = self.doctor_id {
            condition = condition.add(appointment_model::Column::DoctorId.eq(doctor_id));
        }
        if let Some(status) = self.status {
            condition = condition.add(appointment_model::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = self.date_from {
            condition = condition.add(appointment_model::Column::AppointmentDate.gte(from));
        }
        if let Some(to) = self.date_to {
            condition = condition.add(appointment_model::Column::AppointmentDate.lte(to));
        }
        condition
    }
}

impl AppointmentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<appointment_model::Model>, DbErr> {
        AppointmentEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_paginated(
        &self,
        filter: &AppointmentFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<appointment_model::Model>, u64), DbErr> {
        let query = AppointmentEntity::find().filter(filter.condition());
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(appointment_model::Column::AppointmentDate, Order::Desc)
            .order_by(appointment_model::Column::AppointmentTime, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    /// 指定日の枠を占有している予約（取消以外）
    pub async fn find_occupying_on(
        &self,
        date: NaiveDate,
        doctor_id: Option<Uuid>,
    ) -> Result<Vec<appointment_model::Model>, DbErr> {
        let mut query = AppointmentEntity::find()
            .filter(appointment_model::Column::AppointmentDate.eq(date))
            .filter(appointment_model::Column::Status.ne(AppointmentStatus::Cancelled.as_str()));
        if let Some(doctor_id) = doctor_id {
            query = query.filter(appointment_model::Column::DoctorId.eq(doctor_id));
        }
        query
            .order_by(appointment_model::Column::AppointmentTime, Order::Asc)
            .all(&self.db)
            .await
    }

    /// 次の予約番号（空なら1）
    pub async fn next_number<C: ConnectionTrait>(conn: &C) -> Result<i64, DbErr> {
        let max: Option<Option<i64>> = AppointmentEntity::find()
            .select_only()
            .column_as(appointment_model::Column::AppointmentNumber.max(), "max_number")
            .into_tuple()
            .one(conn)
            .await?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    /// 同じ医師・日時で枠を占有している別の予約
    pub async fn find_doctor_conflict<C: ConnectionTrait>(
        conn: &C,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<appointment_model::Model>, DbErr> {
        let mut query = AppointmentEntity::find()
            .filter(appointment_model::Column::DoctorId.eq(doctor_id))
            .filter(appointment_model::Column::AppointmentDate.eq(date))
            .filter(appointment_model::Column::AppointmentTime.eq(time))
            .filter(appointment_model::Column::Status.ne(AppointmentStatus::Cancelled.as_str()));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(appointment_model::Column::Id.ne(exclude_id));
        }
        query.one(conn).await
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        appointment: AppointmentActiveModel,
    ) -> Result<appointment_model::Model, DbErr> {
        appointment.insert(conn).await
    }

    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        appointment: AppointmentActiveModel,
    ) -> Result<appointment_model::Model, DbErr> {
        appointment.update(conn).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        AppointmentEntity::delete_by_id(id).exec(&self.db).await
    }

    // --- 集計 ---

    pub async fn count(&self, filter: &AppointmentFilter) -> Result<u64, DbErr> {
        AppointmentEntity::find()
            .filter(filter.condition())
            .count(&self.db)
            .await
    }

    /// 期間内の予約（レポート用に全件）
    pub async fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<appointment_model::Model>, DbErr> {
        AppointmentEntity::find()
            .filter(appointment_model::Column::AppointmentDate.between(from, to))
            .all(&self.db)
            .await
    }

    /// 指定日以降の直近の予約
    pub async fn find_upcoming(
        &self,
        from: NaiveDate,
        patient_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<appointment_model::Model>, DbErr> {
        let mut query = AppointmentEntity::find()
            .filter(appointment_model::Column::AppointmentDate.gte(from))
            .filter(
                appointment_model::Column::Status.is_in([
                    AppointmentStatus::Pending.as_str(),
                    AppointmentStatus::Scheduled.as_str(),
                    AppointmentStatus::Rebooked.as_str(),
                ]),
            );
        if let Some(patient_id) = patient_id {
            query = query.filter(appointment_model::Column::PatientId.eq(patient_id));
        }
        query
            .order_by(appointment_model::Column::AppointmentDate, Order::Asc)
            .order_by(appointment_model::Column::AppointmentTime, Order::Asc)
            .limit(limit)
            .all(&self.db)
            .await
    }
}
