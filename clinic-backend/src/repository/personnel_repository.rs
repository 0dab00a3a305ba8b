// src/repository/personnel_repository.rs

use crate::domain::personnel_model::{
    self, ActiveModel as PersonnelActiveModel, Entity as PersonnelEntity,
};
use sea_orm::entity::*;
use sea_orm::{
    Condition, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PersonnelRepository {
    db: DbConn,
}

#[derive(Debug, Clone, Default)]
pub struct PersonnelFilter {
    pub position: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl PersonnelRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<personnel_model::Model>, DbErr> {
        PersonnelEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<personnel_model::Model>, DbErr> {
        PersonnelEntity::find()
            .filter(personnel_model::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    pub async fn find_paginated(
        &self,
        filter: &PersonnelFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<personnel_model::Model>, u64), DbErr> {
        let mut condition = Condition::all();
        if let Some(position) = &filter.position {
            condition = condition.add(personnel_model::Column::Position.eq(position.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(personnel_model::Column::IsActive.eq(is_active));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search = search.trim();
            condition = condition.add(
                Condition::any()
                    .add(personnel_model::Column::FirstName.contains(search))
                    .add(personnel_model::Column::LastName.contains(search))
                    .add(personnel_model::Column::Specialization.contains(search)),
            );
        }

        let query = PersonnelEntity::find().filter(condition);
        let total_count = query.clone().count(&self.db).await?;
        let items = query
            .order_by(personnel_model::Column::LastName, Order::Asc)
            .order_by(personnel_model::Column::FirstName, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((items, total_count))
    }

    pub async fn create(
        &self,
        personnel: PersonnelActiveModel,
    ) -> Result<personnel_model::Model, DbErr> {
        personnel.insert(&self.db).await
    }

    pub async fn update(
        &self,
        personnel: PersonnelActiveModel,
    ) -> Result<personnel_model::Model, DbErr> {
        personnel.update(&self.db).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        PersonnelEntity::delete_by_id(id).exec(&self.db).await
    }

    pub async fn count_active(&self) -> Result<u64, DbErr> {
        PersonnelEntity::find()
            .filter(personnel_model::Column::IsActive.eq(true))
            .count(&self.db)
            .await
    }
}
