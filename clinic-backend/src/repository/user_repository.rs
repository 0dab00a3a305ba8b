// src/repository/user_repository.rs

use crate::domain::user_model::{self, ActiveModel as UserActiveModel, Entity as UserEntity};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::{
    Condition, ConnectionTrait, DbConn, DbErr, DeleteResult, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DbConn,
}

/// ユーザー作成用の入力
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub email_verified: bool,
}

/// 部分更新（None は変更しない）
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // --- 基本CRUD操作 ---

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user_model::Model>, DbErr> {
        UserEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user_model::Model>, DbErr> {
        UserEntity::find()
            .filter(user_model::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// 検索・ロール・有効フラグで絞り込んだページ
    pub async fn find_paginated(
        &self,
        filter: &UserFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<user_model::Model>, u64), DbErr> {
        let mut condition = Condition::all();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search = search.trim();
            condition = condition.add(
                Condition::any()
                    .add(user_model::Column::Email.contains(search))
                    .add(user_model::Column::FirstName.contains(search))
                    .add(user_model::Column::LastName.contains(search)),
            );
        }
        if let Some(role) = &filter.role {
            condition = condition.add(user_model::Column::Role.eq(role.as_str()));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(user_model::Column::IsActive.eq(is_active));
        }

        let query = UserEntity::find().filter(condition);
        let total_count = query.clone().count(&self.db).await?;
        let users = query
            .order_by(user_model::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((users, total_count))
    }

    pub async fn create(&self, create_user: CreateUser) -> Result<user_model::Model, DbErr> {
        Self::insert(&self.db, create_user).await
    }

    /// トランザクション内からも呼べる作成処理
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        create_user: CreateUser,
    ) -> Result<user_model::Model, DbErr> {
        let new_user = UserActiveModel {
            email: Set(create_user.email),
            first_name: Set(create_user.first_name),
            last_name: Set(create_user.last_name),
            phone: Set(create_user.phone),
            role: Set(create_user.role),
            password_hash: Set(create_user.password_hash),
            email_verified: Set(create_user.email_verified),
            ..UserActiveModel::new()
        };

        new_user.insert(conn).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        update_user: UpdateUser,
    ) -> Result<Option<user_model::Model>, DbErr> {
        let user = match UserEntity::find_by_id(id).one(&self.db).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let mut active_model: UserActiveModel = user.into();

        if let Some(email) = update_user.email {
            active_model.email = Set(email);
        }
        if let Some(first_name) = update_user.first_name {
            active_model.first_name = Set(first_name);
        }
        if let Some(last_name) = update_user.last_name {
            active_model.last_name = Set(last_name);
        }
        if let Some(phone) = update_user.phone {
            active_model.phone = Set(Some(phone));
        }
        if let Some(role) = update_user.role {
            active_model.role = Set(role);
        }

        if active_model.is_changed() {
            Ok(Some(active_model.update(&self.db).await?))
        } else {
            Ok(Some(active_model.try_into_model()?))
        }
    }

    pub async fn update_password_hash<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        UserEntity::update_many()
            .col_expr(
                user_model::Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .col_expr(
                user_model::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(user_model::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<user_model::Model>, DbErr> {
        let Some(user) = UserEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active_model: UserActiveModel = user.into();
        active_model.is_active = Set(is_active);
        Ok(Some(active_model.update(&self.db).await?))
    }

    pub async fn update_last_login(&self, id: Uuid) -> Result<(), DbErr> {
        UserEntity::update_many()
            .col_expr(
                user_model::Column::LastLoginAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(user_model::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResult, DbErr> {
        UserEntity::delete_by_id(id).exec(&self.db).await
    }

    // --- 集計 ---

    pub async fn count_by_role(&self, role: &str) -> Result<u64, DbErr> {
        UserEntity::find()
            .filter(user_model::Column::Role.eq(role))
            .count(&self.db)
            .await
    }
}
