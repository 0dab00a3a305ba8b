// src/repository/admin_repository.rs

use crate::domain::admin_model::{self, ActiveModel as AdminActiveModel, Entity as AdminEntity};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, DbConn, DbErr, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AdminRepository {
    db: DbConn,
}

#[derive(Debug, Clone)]
pub struct CreateAdmin {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
}

impl AdminRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<admin_model::Model>, DbErr> {
        AdminEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<admin_model::Model>, DbErr> {
        AdminEntity::find()
            .filter(admin_model::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    pub async fn create(&self, create_admin: CreateAdmin) -> Result<admin_model::Model, DbErr> {
        let admin = AdminActiveModel {
            email: Set(create_admin.email),
            name: Set(create_admin.name),
            role: Set(create_admin.role),
            password_hash: Set(create_admin.password_hash),
            ..AdminActiveModel::new()
        };
        admin.insert(&self.db).await
    }

    pub async fn update_password_hash<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        AdminEntity::update_many()
            .col_expr(admin_model::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(admin_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(admin_model::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn update_last_login(&self, id: Uuid) -> Result<(), DbErr> {
        AdminEntity::update_many()
            .col_expr(
                admin_model::Column::LastLoginAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(admin_model::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        AdminEntity::find().count(&self.db).await
    }
}
