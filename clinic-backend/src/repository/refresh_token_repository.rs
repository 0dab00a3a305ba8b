// src/repository/refresh_token_repository.rs

use crate::domain::refresh_token_model::{
    self, ActiveModel as RefreshTokenActiveModel, CreateRefreshToken, Entity as RefreshTokenEntity,
};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, ConnectionTrait, DbConn, DbErr, QueryFilter};
use uuid::Uuid;

pub struct RefreshTokenRepository {
    db: DbConn,
}

impl RefreshTokenRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<refresh_token_model::Model>, DbErr> {
        RefreshTokenEntity::find()
            .filter(refresh_token_model::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
    }

    pub async fn create(
        &self,
        create_token: CreateRefreshToken,
    ) -> Result<refresh_token_model::Model, DbErr> {
        let token: RefreshTokenActiveModel = create_token.into();
        token.insert(&self.db).await
    }

    /// 未失効のトークンだけを失効させ、失効させたかどうかを返す
    ///
    /// 同じトークンでの同時リフレッシュは片方だけが true を受け取る。
    pub async fn revoke_if_active(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token_model::Column::IsRevoked, Expr::value(true))
            .col_expr(refresh_token_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(
                Condition::all()
                    .add(refresh_token_model::Column::Id.eq(id))
                    .add(refresh_token_model::Column::IsRevoked.eq(false)),
            )
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn revoke_by_token_hash(&self, token_hash: &str) -> Result<u64, DbErr> {
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token_model::Column::IsRevoked, Expr::value(true))
            .col_expr(refresh_token_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(refresh_token_model::Column::TokenHash.eq(token_hash))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// アカウントの全リフレッシュトークンを失効
    pub async fn revoke_all_for_account<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        account_kind: &str,
    ) -> Result<u64, DbErr> {
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token_model::Column::IsRevoked, Expr::value(true))
            .col_expr(refresh_token_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(
                Condition::all()
                    .add(refresh_token_model::Column::AccountId.eq(account_id))
                    .add(refresh_token_model::Column::AccountKind.eq(account_kind))
                    .add(refresh_token_model::Column::IsRevoked.eq(false)),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// 期限切れトークンを削除
    pub async fn delete_expired(&self) -> Result<u64, DbErr> {
        let result = RefreshTokenEntity::delete_many()
            .filter(refresh_token_model::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
