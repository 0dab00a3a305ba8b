// src/domain/refresh_token_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

/// account_id は users / admins のどちらかを指すため外部キーは持たない
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub account_id: Uuid,

    /// user | admin
    pub account_kind: String,

    #[serde(skip_serializing)] // トークンハッシュは絶対にシリアライズしない
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,

    pub is_revoked: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            is_revoked: Set(false),
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
    pub fn is_usable(&self) -> bool {
        !self.is_revoked && self.expires_at > Utc::now()
    }
}

/// リフレッシュトークンの作成用構造体
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub account_id: Uuid,
    pub account_kind: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl From<CreateRefreshToken> for ActiveModel {
    fn from(create_token: CreateRefreshToken) -> Self {
        Self {
            account_id: Set(create_token.account_id),
            account_kind: Set(create_token.account_kind),
            token_hash: Set(create_token.token_hash),
            expires_at: Set(create_token.expires_at),
            ..Self::new()
        }
    }
}
