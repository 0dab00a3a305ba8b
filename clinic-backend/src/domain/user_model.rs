// src/domain/user_model.rs

use super::account::{AccountKind, AuthClaims, Role};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    /// patient | doctor | staff
    pub role: String,

    #[serde(skip_serializing)] // パスワードハッシュは絶対にシリアライズしない
    pub password_hash: String,

    pub is_active: bool,

    pub email_verified: bool,

    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// 予約・カルテ・請求からは belongs_to で参照する
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            is_active: Set(true),
            email_verified: Set(false),
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
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn normalized_role(&self) -> Role {
        Role::normalize(AccountKind::User, &self.role)
    }

    pub fn to_auth_claims(&self) -> AuthClaims {
        AuthClaims {
            account_id: self.id,
            account_kind: AccountKind::User,
            email: self.email.clone(),
            display_name: self.full_name(),
            role: self.normalized_role(),
        }
    }
}

/// パスワードハッシュを除いたユーザー情報
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafeUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Model> for SafeUser {
    fn from(user: Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            email: "taro@example.com".to_string(),
            first_name: "Taro".to_string(),
            last_name: "Suzuki".to_string(),
            phone: None,
            role: role.to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            email_verified: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_auth_claims_from_user() {
        let model = user("doctor");
        let claims = model.to_auth_claims();
        assert_eq!(claims.account_id, model.id);
        assert_eq!(claims.account_kind, AccountKind::User);
        assert_eq!(claims.display_name, "Taro Suzuki");
        assert_eq!(claims.role, Role::Doctor);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user("patient")).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
