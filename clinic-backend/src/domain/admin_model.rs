// src/domain/admin_model.rs

use super::account::{AccountKind, AuthClaims, Role};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,

    /// admin | superadmin
    pub role: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub is_active: bool,

    pub last_login_at: Option<DateTime<Utc>>,

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
            role: Set("admin".to_string()),
            is_active: Set(true),
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
    pub fn to_auth_claims(&self) -> AuthClaims {
        AuthClaims {
            account_id: self.id,
            account_kind: AccountKind::Admin,
            email: self.email.clone(),
            display_name: self.name.clone(),
            role: Role::normalize(AccountKind::Admin, &self.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superadmin_normalizes_to_admin() {
        let now = Utc::now();
        let admin = Model {
            id: Uuid::new_v4(),
            email: "root@clinic.example.com".to_string(),
            name: "Root".to_string(),
            role: "superadmin".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let claims = admin.to_auth_claims();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.account_kind, AccountKind::Admin);
        assert_eq!(claims.display_name, "Root");
    }
}
