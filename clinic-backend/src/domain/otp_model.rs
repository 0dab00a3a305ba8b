// src/domain/otp_model.rs

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ワンタイムコードの用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub email: String,

    pub purpose: String,

    /// HMAC-SHA256(secret, code) の16進文字列
    #[serde(skip_serializing)]
    pub code_hash: String,

    /// 失敗した検証の回数
    pub attempts: i32,

    pub expires_at: DateTime<Utc>,

    pub verified_at: Option<DateTime<Utc>>,

    pub consumed_at: Option<DateTime<Utc>>,

    /// 同じ宛先・用途で新しいコードが発行されたら立つ
    pub is_invalidated: bool,

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
            attempts: Set(0),
            is_invalidated: Set(false),
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
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// 検証済みかつ未使用で、検証からの猶予内にあるか
    pub fn is_verified_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        match self.verified_at {
            Some(verified_at) => {
                self.consumed_at.is_none() && !self.is_invalidated && verified_at + window > now
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp() -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            email: "patient@example.com".to_string(),
            purpose: OtpPurpose::Registration.to_string(),
            code_hash: "hash".to_string(),
            attempts: 0,
            expires_at: now + Duration::minutes(5),
            verified_at: None,
            consumed_at: None,
            is_invalidated: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let model = otp();
        assert!(!model.is_expired_at(model.expires_at - Duration::seconds(1)));
        assert!(model.is_expired_at(model.expires_at));
    }

    #[test]
    fn test_verified_window() {
        let now = Utc::now();
        let mut model = otp();
        assert!(!model.is_verified_within(Duration::minutes(15), now));

        model.verified_at = Some(now - Duration::minutes(10));
        assert!(model.is_verified_within(Duration::minutes(15), now));

        model.verified_at = Some(now - Duration::minutes(16));
        assert!(!model.is_verified_within(Duration::minutes(15), now));

        model.verified_at = Some(now);
        model.consumed_at = Some(now);
        assert!(!model.is_verified_within(Duration::minutes(15), now));
    }

    #[test]
    fn test_purpose_serialization() {
        assert_eq!(OtpPurpose::PasswordReset.as_str(), "password_reset");
        let parsed: OtpPurpose = serde_json::from_str("\"registration\"").unwrap();
        assert_eq!(parsed, OtpPurpose::Registration);
    }
}
