// src/domain/account.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// アカウントの保存先モデル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Admin,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Invalid account kind: '{}'", other)),
        }
    }
}

/// 正規化済みロール
///
/// User と Admin の二つのモデルのロール文字列を、認可判定で使う四種類にまとめる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Staff,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Staff => "staff",
            Self::Patient => "patient",
        }
    }

    /// アカウント種別と保存されているロール文字列から正規化する
    ///
    /// Admin モデルは常に admin（superadmin を含む）。User モデルで未知の値は patient 扱い。
    pub fn normalize(kind: AccountKind, raw: &str) -> Self {
        match kind {
            AccountKind::Admin => Self::Admin,
            AccountKind::User => match raw.to_lowercase().as_str() {
                "doctor" => Self::Doctor,
                "staff" => Self::Staff,
                _ => Self::Patient,
            },
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// 診療業務（予約・カルテ・請求）を扱えるロールか
    pub fn is_clinic_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Doctor | Self::Staff)
    }

    pub fn is_patient(&self) -> bool {
        matches!(self, Self::Patient)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User 用に保存できるロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Doctor,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Staff => "staff",
        }
    }
}

/// トークンとミドルウェアで共有するアカウント情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub account_id: Uuid,
    pub account_kind: AccountKind,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl AuthClaims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_clinic_staff(&self) -> bool {
        self.role.is_clinic_staff()
    }

    /// 患者本人のリソースかどうか
    pub fn is_self(&self, account_id: Uuid) -> bool {
        self.account_kind == AccountKind::User && self.account_id == account_id
    }
}
