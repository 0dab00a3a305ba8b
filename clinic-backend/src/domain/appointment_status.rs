// src/domain/appointment_status.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// 予約の状態を表すenum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Scheduled,
    Completed,
    Cancelled,
    Rebooked,
}

impl AppointmentStatus {
    /// 文字列からAppointmentStatusに変換
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "rebooked" => Some(Self::Rebooked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rebooked => "rebooked",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Scheduled,
            Self::Completed,
            Self::Cancelled,
            Self::Rebooked,
        ]
    }

    /// 終端状態（これ以上遷移しない）
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// 枠を占有している状態か（重複予約の判定に使う）
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// 有効なステータス遷移かチェック
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        match (self, new_status) {
            // 同じステータスは常に有効（何もしない）
            (current, new) if current == &new => true,

            (Self::Pending, Self::Scheduled | Self::Cancelled) => true,

            (Self::Scheduled, Self::Completed | Self::Cancelled | Self::Rebooked) => true,

            // 振替後は再確定か取り消しのみ
            (Self::Rebooked, Self::Scheduled | Self::Cancelled) => true,

            _ => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s).ok_or_else(|| {
            format!(
                "Invalid appointment status: '{}'. Valid statuses are: {}",
                s,
                Self::all()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl TryFrom<&str> for AppointmentStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
