// src/domain/blocked_time_slot_model.rs

use super::time_of_day::TimeOfDay;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocked_time_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    /// "HH:MM"
    pub start_time: String,

    /// "HH:MM"
    pub end_time: String,

    pub reason: Option<String>,

    /// 作成した管理者
    pub created_by: Option<Uuid>,

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
    /// 指定の日時がこの枠に含まれるか（日付・時刻とも両端を含む）
    ///
    /// 時刻が読めない枠は何も塞がない。
    pub fn blocks(&self, date: NaiveDate, time: TimeOfDay) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }

        match (
            TimeOfDay::parse(&self.start_time),
            TimeOfDay::parse(&self.end_time),
        ) {
            (Some(start), Some(end)) => start <= time && time <= end,
            _ => false,
        }
    }

    pub fn reason_or_default(&self) -> &str {
        self.reason.as_deref().unwrap_or("Time slot is unavailable")
    }
}

/// 枠を独立に評価し、最初に一致したものを返す
pub fn find_blocking(slots: &[Model], date: NaiveDate, time: TimeOfDay) -> Option<&Model> {
    slots.iter().find(|slot| slot.blocks(date, time))
}

/// 作成・更新時の範囲チェック
pub fn validate_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
) -> Result<(), String> {
    if end_date < start_date {
        return Err("end_date must not be before start_date".to_string());
    }
    if end_time < start_time {
        return Err("end_time must not be before start_time".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn slot(start: NaiveDate, end: NaiveDate, from: &str, to: &str, reason: &str) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            start_time: from.to_string(),
            end_time: to.to_string(),
            reason: Some(reason.to_string()),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_blocks_inclusive_boundaries() {
        let s = slot(date(2025, 3, 10), date(2025, 3, 12), "12:00", "13:00", "Lunch");

        assert!(s.blocks(date(2025, 3, 10), time("12:00")));
        assert!(s.blocks(date(2025, 3, 12), time("13:00")));
        assert!(s.blocks(date(2025, 3, 11), time("12:30")));

        assert!(!s.blocks(date(2025, 3, 9), time("12:30")));
        assert!(!s.blocks(date(2025, 3, 13), time("12:30")));
        assert!(!s.blocks(date(2025, 3, 11), time("11:59")));
        assert!(!s.blocks(date(2025, 3, 11), time("13:01")));
    }

    #[test]
    fn test_times_compared_as_minutes_not_strings() {
        // 文字列比較だと "9:30" > "12:00" になってしまう
        let s = slot(date(2025, 1, 1), date(2025, 1, 1), "9:00", "10:00", "Meeting");
        assert!(s.blocks(date(2025, 1, 1), time("09:30")));
        assert!(!s.blocks(date(2025, 1, 1), time("12:00")));
    }

    #[test]
    fn test_unparseable_slot_blocks_nothing() {
        let s = slot(date(2025, 1, 1), date(2025, 1, 1), "bad", "10:00", "Broken");
        assert!(!s.blocks(date(2025, 1, 1), time("09:30")));
    }

    #[test]
    fn test_first_match_wins() {
        let slots = vec![
            slot(date(2025, 5, 1), date(2025, 5, 1), "08:00", "09:00", "Early"),
            slot(date(2025, 5, 1), date(2025, 5, 31), "00:00", "23:59", "Closed"),
            slot(date(2025, 5, 1), date(2025, 5, 1), "08:30", "08:45", "Overlap"),
        ];

        let hit = find_blocking(&slots, date(2025, 5, 1), time("08:30")).unwrap();
        assert_eq!(hit.reason_or_default(), "Early");

        let hit = find_blocking(&slots, date(2025, 5, 2), time("08:30")).unwrap();
        assert_eq!(hit.reason_or_default(), "Closed");

        assert!(find_blocking(&slots, date(2025, 6, 1), time("08:30")).is_none());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(date(2025, 1, 1), date(2025, 1, 1), time("10:00"), time("10:00")).is_ok());
        assert!(validate_range(date(2025, 1, 2), date(2025, 1, 1), time("10:00"), time("11:00")).is_err());
        assert!(validate_range(date(2025, 1, 1), date(2025, 1, 2), time("11:00"), time("10:00")).is_err());
    }
}
