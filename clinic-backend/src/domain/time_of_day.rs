// src/domain/time_of_day.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 0:00 からの経過分で表す時刻（"HH:MM" 表記）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    /// 予約枠を並べる診療時間帯
    pub const CLINIC_OPEN: Self = Self(9 * 60);
    pub const CLINIC_CLOSE: Self = Self(17 * 60);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < Self::MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// "HH:MM" または "H:MM" をパース
    pub fn parse(value: &str) -> Option<Self> {
        let (hours, minutes) = value.trim().split_once(':')?;
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return None;
        }
        if !hours.chars().all(|c| c.is_ascii_digit()) || !minutes.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let hours: u16 = hours.parse().ok()?;
        let minutes: u16 = minutes.parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }

        Some(Self(hours * 60 + minutes))
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// `open` から `close` の手前まで `step` 分刻みの開始時刻
    pub fn slots_between(open: Self, close: Self, step: u16) -> Vec<Self> {
        if step == 0 {
            return Vec::new();
        }
        (open.0..close.0).step_by(step as usize).map(Self).collect()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid time '{}', expected HH:MM", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(TimeOfDay::parse("00:00").unwrap().minutes(), 0);
        assert_eq!(TimeOfDay::parse("09:30").unwrap().minutes(), 570);
        assert_eq!(TimeOfDay::parse("9:30").unwrap().minutes(), 570);
        assert_eq!(TimeOfDay::parse("23:59").unwrap().minutes(), 1439);
    }

    #[test]
    fn test_parse_invalid_times() {
        assert!(TimeOfDay::parse("24:00").is_none());
        assert!(TimeOfDay::parse("12:60").is_none());
        assert!(TimeOfDay::parse("12:5").is_none());
        assert!(TimeOfDay::parse("noon").is_none());
        assert!(TimeOfDay::parse("-1:30").is_none());
        assert!(TimeOfDay::parse("").is_none());
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(TimeOfDay::parse("9:05").unwrap().to_string(), "09:05");
        assert_eq!(TimeOfDay::from_minutes(1439).unwrap().to_string(), "23:59");
        assert!(TimeOfDay::from_minutes(1440).is_none());
    }

    #[test]
    fn test_slots_between() {
        let slots = TimeOfDay::slots_between(TimeOfDay::CLINIC_OPEN, TimeOfDay::CLINIC_CLOSE, 30);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].to_string(), "09:00");
        assert_eq!(slots[15].to_string(), "16:30");
        assert!(TimeOfDay::slots_between(TimeOfDay::CLINIC_OPEN, TimeOfDay::CLINIC_CLOSE, 0).is_empty());
    }

    #[test]
    fn test_serde() {
        let t: TimeOfDay = serde_json::from_str("\"14:00\"").unwrap();
        assert_eq!(t.minutes(), 840);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"14:00\"");
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
