//! Schedule definitions — the core data model for recurring reminders.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{DaybellError, Result};

/// All seven weekdays, 0 = Monday .. 6 = Sunday.
pub const ALL_DAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

/// Short weekday labels indexed 0 = Monday .. 6 = Sunday.
pub const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn all_days() -> Vec<u8> {
    ALL_DAYS.to_vec()
}

fn bool_true() -> bool {
    true
}

/// One recurring reminder.
///
/// The serialized shape is the on-disk record: legacy files may omit
/// `days`, `active` or `last_fired_date`, which default to every day,
/// enabled, and never-fired. Identity is positional in the owning
/// collection; there is no id field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Display title, non-empty.
    pub title: String,
    /// Target wall-clock time, "HH:MM" or "HH:MM:SS".
    pub time_str: String,
    /// Active weekdays, 0 = Monday .. 6 = Sunday. Non-empty.
    #[serde(default = "all_days")]
    pub days: Vec<u8>,
    /// Disabled schedules are never evaluated.
    #[serde(default = "bool_true")]
    pub active: bool,
    /// Last calendar date this reminder fired (the per-day dedup gate).
    /// Serialized as "YYYY-MM-DD", empty string when never fired.
    #[serde(default, with = "date_string")]
    pub last_fired_date: Option<NaiveDate>,
}

impl Schedule {
    /// Build a validated schedule. Weekdays are deduped and sorted.
    pub fn new(title: &str, time_str: &str, days: &[u8]) -> Result<Self> {
        let mut days = days.to_vec();
        days.sort_unstable();
        days.dedup();
        let schedule = Self {
            title: title.trim().to_string(),
            time_str: time_str.trim().to_string(),
            days,
            active: true,
            last_fired_date: None,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Check the creation preconditions: non-empty title, well-formed
    /// time string, non-empty in-range weekday set.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DaybellError::Validation("title must not be empty".into()));
        }
        parse_time_str(&self.time_str)?;
        if self.days.is_empty() {
            return Err(DaybellError::Validation(
                "at least one weekday is required".into(),
            ));
        }
        if let Some(bad) = self.days.iter().find(|d| **d > 6) {
            return Err(DaybellError::Validation(format!(
                "weekday out of range: {bad} (expected 0=Mon .. 6=Sun)"
            )));
        }
        Ok(())
    }

    /// Parsed target time-of-day.
    pub fn time_of_day(&self) -> Result<NaiveTime> {
        parse_time_str(&self.time_str)
    }

    /// Whether this schedule is eligible on the given weekday.
    pub fn is_active_on(&self, weekday: Weekday) -> bool {
        self.days.contains(&(weekday.num_days_from_monday() as u8))
    }

    /// Human-readable weekday list ("Mon,Tue,Fri").
    pub fn days_label(&self) -> String {
        let mut days = self.days.clone();
        days.sort_unstable();
        days.iter()
            .map(|d| DAY_NAMES.get(*d as usize).copied().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parse "HH:MM" or "HH:MM:SS" with seconds defaulting to 0.
///
/// The single authority on the time-string format: creation validation
/// and the eligibility engine both go through here, so a malformed time
/// is rejected before it can ever reach an evaluation.
pub fn parse_time_str(time_str: &str) -> Result<NaiveTime> {
    let bad = || {
        DaybellError::Validation(format!(
            "time must be HH:MM or HH:MM:SS, got '{time_str}'"
        ))
    };
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(bad());
    }
    let hh: u32 = parts[0].parse().map_err(|_| bad())?;
    let mm: u32 = parts[1].parse().map_err(|_| bad())?;
    let ss: u32 = if parts.len() == 3 {
        parts[2].parse().map_err(|_| bad())?
    } else {
        0
    };
    NaiveTime::from_hms_opt(hh, mm, ss).ok_or_else(bad)
}

/// Serde helper keeping the record shape: `Option<NaiveDate>` as a
/// "YYYY-MM-DD" string, with "" meaning never fired. A malformed stored
/// date means the dedup state is unusable, so it reads as never fired.
mod date_string {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FMT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FMT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(NaiveDate::parse_from_str(&raw, FMT).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_valid() {
        assert_eq!(
            parse_time_str("09:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_str("23:59:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_parse_time_rejects_out_of_range() {
        assert!(parse_time_str("25:61").is_err());
        assert!(parse_time_str("12:60").is_err());
        assert!(parse_time_str("12:00:60").is_err());
        assert!(parse_time_str("12").is_err());
        assert!(parse_time_str("a:b").is_err());
        assert!(parse_time_str("").is_err());
    }

    #[test]
    fn test_new_validates() {
        assert!(Schedule::new("standup", "09:00", &[0, 1, 2, 3, 4]).is_ok());
        assert!(Schedule::new("", "09:00", &[0]).is_err());
        assert!(Schedule::new("x", "25:61", &[0]).is_err());
        assert!(Schedule::new("x", "09:00", &[]).is_err());
        assert!(Schedule::new("x", "09:00", &[7]).is_err());
    }

    #[test]
    fn test_new_dedupes_days() {
        let s = Schedule::new("x", "09:00", &[3, 0, 3, 1]).unwrap();
        assert_eq!(s.days, vec![0, 1, 3]);
    }

    #[test]
    fn test_is_active_on() {
        let s = Schedule::new("x", "09:00", &[0]).unwrap();
        assert!(s.is_active_on(Weekday::Mon));
        assert!(!s.is_active_on(Weekday::Tue));
        assert!(!s.is_active_on(Weekday::Sun));
    }

    #[test]
    fn test_legacy_record_defaults() {
        // Old files carry only title + time_str.
        let s: Schedule =
            serde_json::from_str(r#"{"title":"gym","time_str":"18:30"}"#).unwrap();
        assert_eq!(s.days, ALL_DAYS.to_vec());
        assert!(s.active);
        assert_eq!(s.last_fired_date, None);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut s = Schedule::new("standup", "09:00", &[0, 4]).unwrap();
        s.active = false;
        s.last_fired_date = NaiveDate::from_ymd_opt(2024, 6, 3);
        let json = serde_json::to_string(&s).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_never_fired_serializes_as_empty_string() {
        let s = Schedule::new("x", "09:00", &[0]).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains(r#""last_fired_date":"""#));
    }

    #[test]
    fn test_malformed_stored_date_reads_as_never_fired() {
        let s: Schedule = serde_json::from_str(
            r#"{"title":"x","time_str":"09:00","last_fired_date":"not-a-date"}"#,
        )
        .unwrap();
        assert_eq!(s.last_fired_date, None);
    }

    #[test]
    fn test_days_label() {
        let s = Schedule::new("x", "09:00", &[4, 0, 1]).unwrap();
        assert_eq!(s.days_label(), "Mon,Tue,Fri");
    }

    #[test]
    fn test_days_label_tolerates_out_of_range_day() {
        // Deserialization does not validate; rendering must not panic
        // even if an unvalidated record leaks through.
        let s: Schedule =
            serde_json::from_str(r#"{"title":"x","time_str":"09:00","days":[9]}"#).unwrap();
        assert_eq!(s.days_label(), "?");
    }
}
