//! Work-hours schedule policy.
//!
//! A pure predicate over wall-clock time: breaks are permitted only inside
//! the configured `[start, end)` window on permitted weekdays. Hours are
//! fractional so half-hour boundaries like 8.5 (= 08:30) work. Overnight
//! windows (end before start) are rejected at the configuration boundary and
//! never reach this predicate.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Permitted work window. Weekdays are ISO numbers, 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub start_hour: f64,
    pub end_hour: f64,
    pub weekdays: Vec<u32>,
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            start_hour: 9.0,
            end_hour: 17.0,
            weekdays: vec![1, 2, 3, 4, 5],
        }
    }
}

impl WorkSchedule {
    /// Whether break presentation is permitted at `now`.
    ///
    /// Weekday membership and fractional hour-of-day within the half-open
    /// window: a 9.0..17.0 schedule allows 16:59 and denies 17:00.
    pub fn allows(&self, now: NaiveDateTime) -> bool {
        if !self.weekdays.contains(&now.weekday().number_from_monday()) {
            return false;
        }
        let hour = f64::from(now.hour())
            + f64::from(now.minute()) / 60.0
            + f64::from(now.second()) / 3600.0;
        hour >= self.start_hour && hour < self.end_hour
    }

    /// Reject windows the predicate is not defined over.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=24.0).contains(&self.start_hour) || !(0.0..=24.0).contains(&self.end_hour) {
            return Err(ValidationError::InvalidValue {
                field: "work_hours".into(),
                message: "hours must lie within 0..=24".into(),
            });
        }
        if self.start_hour >= self.end_hour {
            return Err(ValidationError::InvalidValue {
                field: "work_hours".into(),
                message: "end_hour must be after start_hour (overnight windows are not supported)"
                    .into(),
            });
        }
        if self.weekdays.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "work_hours.weekdays".into(),
                message: "at least one weekday is required".into(),
            });
        }
        for &day in &self.weekdays {
            if !(1..=7).contains(&day) {
                return Err(ValidationError::OutOfRange {
                    field: "work_hours.weekdays".into(),
                    value: i64::from(day),
                    min: 1,
                    max: 7,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn weekday_outside_set_denies() {
        let schedule = WorkSchedule::default();
        // 2024-01-13 is a Saturday.
        assert!(!schedule.allows(at(2024, 1, 13, 10, 0)));
    }

    #[test]
    fn window_is_half_open() {
        let schedule = WorkSchedule::default();
        // 2024-01-10 is a Wednesday.
        assert!(schedule.allows(at(2024, 1, 10, 9, 0)));
        assert!(schedule.allows(at(2024, 1, 10, 16, 59)));
        assert!(!schedule.allows(at(2024, 1, 10, 17, 0)));
        assert!(!schedule.allows(at(2024, 1, 10, 8, 59)));
    }

    #[test]
    fn fractional_hours_support_half_hour_boundaries() {
        let schedule = WorkSchedule {
            start_hour: 8.5,
            end_hour: 17.5,
            ..Default::default()
        };
        assert!(!schedule.allows(at(2024, 1, 10, 8, 29)));
        assert!(schedule.allows(at(2024, 1, 10, 8, 30)));
        assert!(schedule.allows(at(2024, 1, 10, 17, 29)));
        assert!(!schedule.allows(at(2024, 1, 10, 17, 30)));
    }

    #[test]
    fn validate_rejects_overnight_window() {
        let schedule = WorkSchedule {
            start_hour: 22.0,
            end_hour: 6.0,
            ..Default::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_weekday() {
        let schedule = WorkSchedule {
            weekdays: vec![1, 8],
            ..Default::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn validate_accepts_default() {
        assert!(WorkSchedule::default().validate().is_ok());
    }
}
