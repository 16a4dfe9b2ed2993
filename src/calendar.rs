use crate::rotation::{StaticGroup, WeekCursor, calendar_week};
use crate::slots::SlotTable;
use crate::term_validation::{self, TermConfigError};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Term parameters. `Default` gives the 2024-2025 first term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Monday of calendar week 0.
    pub start_date: NaiveDate,
    pub term_weeks: u32,
    /// Calendar week indices at which a two-week vacation starts.
    pub vacation_starts: Vec<u32>,
    pub days_per_week: u32,
    /// IANA name written as `TZID` on every event.
    pub timezone: String,
    pub slot_table: SlotTable,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 9, 16).unwrap_or_default(),
            term_weeks: 16,
            vacation_starts: vec![
                5,  // Toussaint
                14, // Noël
            ],
            days_per_week: 6,
            timezone: "Europe/Paris".to_string(),
            slot_table: SlotTable::default(),
        }
    }
}

impl TermConfig {
    pub fn validate(&self) -> Result<(), TermConfigError> {
        term_validation::validate_term_config(self)
    }
}

/// Date arithmetic over the teaching weeks of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCalendar {
    config: TermConfig,
    teaching_days: BTreeSet<NaiveDate>,
}

impl Default for TermCalendar {
    fn default() -> Self {
        let config = TermConfig::default();
        let teaching_days = Self::collect_teaching_days(&config);
        Self {
            config,
            teaching_days,
        }
    }
}

impl TermCalendar {
    pub fn from_config(config: &TermConfig) -> Result<Self, TermConfigError> {
        config.validate()?;
        Ok(Self {
            teaching_days: Self::collect_teaching_days(config),
            config: config.clone(),
        })
    }

    pub fn to_config(&self) -> TermConfig {
        self.config.clone()
    }

    fn collect_teaching_days(config: &TermConfig) -> BTreeSet<NaiveDate> {
        let mut days = BTreeSet::new();
        for nominal in 0..config.term_weeks {
            let week = calendar_week(nominal, &config.vacation_starts);
            let monday = config.start_date + Duration::weeks(i64::from(week));
            for day in 0..config.days_per_week {
                days.insert(monday + Duration::days(i64::from(day)));
            }
        }
        days
    }

    pub fn start_date(&self) -> NaiveDate {
        self.config.start_date
    }

    pub fn term_weeks(&self) -> u32 {
        self.config.term_weeks
    }

    pub fn vacation_starts(&self) -> &[u32] {
        &self.config.vacation_starts
    }

    pub fn days_per_week(&self) -> usize {
        self.config.days_per_week as usize
    }

    pub fn timezone(&self) -> &str {
        &self.config.timezone
    }

    pub fn slot_table(&self) -> &SlotTable {
        &self.config.slot_table
    }

    /// Monday of nominal teaching week `nominal`, vacations skipped.
    pub fn week_start(&self, nominal: u32) -> NaiveDate {
        let week = calendar_week(nominal, &self.config.vacation_starts);
        self.config.start_date + Duration::weeks(i64::from(week))
    }

    /// Teaching weeks of the term as seen by `group`.
    pub fn weeks(&self, group: StaticGroup) -> WeekCursor {
        WeekCursor::new(group, self.config.term_weeks, &self.config.vacation_starts)
    }

    pub fn is_teaching_day(&self, date: NaiveDate) -> bool {
        self.teaching_days.contains(&date)
    }

    pub fn teaching_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.teaching_days.iter().copied()
    }

    /// Last teaching day of the term.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.teaching_days.last().copied()
    }

    /// Resolves a day/month label to a date of the academic year.
    ///
    /// Months before the start month belong to the following calendar year.
    pub fn academic_date(&self, day: u32, month: u32) -> Option<NaiveDate> {
        let start = self.config.start_date;
        let year = if month < start.month() {
            start.year() + 1
        } else {
            start.year()
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_term_skips_both_vacations() {
        let cal = TermCalendar::default();
        assert_eq!(cal.week_start(0), d(2024, 9, 16));
        assert_eq!(cal.week_start(4), d(2024, 10, 14));
        // Toussaint: 21/10 and 28/10 are skipped
        assert_eq!(cal.week_start(5), d(2024, 11, 4));
        assert_eq!(cal.week_start(15), d(2025, 1, 27));
        assert!(!cal.is_teaching_day(d(2024, 10, 21)));
        assert!(cal.is_teaching_day(d(2024, 11, 9)));
        assert!(!cal.is_teaching_day(d(2024, 11, 10)));
        assert_eq!(cal.end_date(), Some(d(2025, 2, 1)));
        assert_eq!(cal.end_date().unwrap().weekday(), Weekday::Sat);
    }

    #[test]
    fn academic_date_rolls_into_next_year() {
        let cal = TermCalendar::default();
        assert_eq!(cal.academic_date(16, 9), Some(d(2024, 9, 16)));
        assert_eq!(cal.academic_date(6, 1), Some(d(2025, 1, 6)));
        assert_eq!(cal.academic_date(31, 2), None);
    }

    #[test]
    fn config_round_trips_through_json_with_defaults() {
        let json = r#"{"start_date":"2025-09-15","term_weeks":4,"vacation_starts":[2]}"#;
        let config: TermConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.days_per_week, 6);
        assert_eq!(config.timezone, "Europe/Paris");

        let cal = TermCalendar::from_config(&config).unwrap();
        assert_eq!(cal.week_start(2), d(2025, 10, 13));
        assert_eq!(cal.teaching_days().count(), 24);
        assert_eq!(cal.to_config(), config);
    }

    #[test]
    fn term_near_the_end_of_time_is_an_error() {
        let mut start = NaiveDate::MAX - Duration::days(10);
        while start.weekday() != Weekday::Mon {
            start = start.pred_opt().unwrap();
        }
        let config = TermConfig {
            start_date: start,
            term_weeks: 3,
            vacation_starts: Vec::new(),
            ..TermConfig::default()
        };
        assert!(TermCalendar::from_config(&config).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TermConfig {
            start_date: d(2024, 9, 17),
            ..TermConfig::default()
        };
        assert!(TermCalendar::from_config(&config).is_err());
    }
}
