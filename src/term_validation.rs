use crate::calendar::TermConfig;
use crate::ics;
use crate::rotation::calendar_week;
use crate::slots::LAST_SLOT_LABEL;
use chrono::{Datelike, TimeDelta, Weekday};
use std::fmt;

/// Two academic years.
pub const MAX_TERM_WEEKS: u32 = 104;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConfigError {
    message: String,
}

impl TermConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TermConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TermConfigError {}

pub fn validate_term_config(config: &TermConfig) -> Result<(), TermConfigError> {
    if config.start_date.weekday() != Weekday::Mon {
        return Err(TermConfigError::new(format!(
            "term start date {} is a {}, expected a Monday",
            config.start_date,
            config.start_date.weekday()
        )));
    }

    if config.term_weeks == 0 {
        return Err(TermConfigError::new("term must last at least one week"));
    }

    if !(1..=7).contains(&config.days_per_week) {
        return Err(TermConfigError::new(format!(
            "days_per_week must be between 1 and 7 (got {})",
            config.days_per_week
        )));
    }

    if config
        .vacation_starts
        .windows(2)
        .any(|pair| pair[0] >= pair[1])
    {
        return Err(TermConfigError::new(format!(
            "vacation starts must be strictly increasing (got {:?})",
            config.vacation_starts
        )));
    }

    if config.term_weeks > MAX_TERM_WEEKS {
        return Err(TermConfigError::new(format!(
            "term lasts {} weeks, at most {MAX_TERM_WEEKS} are supported",
            config.term_weeks
        )));
    }

    let last_week = calendar_week(config.term_weeks - 1, &config.vacation_starts);
    let term_end = TimeDelta::try_weeks(i64::from(last_week) + 1)
        .and_then(|span| config.start_date.checked_add_signed(span));
    if term_end.is_none() {
        return Err(TermConfigError::new(format!(
            "term starting {} runs past the last supported date",
            config.start_date
        )));
    }

    if !ics::is_known_timezone(&config.timezone) {
        return Err(TermConfigError::new(format!(
            "unsupported timezone '{}'",
            config.timezone
        )));
    }

    if !config.slot_table.contains(LAST_SLOT_LABEL) {
        return Err(TermConfigError::new(format!(
            "slot table has no '{LAST_SLOT_LABEL}' entry"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::SlotTable;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_term_config(&TermConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_each_broken_field() {
        let broken = [
            TermConfig {
                start_date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
                ..TermConfig::default()
            },
            TermConfig {
                term_weeks: 0,
                ..TermConfig::default()
            },
            TermConfig {
                days_per_week: 8,
                ..TermConfig::default()
            },
            TermConfig {
                vacation_starts: vec![14, 5],
                ..TermConfig::default()
            },
            TermConfig {
                timezone: "Mars/Olympus".into(),
                ..TermConfig::default()
            },
            TermConfig {
                slot_table: SlotTable::new([("09:00", NaiveTime::from_hms_opt(8, 55, 0).unwrap())]),
                ..TermConfig::default()
            },
        ];
        for config in broken {
            assert!(validate_term_config(&config).is_err(), "{config:?}");
        }
    }

    #[test]
    fn term_must_fit_in_the_date_range() {
        let mut start = NaiveDate::MAX - TimeDelta::days(10);
        while start.weekday() != Weekday::Mon {
            start = start.pred_opt().unwrap();
        }
        let config = TermConfig {
            start_date: start,
            term_weeks: 3,
            vacation_starts: Vec::new(),
            ..TermConfig::default()
        };
        let err = validate_term_config(&config).unwrap_err();
        assert!(err.to_string().contains("last supported date"), "{err}");

        let too_long = TermConfig {
            term_weeks: MAX_TERM_WEEKS + 1,
            ..TermConfig::default()
        };
        assert!(validate_term_config(&too_long).is_err());
    }
}
