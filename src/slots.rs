use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label used to close the last block of a day.
pub const LAST_SLOT_LABEL: &str = "last_hour";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    UnknownLabel(String),
    InvalidTime(String),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::UnknownLabel(label) => write!(f, "unknown slot label '{label}'"),
            SlotError::InvalidTime(label) => {
                write!(f, "invalid slot time '{label}' (expected HH:MM)")
            }
        }
    }
}

impl std::error::Error for SlotError {}

/// Maps the start label of a grid slot to the real end of the class that
/// finishes right before it.
///
/// The timetable grid is laid out in nominal half-hour columns, but classes
/// stop a few minutes early to leave a break; the table encodes that gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    end_times: BTreeMap<String, NaiveTime>,
}

impl Default for SlotTable {
    fn default() -> Self {
        let entries = [
            ("08:30", (8, 30)),
            ("09:00", (8, 55)),
            ("10:15", (9, 55)),
            ("11:45", (11, 45)),
            ("12:15", (12, 10)),
            ("13:15", (13, 10)),
            ("13:45", (13, 45)),
            ("14:15", (14, 10)),
            ("14:45", (14, 45)),
            ("15:15", (15, 10)),
            ("16:20", (16, 10)),
            ("16:50", (16, 45)),
            ("17:20", (17, 15)),
            ("17:50", (17, 45)),
            (LAST_SLOT_LABEL, (18, 15)),
        ];
        let end_times = entries
            .into_iter()
            .filter_map(|(label, (h, m))| {
                NaiveTime::from_hms_opt(h, m, 0).map(|time| (label.to_string(), time))
            })
            .collect();
        Self { end_times }
    }
}

impl SlotTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, NaiveTime)>,
        S: Into<String>,
    {
        Self {
            end_times: entries
                .into_iter()
                .map(|(label, time)| (label.into(), time))
                .collect(),
        }
    }

    pub fn end_time_for(&self, label: &str) -> Result<NaiveTime, SlotError> {
        self.end_times
            .get(label.trim())
            .copied()
            .ok_or_else(|| SlotError::UnknownLabel(label.to_string()))
    }

    /// End of the last block of a day.
    pub fn last_slot_end(&self) -> Result<NaiveTime, SlotError> {
        self.end_time_for(LAST_SLOT_LABEL)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.end_times.contains_key(label.trim())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.end_times.keys().map(String::as_str)
    }
}

pub fn parse_start_time(label: &str) -> Result<NaiveTime, SlotError> {
    NaiveTime::parse_from_str(label.trim(), "%H:%M")
        .map_err(|_| SlotError::InvalidTime(label.to_string()))
}
