use crate::calendar::TermCalendar;
use crate::rotation::GroupParseError;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// First roster column holding a week.
pub const FIRST_WEEK_COLUMN: usize = 3;

/// Joins the groups sharing a colle slot, e.g. `3+7`.
pub const GROUP_SEPARATOR: char = '+';

const DAY_ABBREVIATIONS: [(&str, i64); 5] = [("Lu", 0), ("Ma", 1), ("Me", 2), ("Je", 3), ("Ve", 4)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// An examiner row appeared before any subject row.
    MissingSubject { line: usize },
    MalformedSchedule { line: usize, cell: String },
    InvalidTimeRange { line: usize, cell: String },
    InvalidGroup { line: usize, cell: String },
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::MissingSubject { line } => {
                write!(f, "roster line {line}: examiner row before any subject row")
            }
            RosterError::MalformedSchedule { line, cell } => write!(
                f,
                "roster line {line}: schedule '{cell}' is not '<day> <start>-<end>'"
            ),
            RosterError::InvalidTimeRange { line, cell } => {
                write!(f, "roster line {line}: invalid time range '{cell}'")
            }
            RosterError::InvalidGroup { line, cell } => {
                write!(f, "roster line {line}: invalid group list '{cell}'")
            }
        }
    }
}

impl std::error::Error for RosterError {}

/// Numeric colle group of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColleGroup(u8);

impl ColleGroup {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 18;

    pub fn new(id: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&id).then_some(Self(id))
    }

    pub fn id(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ColleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ColleGroup {
    type Err = GroupParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(ColleGroup::new)
            .ok_or_else(|| GroupParseError::from_input(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColleEntry {
    pub subject: String,
    pub examiner: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub room: String,
}

/// The raw colle table: week labels in the header, one row per examiner slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Roster {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn week_labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.header
            .iter()
            .enumerate()
            .skip(FIRST_WEEK_COLUMN)
            .map(|(idx, label)| (idx, label.trim()))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Every colle of `group`, in roster order.
    pub fn resolve(
        &self,
        group: ColleGroup,
        calendar: &TermCalendar,
    ) -> Result<Vec<ColleEntry>, RosterError> {
        let weeks: Vec<(usize, NaiveDate)> = self
            .week_labels()
            .filter_map(|(idx, label)| match parse_week_label(label, calendar) {
                Some(date) => Some((idx, date)),
                None => {
                    debug!(column = idx, label, "skipping roster column without a date");
                    None
                }
            })
            .collect();

        let mut current_subject: Option<&str> = None;
        let mut entries = Vec::new();

        for (row_idx, row) in self.rows.iter().enumerate() {
            // header is line 1
            let line = row_idx + 2;
            let cell = |idx: usize| field(row, idx);

            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            if cell(1).is_empty() {
                current_subject = Some(field(row, 0));
                continue;
            }
            let subject = current_subject.ok_or(RosterError::MissingSubject { line })?;

            let (day_token, range) = split_schedule(cell(1)).ok_or_else(|| {
                RosterError::MalformedSchedule {
                    line,
                    cell: cell(1).to_string(),
                }
            })?;
            let Some(day_offset) = day_offset(day_token) else {
                debug!(line, day = day_token, "skipping roster row with unknown day");
                continue;
            };
            let (start, end) =
                parse_time_range(range).ok_or_else(|| RosterError::InvalidTimeRange {
                    line,
                    cell: range.to_string(),
                })?;

            for &(column, week_start) in &weeks {
                let groups = parse_groups(cell(column)).map_err(|_| RosterError::InvalidGroup {
                    line,
                    cell: cell(column).to_string(),
                })?;
                if !groups.contains(&group.id()) {
                    continue;
                }
                entries.push(ColleEntry {
                    subject: subject.to_string(),
                    examiner: cell(0).to_string(),
                    date: week_start + Duration::days(day_offset),
                    start,
                    end,
                    room: cell(2).to_string(),
                });
            }
        }

        Ok(entries)
    }
}

fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|c| c.trim()).unwrap_or_default()
}

pub fn day_offset(token: &str) -> Option<i64> {
    DAY_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token.trim())
        .map(|(_, offset)| *offset)
}

fn split_schedule(cell: &str) -> Option<(&str, &str)> {
    let mut parts = cell.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(day), Some(range), None) => Some((day, range)),
        _ => None,
    }
}

/// Parses `12h15-13h15`, `12h-13h` or `12-13`.
pub fn parse_time_range(range: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = range.trim().split_once('-')?;
    let start = parse_hour(start)?;
    let end = parse_hour(end)?;
    (start < end).then_some((start, end))
}

fn parse_hour(token: &str) -> Option<NaiveTime> {
    let token = token.trim();
    let (hours, minutes) = match token.split_once(['h', 'H']) {
        Some((hours, "")) => (hours, "0"),
        Some((hours, minutes)) => (hours, minutes),
        None => (token, "0"),
    };
    let hours = hours.parse::<u32>().ok()?;
    let minutes = minutes.parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Monday of the week a roster column refers to.
///
/// `dd/mm` labels are dates of the academic year; bare integers are nominal
/// teaching weeks, shifted over vacations like the timetable.
pub fn parse_week_label(label: &str, calendar: &TermCalendar) -> Option<NaiveDate> {
    let label = label.trim();
    if let Some((day, month)) = label.split_once('/') {
        let day = day.trim().parse::<u32>().ok()?;
        let month = month.trim().parse::<u32>().ok()?;
        return calendar.academic_date(day, month);
    }
    let nominal = label.parse::<u32>().ok()?;
    (nominal < calendar.term_weeks()).then(|| calendar.week_start(nominal))
}

pub fn parse_groups(cell: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    cell.split(GROUP_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<u8>)
        .collect()
}
