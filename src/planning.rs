use crate::slots::{SlotError, SlotTable, parse_start_time};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monday to Saturday.
pub const DAYS_IN_WEEK: usize = 6;

/// Separates the subject from the room inside a timetable cell.
pub const HEADER_SEPARATOR: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    Slot(SlotError),
    MissingSeparator(String),
    ExtraSeparator(String),
    ShortRow { label: String, columns: usize },
    /// A slot label that does not come after the previous one.
    UnorderedSlot { label: String, previous: NaiveTime },
    EmptyBlock { start: NaiveTime, end: NaiveTime },
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::Slot(err) => write!(f, "{err}"),
            PlanningError::MissingSeparator(header) => write!(
                f,
                "cell '{header}' has no '{HEADER_SEPARATOR}' between subject and room"
            ),
            PlanningError::ExtraSeparator(header) => write!(
                f,
                "cell '{header}' has more than one '{HEADER_SEPARATOR}'"
            ),
            PlanningError::ShortRow { label, columns } => write!(
                f,
                "row '{label}' has {columns} columns, expected {}",
                DAYS_IN_WEEK + 1
            ),
            PlanningError::UnorderedSlot { label, previous } => write!(
                f,
                "slot '{label}' does not start after {}",
                previous.format("%H:%M")
            ),
            PlanningError::EmptyBlock { start, end } => write!(
                f,
                "block starting at {} would end at {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            ),
        }
    }
}

impl std::error::Error for PlanningError {}

impl From<SlotError> for PlanningError {
    fn from(value: SlotError) -> Self {
        Self::Slot(value)
    }
}

/// One grid cell of a cohort table, before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlot {
    pub label: String,
    pub header: String,
}

impl RawSlot {
    pub fn new(label: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            header: header.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Empty for a free period.
    pub summary: String,
    pub location: String,
}

impl LessonBlock {
    pub fn from_header(
        start: NaiveTime,
        end: NaiveTime,
        header: &str,
    ) -> Result<Self, PlanningError> {
        if end <= start {
            return Err(PlanningError::EmptyBlock { start, end });
        }
        if header.trim().is_empty() {
            return Ok(Self {
                start,
                end,
                summary: String::new(),
                location: String::new(),
            });
        }
        let (summary, location) = header
            .split_once(HEADER_SEPARATOR)
            .ok_or_else(|| PlanningError::MissingSeparator(header.to_string()))?;
        if location.contains(HEADER_SEPARATOR) {
            return Err(PlanningError::ExtraSeparator(header.to_string()));
        }
        Ok(Self {
            start,
            end,
            summary: summary.trim().to_string(),
            location: location.trim().to_string(),
        })
    }

    pub fn is_free(&self) -> bool {
        self.summary.is_empty() && self.location.is_empty()
    }
}

pub type DayPlanning = Vec<LessonBlock>;

/// Collapses a day's consecutive identical cells into lesson blocks.
///
/// A block ends at the end time the slot table gives for the label of the
/// slot that replaces it; the last block of the day ends at the sentinel time.
/// Cells are compared trimmed, and slot labels must be strictly increasing.
pub fn merge_day(slots: &[RawSlot], table: &SlotTable) -> Result<DayPlanning, PlanningError> {
    let Some((first, rest)) = slots.split_first() else {
        return Ok(Vec::new());
    };

    let mut blocks = Vec::new();
    let mut pending_start = parse_start_time(&first.label)?;
    let mut pending_header = first.header.trim();
    let mut previous = pending_start;

    for slot in rest {
        let header = slot.header.trim();
        if header == pending_header {
            previous = ordered_start(&slot.label, previous)?;
            continue;
        }
        let end = table.end_time_for(&slot.label)?;
        let start = ordered_start(&slot.label, previous)?;
        blocks.push(LessonBlock::from_header(pending_start, end, pending_header)?);
        pending_start = start;
        pending_header = header;
        previous = start;
    }

    blocks.push(LessonBlock::from_header(
        pending_start,
        table.last_slot_end()?,
        pending_header,
    )?);
    Ok(blocks)
}

fn ordered_start(label: &str, previous: NaiveTime) -> Result<NaiveTime, PlanningError> {
    let start = parse_start_time(label)?;
    if start <= previous {
        return Err(PlanningError::UnorderedSlot {
            label: label.trim().to_string(),
            previous,
        });
    }
    Ok(start)
}

/// The weekly timetable of one rotating cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlanning {
    days: Vec<DayPlanning>,
}

impl GroupPlanning {
    /// Builds the planning from table rows: `[label, monday, ..., saturday]`.
    pub fn from_rows<R, S>(rows: R, table: &SlotTable) -> Result<Self, PlanningError>
    where
        R: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let mut raw_days: Vec<Vec<RawSlot>> = vec![Vec::new(); DAYS_IN_WEEK];
        for row in rows {
            let label = row.first().map(|c| c.as_ref().trim()).unwrap_or_default();
            if row.len() < DAYS_IN_WEEK + 1 {
                return Err(PlanningError::ShortRow {
                    label: label.to_string(),
                    columns: row.len(),
                });
            }
            for (day, slots) in raw_days.iter_mut().enumerate() {
                slots.push(RawSlot::new(label, row[day + 1].as_ref()));
            }
        }

        let days = raw_days
            .iter()
            .map(|slots| merge_day(slots, table))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { days })
    }

    pub fn from_days(days: Vec<DayPlanning>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DayPlanning] {
        &self.days
    }

    pub fn day(&self, index: usize) -> Option<&DayPlanning> {
        self.days.get(index)
    }

    /// Lesson blocks paired with their day index, free periods skipped.
    pub fn lessons(&self) -> impl Iterator<Item = (usize, &LessonBlock)> {
        self.days
            .iter()
            .enumerate()
            .flat_map(|(day, blocks)| blocks.iter().map(move |block| (day, block)))
            .filter(|(_, block)| !block.is_free())
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }
}
