use crate::colles::ColleEntry;
use crate::ics;
use crate::metadata::CalendarMetadata;
use crate::planning::LessonBlock;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Summary prefix of oral examination events.
pub const COLLE_PREFIX: &str = "COLLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Lesson,
    Colle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub kind: EventKind,
    pub summary: String,
    /// Civil time in the calendar's timezone.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stamp: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn lesson(
        uid: impl Into<String>,
        date: NaiveDate,
        block: &LessonBlock,
        stamp: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            kind: EventKind::Lesson,
            summary: block.summary.clone(),
            start: date.and_time(block.start),
            end: date.and_time(block.end),
            location: non_empty(&block.location),
            description: None,
            stamp,
        }
    }

    pub fn colle(uid: impl Into<String>, entry: &ColleEntry, stamp: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            kind: EventKind::Colle,
            summary: format!("{COLLE_PREFIX} {}", entry.subject),
            start: entry.date.and_time(entry.start),
            end: entry.date.and_time(entry.end),
            location: non_empty(&entry.room),
            description: non_empty(&entry.examiner),
            stamp,
        }
    }

    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }

    pub fn is_colle(&self) -> bool {
        self.kind == EventKind::Colle
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A complete calendar, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub metadata: CalendarMetadata,
    pub timezone: String,
    pub events: Vec<CalendarEvent>,
}

impl Calendar {
    pub fn write_ics<W: Write>(&self, writer: W) -> io::Result<()> {
        ics::write_calendar(writer, self)
    }

    pub fn to_ics(&self) -> String {
        ics::to_string(self)
    }

    pub fn lesson_count(&self) -> usize {
        self.events.iter().filter(|e| !e.is_colle()).count()
    }

    pub fn colle_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_colle()).count()
    }
}
