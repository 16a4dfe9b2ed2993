use crate::assembler::{Selection, SourceTables, assemble};
use crate::calendar::TermCalendar;
use crate::colles::ColleGroup;
use crate::event::Calendar;
use crate::persistence::{PersistenceResult, save_calendar_to_ics};
use crate::rotation::StaticGroup;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_OUTPUT: &str = "schedule.ics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub include_colles: bool,
    pub include_schedule: bool,
    /// Attach rooms to events as `LOCATION`.
    pub include_room_planning: bool,
    pub output_path: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_colles: true,
            include_schedule: true,
            include_room_planning: true,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Who the calendar is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Student {
    pub group: Option<StaticGroup>,
    pub colle_group: Option<ColleGroup>,
}

impl Student {
    pub fn new(group: Option<StaticGroup>, colle_group: Option<ColleGroup>) -> Self {
        Self { group, colle_group }
    }

    fn selection(&self, options: &ExportOptions) -> Selection {
        Selection {
            schedule: self.group.filter(|_| options.include_schedule),
            colles: self.colle_group.filter(|_| options.include_colles),
            include_rooms: options.include_room_planning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub lessons: usize,
    pub colles: usize,
}

/// Builds the calendar for `student` without touching the filesystem.
pub fn build_calendar(
    sources: &SourceTables,
    term: &TermCalendar,
    student: &Student,
    options: &ExportOptions,
    stamp: DateTime<Utc>,
) -> PersistenceResult<Calendar> {
    Ok(assemble(sources, term, &student.selection(options), stamp)?)
}

/// Builds and writes one calendar. Nothing is written if building fails.
pub fn export(
    sources: &SourceTables,
    term: &TermCalendar,
    student: &Student,
    options: &ExportOptions,
    stamp: DateTime<Utc>,
) -> PersistenceResult<ExportSummary> {
    let calendar = build_calendar(sources, term, student, options, stamp)?;
    save_calendar_to_ics(&calendar, &options.output_path)?;
    let summary = ExportSummary {
        output_path: options.output_path.clone(),
        lessons: calendar.lesson_count(),
        colles: calendar.colle_count(),
    };
    info!(
        path = %summary.output_path.display(),
        lessons = summary.lessons,
        colles = summary.colles,
        "calendar written"
    );
    Ok(summary)
}

/// Runs independent exports in parallel over the same source tables.
///
/// Each job must target its own output path.
pub fn export_batch(
    sources: &SourceTables,
    term: &TermCalendar,
    jobs: &[(Student, ExportOptions)],
    stamp: DateTime<Utc>,
) -> Vec<PersistenceResult<ExportSummary>> {
    jobs.par_iter()
        .map(|(student, options)| export(sources, term, student, options, stamp))
        .collect()
}

/// One job per static group, written as `<stem>_a.ics`, `<stem>_b.ics`, ...
pub fn per_group_jobs(
    template: &ExportOptions,
    colle_group: Option<ColleGroup>,
) -> Vec<(Student, ExportOptions)> {
    StaticGroup::ALL
        .into_iter()
        .map(|group| {
            let options = ExportOptions {
                output_path: suffixed_path(&template.output_path, group),
                ..template.clone()
            };
            (Student::new(Some(group), colle_group), options)
        })
        .collect()
}

fn suffixed_path(path: &Path, group: StaticGroup) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ics".to_string());
    let letter = group.letter().to_ascii_lowercase();
    path.with_file_name(format!("{stem}_{letter}.{extension}"))
}
