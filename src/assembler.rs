use crate::calendar::TermCalendar;
use crate::colles::{ColleEntry, ColleGroup, Roster, RosterError};
use crate::event::{Calendar, CalendarEvent};
use crate::metadata::CalendarMetadata;
use crate::planning::GroupPlanning;
use crate::rotation::{ChangingGroup, StaticGroup};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

/// Everything read from disk for one run: the three cohort timetables and
/// the colle roster. Immutable once built and shared by every export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTables {
    plannings: [GroupPlanning; ChangingGroup::COUNT],
    roster: Roster,
}

impl SourceTables {
    pub fn new(plannings: [GroupPlanning; ChangingGroup::COUNT], roster: Roster) -> Self {
        Self { plannings, roster }
    }

    pub fn planning(&self, group: ChangingGroup) -> &GroupPlanning {
        &self.plannings[group.index()]
    }

    pub fn plannings(&self) -> &[GroupPlanning] {
        &self.plannings
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}

/// What goes into one calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub schedule: Option<StaticGroup>,
    pub colles: Option<ColleGroup>,
    pub include_rooms: bool,
}

pub struct CalendarAssembler<'a> {
    sources: &'a SourceTables,
    term: &'a TermCalendar,
    metadata: CalendarMetadata,
    stamp: DateTime<Utc>,
    events: Vec<CalendarEvent>,
}

impl<'a> CalendarAssembler<'a> {
    pub fn new(sources: &'a SourceTables, term: &'a TermCalendar, stamp: DateTime<Utc>) -> Self {
        Self {
            sources,
            term,
            metadata: CalendarMetadata::default(),
            stamp,
            events: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: CalendarMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn next_uid(&self, start: NaiveDateTime) -> String {
        format!(
            "{}-{:04}@{}",
            start.format("%Y%m%dT%H%M"),
            self.events.len(),
            self.metadata.uid_domain
        )
    }

    /// Expands the timetable of `group` over every teaching week of the term.
    pub fn add_schedule(&mut self, group: StaticGroup) -> &mut Self {
        let days_per_week = self.term.days_per_week();
        for week in self.term.weeks(group) {
            let monday = self.term.start_date() + Duration::weeks(i64::from(week.calendar_week));
            let planning = self.sources.planning(week.group);
            debug!(
                nominal = week.nominal,
                calendar_week = week.calendar_week,
                cohort = week.group.index(),
                "expanding week"
            );
            for (day, block) in planning.lessons() {
                if day >= days_per_week {
                    continue;
                }
                let date = monday + Duration::days(day as i64);
                let uid = self.next_uid(date.and_time(block.start));
                self.events
                    .push(CalendarEvent::lesson(uid, date, block, self.stamp));
            }
        }
        self
    }

    /// Appends colles that land on a teaching day; others are dropped.
    pub fn add_colles(&mut self, entries: &[ColleEntry]) -> &mut Self {
        for entry in entries {
            if !self.term.is_teaching_day(entry.date) {
                warn!(
                    date = %entry.date,
                    subject = %entry.subject,
                    examiner = %entry.examiner,
                    "colle outside the teaching weeks, skipped"
                );
                continue;
            }
            let uid = self.next_uid(entry.date.and_time(entry.start));
            self.events.push(CalendarEvent::colle(uid, entry, self.stamp));
        }
        self
    }

    pub fn finish(self, include_rooms: bool) -> Calendar {
        let events = if include_rooms {
            self.events
        } else {
            self.events
                .into_iter()
                .map(CalendarEvent::without_location)
                .collect()
        };
        Calendar {
            metadata: self.metadata,
            timezone: self.term.timezone().to_string(),
            events,
        }
    }
}

/// Builds the calendar for `selection`: timetable weeks first, then colles.
pub fn assemble(
    sources: &SourceTables,
    term: &TermCalendar,
    selection: &Selection,
    stamp: DateTime<Utc>,
) -> Result<Calendar, RosterError> {
    let colles = match selection.colles {
        Some(group) => sources.roster().resolve(group, term)?,
        None => Vec::new(),
    };

    let mut assembler =
        CalendarAssembler::new(sources, term, stamp).with_metadata(metadata_for(selection));
    if let Some(group) = selection.schedule {
        assembler.add_schedule(group);
    }
    assembler.add_colles(&colles);
    let calendar = assembler.finish(selection.include_rooms);

    info!(
        lessons = calendar.lesson_count(),
        colles = calendar.colle_count(),
        "calendar assembled"
    );
    Ok(calendar)
}

fn metadata_for(selection: &Selection) -> CalendarMetadata {
    let name = match (selection.schedule, selection.colles) {
        (Some(group), Some(colle)) => format!("Emploi du temps groupe {group} (colles {colle})"),
        (Some(group), None) => format!("Emploi du temps groupe {group}"),
        (None, Some(colle)) => format!("Colles groupe {colle}"),
        (None, None) => "Emploi du temps".to_string(),
    };
    CalendarMetadata::named(name)
}
