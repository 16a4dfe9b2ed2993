pub mod assembler;
pub mod calendar;
pub mod colles;
pub mod event;
pub mod export;
pub mod ics;
pub mod metadata;
pub mod persistence;
pub mod planning;
pub mod rotation;
pub mod slots;
pub(crate) mod term_validation;

pub use assembler::{CalendarAssembler, Selection, SourceTables, assemble};
pub use calendar::{TermCalendar, TermConfig};
pub use colles::{ColleEntry, ColleGroup, Roster, RosterError};
pub use event::{Calendar, CalendarEvent, EventKind};
pub use export::{ExportOptions, ExportSummary, Student, build_calendar, export, export_batch};
pub use metadata::CalendarMetadata;
pub use persistence::{
    PersistenceError, SourcePaths, load_group_planning_from_csv, load_roster_from_csv,
    load_source_tables, load_term_config_from_json, save_calendar_to_ics,
    save_term_config_to_json,
};
pub use planning::{DayPlanning, GroupPlanning, LessonBlock, PlanningError, RawSlot};
pub use rotation::{ChangingGroup, GroupParseError, StaticGroup, changing_group};
pub use slots::{SlotError, SlotTable};
pub use term_validation::TermConfigError;
