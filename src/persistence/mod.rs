use crate::colles::RosterError;
use crate::planning::PlanningError;
use crate::term_validation::TermConfigError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    Csv(csv::Error),
    Planning(PlanningError),
    Roster(RosterError),
    Config(TermConfigError),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::Planning(err) => write!(f, "timetable error: {err}"),
            PersistenceError::Roster(err) => write!(f, "roster error: {err}"),
            PersistenceError::Config(err) => write!(f, "invalid term configuration: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Serialization(err) => Some(err),
            PersistenceError::Io(err) => Some(err),
            PersistenceError::Csv(err) => Some(err),
            PersistenceError::Planning(err) => Some(err),
            PersistenceError::Roster(err) => Some(err),
            PersistenceError::Config(err) => Some(err),
            PersistenceError::InvalidData(_) => None,
        }
    }
}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<PlanningError> for PersistenceError {
    fn from(value: PlanningError) -> Self {
        Self::Planning(value)
    }
}

impl From<RosterError> for PersistenceError {
    fn from(value: RosterError) -> Self {
        Self::Roster(value)
    }
}

impl From<TermConfigError> for PersistenceError {
    fn from(value: TermConfigError) -> Self {
        Self::Config(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub mod file;

pub use file::{
    SourcePaths, load_group_planning_from_csv, load_roster_from_csv, load_source_tables,
    load_term_config_from_json, read_group_planning, read_roster, save_calendar_to_ics,
    save_term_config_to_json,
};
