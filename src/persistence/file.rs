use super::{PersistenceError, PersistenceResult};
use crate::assembler::SourceTables;
use crate::calendar::TermConfig;
use crate::colles::Roster;
use crate::event::Calendar;
use crate::planning::GroupPlanning;
use crate::rotation::ChangingGroup;
use crate::slots::SlotTable;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ROSTER_FILE_NAME: &str = "collometre.csv";

/// Where the four input tables live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub cohorts: [PathBuf; ChangingGroup::COUNT],
    pub roster: PathBuf,
}

impl SourcePaths {
    /// `0.csv`, `1.csv`, `2.csv` and `collometre.csv` inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            cohorts: [0, 1, 2].map(|idx| dir.join(format!("{idx}.csv"))),
            roster: dir.join(ROSTER_FILE_NAME),
        }
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn collect_rows<R: Read>(reader: &mut csv::Reader<R>) -> PersistenceResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Reads a cohort table: a header row, then `label, monday, ..., saturday`.
pub fn read_group_planning<R: Read>(reader: R, table: &SlotTable) -> PersistenceResult<GroupPlanning> {
    let mut reader = csv_reader(reader);
    let rows = collect_rows(&mut reader)?;
    Ok(GroupPlanning::from_rows(rows, table)?)
}

pub fn load_group_planning_from_csv<P: AsRef<Path>>(
    path: P,
    table: &SlotTable,
) -> PersistenceResult<GroupPlanning> {
    let file = File::open(path.as_ref())?;
    let planning = read_group_planning(file, table)?;
    debug!(
        path = %path.as_ref().display(),
        lessons = planning.lesson_count(),
        "loaded cohort table"
    );
    Ok(planning)
}

pub fn read_roster<R: Read>(reader: R) -> PersistenceResult<Roster> {
    let mut reader = csv_reader(reader);
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let rows = collect_rows(&mut reader)?;
    Ok(Roster::new(header, rows))
}

pub fn load_roster_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Roster> {
    let file = File::open(path.as_ref())?;
    let roster = read_roster(file)?;
    debug!(
        path = %path.as_ref().display(),
        rows = roster.rows().len(),
        "loaded colle roster"
    );
    Ok(roster)
}

/// Loads every input table up front. The roster is only read when
/// `with_roster` is set; otherwise an empty one is used.
pub fn load_source_tables(
    paths: &SourcePaths,
    table: &SlotTable,
    with_roster: bool,
) -> PersistenceResult<SourceTables> {
    let [first, second, third] = &paths.cohorts;
    let plannings = [
        load_group_planning_from_csv(first, table)?,
        load_group_planning_from_csv(second, table)?,
        load_group_planning_from_csv(third, table)?,
    ];
    let roster = if with_roster {
        load_roster_from_csv(&paths.roster)?
    } else {
        Roster::default()
    };
    Ok(SourceTables::new(plannings, roster))
}

pub fn load_term_config_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<TermConfig> {
    let file = File::open(path)?;
    let config: TermConfig = serde_json::from_reader(file)?;
    config.validate()?;
    Ok(config)
}

pub fn save_term_config_to_json<P: AsRef<Path>>(
    config: &TermConfig,
    path: P,
) -> PersistenceResult<()> {
    config.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

/// Writes the calendar next to `path` first and renames it into place, so a
/// failed write never leaves a truncated file behind.
pub fn save_calendar_to_ics<P: AsRef<Path>>(calendar: &Calendar, path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            PersistenceError::InvalidData(format!("'{}' is not a file path", path.display()))
        })?
        .to_string_lossy()
        .into_owned();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let written = File::create(&tmp_path)
        .map_err(PersistenceError::from)
        .and_then(|file| {
            calendar
                .write_ics(BufWriter::new(file))
                .map_err(PersistenceError::from)
        });
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
