use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar weeks inserted for each vacation.
pub const VACATION_LENGTH_WEEKS: u32 = 2;

/// A student's fixed group; it sets the phase of the weekly rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticGroup {
    A,
    B,
    C,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParseError {
    input: String,
}

impl GroupParseError {
    pub(crate) fn from_input(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for GroupParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown group '{}'", self.input)
    }
}

impl std::error::Error for GroupParseError {}

impl StaticGroup {
    pub const ALL: [StaticGroup; 3] = [StaticGroup::A, StaticGroup::B, StaticGroup::C];

    pub fn letter(self) -> char {
        match self {
            StaticGroup::A => 'A',
            StaticGroup::B => 'B',
            StaticGroup::C => 'C',
        }
    }

    /// Cohort followed during week 0.
    pub fn starting_group(self) -> ChangingGroup {
        match self {
            StaticGroup::A => ChangingGroup(0),
            StaticGroup::B => ChangingGroup(1),
            StaticGroup::C => ChangingGroup(2),
        }
    }
}

impl fmt::Display for StaticGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for StaticGroup {
    type Err = GroupParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "a" | "A" => Ok(StaticGroup::A),
            "b" | "B" => Ok(StaticGroup::B),
            "c" | "C" => Ok(StaticGroup::C),
            other => Err(GroupParseError::from_input(other)),
        }
    }
}

/// Index of the cohort table (`0.csv`, `1.csv`, `2.csv`) followed in a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChangingGroup(u8);

impl ChangingGroup {
    pub const COUNT: usize = 3;

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Cohort followed by `group` during nominal week `week`.
///
/// The rotation steps one cohort backwards every teaching week; vacations do
/// not shift it.
pub fn changing_group(group: StaticGroup, week: u32) -> ChangingGroup {
    let base = group.starting_group().0 as i64;
    let index = (base - i64::from(week)).rem_euclid(ChangingGroup::COUNT as i64);
    ChangingGroup(index as u8)
}

/// Extra calendar weeks to add to nominal week `week` to step over vacations.
///
/// `vacation_starts` are calendar week indices. Each start at or before the
/// already-adjusted week pushes the term back by two weeks, so back-to-back
/// vacations accumulate.
pub fn vacation_adjusted_offset(week: u32, vacation_starts: &[u32]) -> u32 {
    let mut starts = vacation_starts.to_vec();
    starts.sort_unstable();
    starts.into_iter().fold(0, |offset, start| {
        if start <= week + offset {
            offset + VACATION_LENGTH_WEEKS
        } else {
            offset
        }
    })
}

/// Calendar week (from the term start) in which nominal week `week` happens.
pub fn calendar_week(week: u32, vacation_starts: &[u32]) -> u32 {
    week + vacation_adjusted_offset(week, vacation_starts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermWeek {
    pub nominal: u32,
    pub calendar_week: u32,
    pub group: ChangingGroup,
}

/// Walks the teaching weeks of a term one at a time.
///
/// The vacation offset is carried from week to week instead of being
/// recomputed, mirroring how the calendar is filled.
#[derive(Debug, Clone)]
pub struct WeekCursor {
    group: StaticGroup,
    vacation_starts: Vec<u32>,
    term_weeks: u32,
    nominal: u32,
    offset: u32,
    next_vacation: usize,
}

impl WeekCursor {
    pub fn new(group: StaticGroup, term_weeks: u32, vacation_starts: &[u32]) -> Self {
        let mut starts = vacation_starts.to_vec();
        starts.sort_unstable();
        let mut cursor = Self {
            group,
            vacation_starts: starts,
            term_weeks,
            nominal: 0,
            offset: 0,
            next_vacation: 0,
        };
        cursor.absorb_vacations();
        cursor
    }

    fn absorb_vacations(&mut self) {
        while let Some(&start) = self.vacation_starts.get(self.next_vacation) {
            if start > self.nominal + self.offset {
                break;
            }
            self.offset += VACATION_LENGTH_WEEKS;
            self.next_vacation += 1;
        }
    }
}

impl Iterator for WeekCursor {
    type Item = TermWeek;

    fn next(&mut self) -> Option<Self::Item> {
        if self.nominal >= self.term_weeks {
            return None;
        }
        let week = TermWeek {
            nominal: self.nominal,
            calendar_week: self.nominal + self.offset,
            group: changing_group(self.group, self.nominal),
        };
        self.nominal += 1;
        self.absorb_vacations();
        Some(week)
    }
}
