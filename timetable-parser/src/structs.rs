use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::Error;

/// The columns of a timetable export that the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Day,
    From,
    To,
    Subject,
    Activity,
    Room,
    Instructor,
    Constraint,
    Capacity,
}

impl Column {
    pub const REQUIRED: [Column; 5] = [
        Column::Day,
        Column::From,
        Column::To,
        Column::Subject,
        Column::Activity,
    ];

    /// Matches a header cell against the English and the InSIS (Czech) column names.
    #[must_use]
    pub fn from_header(header: &str) -> Option<Column> {
        let column = match header.trim().to_lowercase().as_str() {
            "day" | "den" => Column::Day,
            "from" | "od" => Column::From,
            "to" | "do" => Column::To,
            "subject" | "předmět" => Column::Subject,
            "activity" | "akce" => Column::Activity,
            "room" | "místnost" => Column::Room,
            "instructor" | "vyučující" => Column::Instructor,
            "constraint" | "omezení" => Column::Constraint,
            "capacity" | "kapacita" => Column::Capacity,
            _ => return None,
        };
        Some(column)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Column::Day => "Day",
            Column::From => "From",
            Column::To => "To",
            Column::Subject => "Subject",
            Column::Activity => "Activity",
            Column::Room => "Room",
            Column::Instructor => "Instructor",
            Column::Constraint => "Constraint",
            Column::Capacity => "Capacity",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One record of the schedule table, as decoded from the spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row number in the source sheet, used for diagnostics.
    pub number: usize,
    fields: HashMap<Column, String>,
}

impl RawRow {
    #[must_use]
    pub fn new(number: usize) -> Self {
        Self {
            number,
            fields: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: Column, value: impl Into<String>) {
        self.fields.insert(column, value.into());
    }

    /// Reads a column every row must carry.
    pub fn required(&self, column: Column) -> Result<&str, Error> {
        self.fields
            .get(&column)
            .map(String::as_str)
            .ok_or(Error::SchemaMismatch {
                row: self.number,
                column,
            })
    }

    /// Reads a column that may be absent, defaulting to the empty string.
    #[must_use]
    pub fn optional(&self, column: Column) -> &str {
        self.fields.get(&column).map_or("", String::as_str)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|value| value.trim().is_empty())
    }
}

fn serialize_date_time<S: Serializer>(
    date_time: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date_time.format("%Y-%m-%dT%H:%M").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub uid: Uuid,
    #[serde(serialize_with = "serialize_date_time")]
    pub start: NaiveDateTime,
    #[serde(serialize_with = "serialize_date_time")]
    pub end: NaiveDateTime,
    pub title: String,
    pub location: String,
    /// Labelled instructor, constraint and capacity lines separated by `\n`.
    pub description: String,
}

/// Why a row did not produce an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("cannot read a start time from day {day:?} and time {time:?}")]
    InvalidStart { day: String, time: String },
    #[error("cannot read an end time from day {day:?} and time {time:?}")]
    InvalidEnd { day: String, time: String },
    #[error("ends at {end} before it starts at {start}")]
    EndBeforeStart {
        #[serde(serialize_with = "serialize_date_time")]
        start: NaiveDateTime,
        #[serde(serialize_with = "serialize_date_time")]
        end: NaiveDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Converted(Event),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// The result of one conversion: events in input order plus the rows left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Calendar {
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedRow>,
}

/// An IANA time-zone name attached to every date-time of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneId(String);

impl TimeZoneId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TimeZoneId {
    fn default() -> Self {
        Self(Tz::Europe__Prague.name().to_string())
    }
}

impl FromStr for TimeZoneId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tz = s
            .trim()
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimeZone(s.to_string()))?;
        Ok(Self(tz.name().to_string()))
    }
}

impl fmt::Display for TimeZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects the labels used inside event descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Cz,
    En,
}

impl Language {
    #[must_use]
    pub fn label(self, column: Column) -> &'static str {
        match (self, column) {
            (Language::Cz, Column::Instructor) => "Vyučující",
            (Language::Cz, Column::Constraint) => "Omezení",
            (Language::Cz, Column::Capacity) => "Kapacita",
            (_, column) => column.name(),
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cz" | "cs" => Ok(Language::Cz),
            "en" => Ok(Language::En),
            _ => Err(Error::UnknownLanguage(s.to_string())),
        }
    }
}

/// Per-conversion settings, passed explicitly into every conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub time_zone: TimeZoneId,
    pub language: Language,
}
