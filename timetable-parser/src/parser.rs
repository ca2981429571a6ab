use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::{Calendar, Column, Error, Event, Options, RawRow, RowOutcome, SkipReason, SkippedRow};

macro_rules! regex {
    ($pattern:expr) => {{
        static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).unwrap());
        &REGEX
    }};
}

/// Combines the first `DD.MM.YYYY` found in `date_field` with an `HH:MM` time.
///
/// The date cell of an InSIS export carries decoration such as the weekday
/// (`Po 02.10.2023`), so only the matched date is parsed. Returns `None` when
/// no date is present or the combination is not a valid date-time.
#[must_use]
pub fn parse_datetime(date_field: &str, time_field: &str) -> Option<NaiveDateTime> {
    let date = regex!(r"[0-9]{2}\.[0-9]{2}\.[0-9]{4}")
        .find(date_field)?
        .as_str();

    NaiveDateTime::parse_from_str(&format!("{date} {time_field}"), "%d.%m.%Y %H:%M").ok()
}

/// Turns one schedule row into an event, or tells why it cannot be one.
pub fn parse_row(row: &RawRow, options: &Options) -> Result<RowOutcome, Error> {
    let day = row.required(Column::Day)?;
    let from = row.required(Column::From)?;
    let to = row.required(Column::To)?;
    let subject = row.required(Column::Subject)?;
    let activity = row.required(Column::Activity)?;

    let Some(start) = parse_datetime(day, from) else {
        return Ok(RowOutcome::Skipped(SkipReason::InvalidStart {
            day: day.to_string(),
            time: from.to_string(),
        }));
    };

    let Some(end) = parse_datetime(day, to) else {
        return Ok(RowOutcome::Skipped(SkipReason::InvalidEnd {
            day: day.to_string(),
            time: to.to_string(),
        }));
    };

    if end < start {
        return Ok(RowOutcome::Skipped(SkipReason::EndBeforeStart { start, end }));
    }

    let description = [Column::Instructor, Column::Constraint, Column::Capacity]
        .into_iter()
        .map(|column| format!("{}: {}", options.language.label(column), row.optional(column)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(RowOutcome::Converted(Event {
        uid: Uuid::new_v4(),
        start,
        end,
        title: format!("{subject} – {activity}"),
        location: row.optional(Column::Room).to_string(),
        description,
    }))
}

/// Converts every row independently, keeping events in input order.
pub fn convert(rows: &[RawRow], options: &Options) -> Result<Calendar, Error> {
    let mut calendar = Calendar::default();

    for row in rows {
        match parse_row(row, options)? {
            RowOutcome::Converted(event) => calendar.events.push(event),
            RowOutcome::Skipped(reason) => {
                log::warn!("Skipping row {}: {reason}", row.number);
                calendar.skipped.push(SkippedRow {
                    row: row.number,
                    reason,
                });
            }
        }
    }

    log::debug!(
        "Converted {} rows into {} events ({} skipped)",
        rows.len(),
        calendar.events.len(),
        calendar.skipped.len()
    );

    Ok(calendar)
}
