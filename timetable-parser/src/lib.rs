//! Converts timetable exports into iCalendar documents.
//!
//! Rows are decoded from an `.xlsx` sheet ([`read_table`]), turned into
//! [`Event`]s one by one ([`parse_row`], [`convert`]) and serialized with
//! [`encode`] or [`Calendar::to_ics`].

mod error;
mod ics;
mod parser;
mod sheet;
mod structs;

pub use error::Error;
pub use ics::encode;
pub use parser::{convert, parse_datetime, parse_row};
pub use sheet::{convert_xlsx, read_table, read_table_from_path};
pub use structs::{
    Calendar, Column, Event, Language, Options, RawRow, RowOutcome, SkipReason, SkippedRow,
    TimeZoneId,
};
