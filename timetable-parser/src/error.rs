use crate::Column;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unreadable spreadsheet: {0}")]
    UnreadableFile(String),
    #[error("the workbook contains no worksheet")]
    EmptyWorkbook,
    #[error("the timetable contains no rows")]
    EmptyTable,
    #[error("required column `{0}` is missing")]
    MissingColumn(Column),
    #[error("row {row} has no `{column}` column")]
    SchemaMismatch { row: usize, column: Column },
    #[error("unknown time zone `{0}`")]
    UnknownTimeZone(String),
    #[error("unknown language `{0}`, expected `cz` or `en`")]
    UnknownLanguage(String),
}

impl Error {
    /// Whether the error stems from the uploaded table rather than from configuration.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::MissingColumn(_) | Error::SchemaMismatch { .. })
    }
}
