use std::io::Cursor;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use umya_spreadsheet::reader::xlsx;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::{convert, Calendar, Column, Error, Options, RawRow};

/// Decodes the first worksheet of an `.xlsx` file held in memory.
pub fn read_table(bytes: &[u8]) -> Result<Vec<RawRow>, Error> {
    let book = xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|err| Error::UnreadableFile(err.to_string()))?;
    table_from_book(&book)
}

pub fn read_table_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>, Error> {
    let path = path.as_ref();
    let book = xlsx::read(path)
        .map_err(|err| Error::UnreadableFile(format!("{}: {err}", path.display())))?;
    table_from_book(&book)
}

/// Decodes and converts an uploaded timetable in one step.
pub fn convert_xlsx(bytes: &[u8], options: &Options) -> Result<Calendar, Error> {
    convert(&read_table(bytes)?, options)
}

fn table_from_book(book: &Spreadsheet) -> Result<Vec<RawRow>, Error> {
    let sheet = book
        .get_sheet_collection()
        .first()
        .ok_or(Error::EmptyWorkbook)?;
    read_rows(sheet)
}

fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|cell| cell.get_value().trim().to_string())
        .unwrap_or_default()
}

fn read_rows(sheet: &Worksheet) -> Result<Vec<RawRow>, Error> {
    let (max_col, max_row) = sheet.get_highest_column_and_row();

    // The first row names the columns, like a pandas `read_excel` header.
    let columns = (1..=max_col)
        .filter_map(|col| Column::from_header(&cell_text(sheet, col, 1)).map(|column| (col, column)))
        .collect::<Vec<_>>();

    if let Some(missing) = Column::REQUIRED
        .into_iter()
        .find(|required| !columns.iter().any(|(_, column)| column == required))
    {
        return Err(Error::MissingColumn(missing));
    }

    let mut rows = Vec::new();
    for row_number in 2..=max_row {
        let mut row = RawRow::new(row_number as usize);
        for &(col, column) in &columns {
            row.insert(column, normalize(column, cell_text(sheet, col, row_number)));
        }

        if !row.is_blank() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(Error::EmptyTable);
    }

    log::debug!("Read {} rows from sheet `{}`", rows.len(), sheet.get_name());
    Ok(rows)
}

/// Renders numeric date and time cells the way the export shows them as text.
fn normalize(column: Column, value: String) -> String {
    let Ok(number) = value.parse::<f64>() else {
        return value;
    };

    match column {
        Column::Day if number >= 1.0 => serial_date(number).unwrap_or(value),
        Column::From | Column::To if number >= 0.0 && number.is_finite() => {
            day_fraction(number.fract())
        }
        _ => value,
    }
}

/// Excel serial day numbers count from 1899-12-30 in the 1900 date system.
fn serial_date(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)?;
    Some(date.format("%d.%m.%Y").to_string())
}

/// Renders the time of day, truncated to the minute and never past 23:59.
fn day_fraction(fraction: f64) -> String {
    let seconds = (fraction * 24.0 * 60.0 * 60.0).round() as u32;
    let minutes = (seconds / 60).min(23 * 60 + 59);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::RowOutcome;

    /// Writes a single-sheet workbook whose rows are given as cell texts.
    fn write_workbook(dir: &TempDir, rows: &[&[&str]]) -> PathBuf {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();

        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet
                        .get_cell_mut((col_idx as u32 + 1, row_idx as u32 + 1))
                        .set_value(*value);
                }
            }
        }

        let path = dir.path().join("timetable.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        path
    }

    const HEADER: &[&str] = &[
        "Den", "Od", "Do", "Předmět", "Akce", "Místnost", "Vyučující", "Omezení", "Kapacita",
    ];

    #[test]
    fn reads_insis_export() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(
            &dir,
            &[
                HEADER,
                &["Po 02.10.2023", "09:00", "10:30", "Math", "Lecture", "101", "Novák", "", "30"],
                &["", "", "", "", "", "", "", "", ""],
                &["Út 03.10.2023", "12:00", "13:30", "Physics", "Seminar", "", "", "", ""],
            ],
        );

        let rows = read_table_from_path(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].required(Column::Day).unwrap(), "Po 02.10.2023");
        assert_eq!(rows[0].optional(Column::Room), "101");
        assert_eq!(rows[1].number, 4);
        assert_eq!(rows[1].required(Column::Subject).unwrap(), "Physics");

        let bytes = std::fs::read(&path).unwrap();
        let calendar = convert_xlsx(&bytes, &Options::default()).unwrap();
        assert_eq!(calendar.events.len(), 2);
        assert_eq!(calendar.events[0].title, "Math – Lecture");
        assert_eq!(calendar.events[1].title, "Physics – Seminar");
    }

    #[test]
    fn english_headers_and_unknown_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(
            &dir,
            &[
                &["Note", "Day", "From", "To", "Subject", "Activity"],
                &["x", "no date here", "09:00", "10:00", "Math", "Lecture"],
            ],
        );

        let rows = read_table_from_path(&path).unwrap();
        let calendar = convert(&rows, &Options::default()).unwrap();
        assert!(calendar.events.is_empty());
        assert_eq!(calendar.skipped.len(), 1);
        assert_eq!(calendar.skipped[0].row, 2);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(
            &dir,
            &[
                &["Day", "From", "Subject", "Activity"],
                &["02.10.2023", "09:00", "Math", "Lecture"],
            ],
        );

        assert!(matches!(
            read_table_from_path(&path),
            Err(Error::MissingColumn(Column::To))
        ));
    }

    #[test]
    fn header_only_table_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, &[&["Day", "From", "To", "Subject", "Activity"]]);

        assert!(matches!(read_table_from_path(&path), Err(Error::EmptyTable)));
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        assert!(matches!(
            read_table(b"Den;Od;Do\n"),
            Err(Error::UnreadableFile(_))
        ));
    }

    #[test]
    fn numeric_cells_are_rendered_as_text() {
        assert_eq!(normalize(Column::Day, "45201".into()), "02.10.2023");
        assert_eq!(normalize(Column::From, "0.375".into()), "09:00");
        assert_eq!(normalize(Column::To, "0.4375".into()), "10:30");
        assert_eq!(normalize(Column::Capacity, "30".into()), "30");
        assert_eq!(normalize(Column::Day, "Po 02.10.2023".into()), "Po 02.10.2023");
    }

    #[test]
    fn late_and_dated_time_cells_stay_parseable() {
        assert_eq!(normalize(Column::To, "0.9999".into()), "23:59");
        assert_eq!(normalize(Column::To, "0.99966".into()), "23:59");
        assert_eq!(normalize(Column::To, "0.99999999".into()), "23:59");
        assert_eq!(normalize(Column::From, "0.6041666666666666".into()), "14:30");
        assert_eq!(normalize(Column::From, "45201.375".into()), "09:00");
        assert_eq!(normalize(Column::To, "45201.4375".into()), "10:30");

        let end = normalize(Column::To, "0.9999".into());
        assert!(crate::parse_datetime("02.10.2023", &end).is_some());
    }

    #[test]
    fn numeric_export_converts() {
        let row = RawRow::new(2)
            .with(Column::Day, normalize(Column::Day, "45201".into()))
            .with(Column::From, normalize(Column::From, "0.375".into()))
            .with(Column::To, normalize(Column::To, "0.4375".into()))
            .with(Column::Subject, "Math")
            .with(Column::Activity, "Lecture");

        let outcome = crate::parse_row(&row, &Options::default()).unwrap();
        assert!(matches!(outcome, RowOutcome::Converted(_)));
    }
}
