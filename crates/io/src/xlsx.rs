// Excel/ODS table import (calamine) and export (rust_xlsxwriter)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use crate::error::IoError;
use crate::table::{Cell, Table};

/// Excel's 1900 date system counts from 1899-12-30 (the phantom 1900-02-29 included).
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        // Store as TRUE/FALSE text, as Excel shows it
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => {
            // calamine keeps the 1904 flag private; assume the 1900 system (most common).
            let serial = dt.as_f64();
            match serial_to_date(serial) {
                Some(d) => Cell::Date(d),
                None => Cell::Number(serial),
            }
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Import one worksheet (xlsx, xls, xlsb, ods). First sheet unless `sheet` names one.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.to_string(),
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| IoError::NoHeader {
            path: path.to_path_buf(),
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        message: format!("sheet '{}': {}", sheet_name, e),
    })?;

    // Data may not begin at A1; keep column positions absolute.
    let (_, data_start_col) = range.start().unwrap_or((0, 0));
    let lead = data_start_col as usize;

    let raw: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; lead];
            cells.extend(row.iter().map(convert_cell));
            cells
        })
        .collect();

    Table::from_rows(path, raw)
}

/// Write a single-sheet workbook: bold header row, then text rows.
pub fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), IoError> {
    let write_err = |e: rust_xlsxwriter::XlsxError| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(write_err)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_idx as u32 + 1, col as u16, value)
                .map_err(write_err)?;
        }
    }

    workbook.save(path).map_err(write_err)?;
    Ok(())
}
