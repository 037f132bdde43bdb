//! Format-independent view of a header + rows sheet.

use std::path::Path;

use chrono::NaiveDate;

use crate::error::IoError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Text as the cell would read in the sheet. Whole numbers lose the `.0`,
    /// dates read `DD/MM/YYYY`.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// First row = headers; `rows` excludes it. Rows are padded to header width.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build from raw rows; the first non-empty row is the header.
    pub fn from_rows(path: &Path, mut raw: Vec<Vec<Cell>>) -> Result<Self, IoError> {
        let header_idx = raw
            .iter()
            .position(|r| r.iter().any(|c| !c.is_empty()))
            .ok_or_else(|| IoError::NoHeader { path: path.to_path_buf() })?;

        let mut rows = raw.split_off(header_idx + 1);
        let headers: Vec<String> = raw[header_idx]
            .iter()
            .map(|c| c.display().trim().to_string())
            .collect();

        let width = headers.len();
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }

        // Trailing blank rows are formatting residue, not data.
        while rows.last().is_some_and(|r| r.iter().all(Cell::is_empty)) {
            rows.pop();
        }

        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name.trim())
    }

    pub fn require_column(&self, path: &Path, name: &str) -> Result<usize, IoError> {
        self.column(name).ok_or_else(|| IoError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Spreadsheet,
    Csv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            "csv" | "tsv" | "txt" => Ok(Self::Csv),
            _ => Err(IoError::UnsupportedFormat { path: path.to_path_buf() }),
        }
    }
}

/// Read a table from any supported file, dispatching on the extension.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Spreadsheet => crate::xlsx::read_table(path, sheet)?,
        TableFormat::Csv => crate::csv::read_table(path)?,
    };
    tracing::debug!(path = %path.display(), rows = table.rows.len(), "table loaded");
    Ok(table)
}

/// Write text rows under `headers`; `.xlsx` or `.csv` by extension.
pub fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), IoError> {
    match TableFormat::from_path(path)? {
        TableFormat::Spreadsheet => crate::xlsx::write_table(path, headers, rows),
        TableFormat::Csv => crate::csv::write_table(path, headers, rows),
    }
}
