// CSV/TSV table import/export

use std::io::Read;
use std::path::Path;

use crate::error::IoError;
use crate::table::{Cell, Table};

pub fn read_table(path: &Path) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    read_table_from_str(path, &content, delimiter)
}

const DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Rows after the header that take part in delimiter detection.
const SNIFF_ROWS: usize = 5;

/// Pick the delimiter that splits the header into columns and keeps the
/// following rows at the header's width.
///
/// Each candidate parses the sample as one stream, so quoted fields that
/// contain other candidates or line breaks do not skew the count. Ties go to
/// the wider header, then to candidate order (semicolon first, as exported
/// by spreadsheets in pt-BR locales).
fn sniff_delimiter(content: &str) -> u8 {
    let mut best = (b',', 0usize, 0usize);
    for delim in DELIMITERS {
        let mut records = csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes())
            .into_records()
            .filter_map(Result::ok);

        let width = match records.next() {
            Some(header) if header.len() > 1 => header.len(),
            _ => continue,
        };
        let matching = records.take(SNIFF_ROWS).filter(|r| r.len() == width).count();
        if (matching, width) > (best.1, best.2) {
            best = (delim, matching, width);
        }
    }
    best.0
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Excel writes a BOM in front of "CSV UTF-8" exports.
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn read_table_from_str(path: &Path, content: &str, delimiter: u8) -> Result<Table, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut raw = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        raw.push(row);
    }

    Table::from_rows(path, raw)
}

pub fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), IoError> {
    let write_err = |e: &dyn std::fmt::Display| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| write_err(&e))?;

    writer.write_record(headers).map_err(|e| write_err(&e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| write_err(&e))?;
    }

    writer.flush().map_err(|e| write_err(&e))?;
    Ok(())
}
