use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("{path}: unsupported file type (expected .xlsx, .xls, .xlsb, .ods or .csv)")]
    UnsupportedFormat { path: PathBuf },
    #[error("{path}: sheet '{sheet}' not found")]
    SheetNotFound { path: PathBuf, sheet: String },
    #[error("{path}: no header row")]
    NoHeader { path: PathBuf },
    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}
