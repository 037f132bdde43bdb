// File I/O operations

pub mod clients;
pub mod csv;
pub mod error;
pub mod files;
pub mod json;
pub mod table;
pub mod xlsx;

pub use error::IoError;
pub use files::{FileSink, FileSource, REASONS_HEADER};
pub use table::{read_table, write_table, Cell, Table};
