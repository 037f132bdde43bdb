use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty path, zero timeout, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in an input sheet.
    #[error("{sheet}: missing column '{column}'")]
    MissingColumn { sheet: String, column: String },
    /// Birth date that cannot be re-emitted as a calendar date.
    #[error("row {row}: cannot parse birth date '{value}'")]
    DateParse { row: usize, value: String },
    /// Two roster rows normalize to the same identity number.
    #[error("roster contains duplicate identity number {identity} (rows {first} and {second})")]
    DuplicateIdentity { identity: String, first: usize, second: usize },
    /// Input could not be loaded.
    #[error("cannot read input: {0}")]
    Source(String),
    /// Output could not be written.
    #[error("cannot write output: {0}")]
    Sink(String),
}
