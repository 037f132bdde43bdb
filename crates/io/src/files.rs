//! File-backed [`ClientSource`] and [`OutputSink`].

use std::path::{Path, PathBuf};

use clientsync_recon::config::{ColumnsConfig, RunConfig};
use clientsync_recon::model::{ClientFeedEntry, IncomingSheet, RejectedRecord, Roster};
use clientsync_recon::{ClientSource, OutputSink, ReconError};

use crate::clients;
use crate::error::IoError;
use crate::table::{read_table, write_table};

pub const REASONS_HEADER: &str = "Reasons";

pub struct FileSource {
    incoming: PathBuf,
    roster: PathBuf,
    sheet: Option<String>,
    columns: ColumnsConfig,
}

impl FileSource {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            incoming: config.input.incoming.clone(),
            roster: config.input.roster.clone(),
            sheet: config.input.sheet.clone(),
            columns: config.columns.clone(),
        }
    }
}

/// A missing column keeps its own variant so the CLI can point at `[columns]`.
fn source_error(err: IoError) -> ReconError {
    match err {
        IoError::MissingColumn { path, column } => ReconError::MissingColumn {
            sheet: path.display().to_string(),
            column,
        },
        other => ReconError::Source(other.to_string()),
    }
}

impl ClientSource for FileSource {
    fn incoming(&self) -> Result<IncomingSheet, ReconError> {
        let table = read_table(&self.incoming, self.sheet.as_deref()).map_err(source_error)?;
        clients::incoming_sheet(&self.incoming, &table, &self.columns.incoming).map_err(source_error)
    }

    fn roster(&self) -> Result<Roster, ReconError> {
        // The roster is its own file; a sheet name only applies to the incoming one.
        let table = read_table(&self.roster, None).map_err(source_error)?;
        clients::roster(&self.roster, &table, &self.columns.roster).map_err(source_error)
    }
}

pub struct FileSink {
    feed: PathBuf,
    rejected: PathBuf,
    roster: Option<PathBuf>,
    columns: ColumnsConfig,
}

impl FileSink {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            feed: config.output.feed.clone(),
            rejected: config.output.rejected.clone(),
            roster: config.output.roster.clone(),
            columns: config.columns.clone(),
        }
    }
}

/// Original row cells plus the joined reasons, under the original headers plus `Reasons`.
pub fn rejected_rows(headers: &[String], rejected: &[RejectedRecord]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut out_headers = headers.to_vec();
    out_headers.push(REASONS_HEADER.to_string());

    let rows = rejected
        .iter()
        .map(|r| {
            let mut row = r.record.cells.clone();
            row.resize(headers.len(), String::new());
            row.push(r.joined_reasons());
            row
        })
        .collect();

    (out_headers, rows)
}

fn written(path: &Path, what: &str) {
    tracing::info!(path = %path.display(), "wrote {what}");
}

impl OutputSink for FileSink {
    fn write_feed(&mut self, feed: &[ClientFeedEntry]) -> Result<(), ReconError> {
        crate::json::write_feed(&self.feed, feed).map_err(|e| ReconError::Sink(e.to_string()))?;
        written(&self.feed, "feed");
        Ok(())
    }

    fn write_rejected(&mut self, headers: &[String], rejected: &[RejectedRecord]) -> Result<(), ReconError> {
        let (headers, rows) = rejected_rows(headers, rejected);
        write_table(&self.rejected, &headers, &rows).map_err(|e| ReconError::Sink(e.to_string()))?;
        written(&self.rejected, "rejected report");
        Ok(())
    }

    fn write_roster(&mut self, roster: &Roster) -> Result<(), ReconError> {
        let Some(ref path) = self.roster else {
            return Ok(());
        };
        let (headers, rows) = clients::roster_rows(roster, &self.columns.roster);
        write_table(path, &headers, &rows).map_err(|e| ReconError::Sink(e.to_string()))?;
        written(path, "roster");
        Ok(())
    }
}
