use chrono::NaiveDate;

use crate::error::ReconError;
use crate::format::format_entries;
use crate::model::{
    ClientFeedEntry, IncomingSheet, RejectedRecord, Roster, RunInput, RunOutcome, RunSummary,
};
use crate::reconcile::{append_new, ensure_unique_identities, reconcile};
use crate::validate::{validate_record, PostalDirectory};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Where the two input tables come from.
pub trait ClientSource {
    fn incoming(&self) -> Result<IncomingSheet, ReconError>;
    fn roster(&self) -> Result<Roster, ReconError>;
}

/// Where the run's artifacts go.
pub trait OutputSink {
    fn write_feed(&mut self, feed: &[ClientFeedEntry]) -> Result<(), ReconError>;
    fn write_rejected(
        &mut self,
        headers: &[String],
        rejected: &[RejectedRecord],
    ) -> Result<(), ReconError>;
    /// Roster write-back. Sinks that only print the roster keep the default.
    fn write_roster(&mut self, _roster: &Roster) -> Result<(), ReconError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Validate, reconcile and format one batch. Pure apart from the directory lookups.
pub fn run(
    input: RunInput,
    directory: &dyn PostalDirectory,
    today: NaiveDate,
) -> Result<RunOutcome, ReconError> {
    let RunInput { incoming, mut roster } = input;
    ensure_unique_identities(&roster)?;

    let total = incoming.records.len();
    let mut valid = Vec::new();
    let mut rejected = Vec::new();

    for record in incoming.records {
        let result = validate_record(&record, directory, today);
        let name = record.contact.name.trim().to_string();
        if result.is_valid() {
            tracing::info!(row = record.row, "client {name} is valid");
            valid.push(record);
        } else {
            let reasons: Vec<String> = result.reasons().into_iter().map(String::from).collect();
            tracing::info!(row = record.row, reasons = %reasons.join(", "), "client {name} is not valid");
            if let Some(ref detail) = result.location.reason {
                tracing::debug!(row = record.row, "location: {detail}");
            }
            rejected.push(RejectedRecord { record, reasons });
        }
    }

    let valid_count = valid.len();
    let outcome = reconcile(valid, &mut roster);

    let mut feed = format_entries(&outcome.new, &roster, &incoming.provenance)?;
    feed.extend(format_entries(&outcome.existing, &roster, &incoming.provenance)?);

    // Only after classification, so "I" tags stay in step with the partition.
    append_new(&mut roster, &outcome.new);

    let summary = RunSummary {
        total,
        valid: valid_count,
        rejected: rejected.len(),
        existing: outcome.existing.len(),
        new: outcome.new.len(),
        field_updates: outcome.updates.len(),
    };

    Ok(RunOutcome {
        feed,
        rejected,
        headers: incoming.headers,
        roster,
        updates: outcome.updates,
        summary,
    })
}

/// Load from `source`, run, and hand every artifact to `sink`.
pub fn execute(
    source: &dyn ClientSource,
    directory: &dyn PostalDirectory,
    sink: &mut dyn OutputSink,
    today: NaiveDate,
) -> Result<RunOutcome, ReconError> {
    let input = RunInput {
        incoming: source.incoming()?,
        roster: source.roster()?,
    };

    let outcome = run(input, directory, today)?;

    sink.write_feed(&outcome.feed)?;
    sink.write_rejected(&outcome.headers, &outcome.rejected)?;
    sink.write_roster(&outcome.roster)?;

    tracing::info!(
        total = outcome.summary.total,
        valid = outcome.summary.valid,
        rejected = outcome.summary.rejected,
        new = outcome.summary.new,
        existing = outcome.summary.existing,
        updates = outcome.summary.field_updates,
        "run complete"
    );

    Ok(outcome)
}
