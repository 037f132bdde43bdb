//! `clientsync-recon` — client intake engine.
//!
//! Pure engine crate: receives pre-loaded sheets, validates every prospective
//! client, merges the valid ones into the roster and formats the feed.
//! No file IO; the postal directory is reached through [`PostalDirectory`].

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod validate;

pub use config::RunConfig;
pub use engine::{execute, run, ClientSource, OutputSink};
pub use error::ReconError;
pub use model::{
    BirthDate, ClientFeedEntry, ClientField, ClientKind, ContactFields, FieldUpdate,
    IncomingRecord, IncomingSheet, ProvenanceColumns, RejectedRecord, Roster, RosterRecord,
    RunInput, RunOutcome, RunSummary, SheetValue,
};
pub use validate::{PostalDirectory, PostalLookup};
