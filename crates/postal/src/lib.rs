//! Postal-code directory client — used by the CLI to back the address rule.
//!
//! No retries, no caching. One request per lookup.

mod client;

pub use client::{interpret_body, LookupError, PostalClient, USER_AGENT};
