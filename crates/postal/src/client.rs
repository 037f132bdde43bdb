//! Postal-code directory HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). One GET per lookup,
//! no retries: a failed call is reported to the caller, which treats it as
//! an unknown address.

use std::time::Duration;

use clientsync_recon::{PostalDirectory, PostalLookup};
use thiserror::Error;

pub const USER_AGENT: &str = concat!("clientsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum LookupError {
    /// Client could not be built (TLS backend, bad config).
    #[error("cannot build HTTP client: {0}")]
    Client(String),
    /// Network error, including timeouts.
    #[error("network error: {0}")]
    Network(String),
    /// Non-200 response.
    #[error("HTTP {0}")]
    Http(u16),
    /// Body is not the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

/// ViaCEP-style directory: `GET {base_url}/{cep}/json/`.
#[derive(Clone)]
pub struct PostalClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl PostalClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up an 8-digit postal code.
    pub fn lookup_code(&self, postal_code: &str) -> Result<PostalLookup, LookupError> {
        let url = format!("{}/{}/json/", self.base_url, postal_code);
        tracing::debug!(%url, "postal lookup");

        let resp = self
            .http
            .get(&url)
            .send()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(LookupError::Http(status));
        }

        let body: serde_json::Value = resp.json().map_err(|e| LookupError::Parse(e.to_string()))?;
        Ok(interpret_body(&body))
    }
}

/// The directory answers 200 with `{"erro": true}` for unknown codes.
/// Some deployments send the flag as the string `"true"`.
pub fn interpret_body(body: &serde_json::Value) -> PostalLookup {
    let flagged = match body.get("erro") {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if flagged {
        PostalLookup::NotFound
    } else {
        PostalLookup::Found
    }
}

impl PostalDirectory for PostalClient {
    fn lookup(&self, postal_code: &str) -> Result<PostalLookup, String> {
        self.lookup_code(postal_code).map_err(|e| e.to_string())
    }
}
