use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a run needs besides the data itself.
///
/// Every section has defaults, so an empty TOML file is a valid config that
/// reads `dados.xlsx` + `sistema.xlsx` from the working directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default = "default_incoming")]
    pub incoming: PathBuf,
    #[serde(default = "default_roster")]
    pub roster: PathBuf,
    /// Worksheet name; first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            incoming: default_incoming(),
            roster: default_roster(),
            sheet: None,
        }
    }
}

fn default_incoming() -> PathBuf {
    PathBuf::from("dados.xlsx")
}

fn default_roster() -> PathBuf {
    PathBuf::from("sistema.xlsx")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_feed")]
    pub feed: PathBuf,
    #[serde(default = "default_rejected")]
    pub rejected: PathBuf,
    /// Write the reconciled roster back here. Print-only when absent.
    #[serde(default)]
    pub roster: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            feed: default_feed(),
            rejected: default_rejected(),
            roster: None,
        }
    }
}

fn default_feed() -> PathBuf {
    PathBuf::from("clientes_validos.json")
}

fn default_rejected() -> PathBuf {
    PathBuf::from("clientes_invalidos.xlsx")
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub const DEFAULT_LOOKUP_URL: &str = "https://viacep.com.br/ws";

fn default_base_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub incoming: IncomingColumns,
    #[serde(default)]
    pub roster: RosterColumns,
}

/// Header names in the prospective-client sheet. All are required.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncomingColumns {
    pub identity_number: String,
    pub name: String,
    pub birth_date: String,
    pub email: String,
    pub phone: String,
    pub postal_code: String,
    pub address: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub institution: String,
    pub registration: String,
}

impl Default for IncomingColumns {
    fn default() -> Self {
        Self {
            identity_number: "CPF".into(),
            name: "NOME".into(),
            birth_date: "Data de Nascimento".into(),
            email: "Email".into(),
            phone: "Telefone".into(),
            postal_code: "CEP".into(),
            address: "Endereço".into(),
            number: "Numero".into(),
            neighborhood: "Bairro".into(),
            city: "Cidade".into(),
            state: "Estado".into(),
            institution: "Faculdade".into(),
            registration: "RA".into(),
        }
    }
}

/// Header names in the roster sheet. Only `identity_number` is required;
/// contact columns the sheet lacks are skipped during the merge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterColumns {
    pub identity_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            identity_number: "cpf".into(),
            name: "nome".into(),
            email: "email".into(),
            phone: "telefone".into(),
            address: "endereco".into(),
            postal_code: "cep".into(),
            number: "numero".into(),
            neighborhood: "bairro".into(),
            city: "cidade".into(),
            state: "estado".into(),
        }
    }
}

impl RosterColumns {
    pub fn header(&self, field: crate::model::ClientField) -> &str {
        use crate::model::ClientField;
        match field {
            ClientField::Name => &self.name,
            ClientField::Email => &self.email,
            ClientField::Phone => &self.phone,
            ClientField::Address => &self.address,
            ClientField::PostalCode => &self.postal_code,
            ClientField::Number => &self.number,
            ClientField::Neighborhood => &self.neighborhood,
            ClientField::City => &self.city,
            ClientField::State => &self.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let paths = [
            ("input.incoming", &self.input.incoming),
            ("input.roster", &self.input.roster),
            ("output.feed", &self.output.feed),
            ("output.rejected", &self.output.rejected),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        if self.lookup.timeout_secs == 0 {
            return Err(ReconError::ConfigValidation(
                "lookup.timeout_secs must be at least 1".into(),
            ));
        }

        if !self.lookup.base_url.starts_with("http://") && !self.lookup.base_url.starts_with("https://") {
            return Err(ReconError::ConfigValidation(format!(
                "lookup.base_url must be an http(s) URL, got '{}'",
                self.lookup.base_url
            )));
        }

        let incoming = &self.columns.incoming;
        let headers = [
            &incoming.identity_number,
            &incoming.name,
            &incoming.birth_date,
            &incoming.email,
            &incoming.phone,
            &incoming.postal_code,
            &incoming.address,
            &incoming.number,
            &incoming.neighborhood,
            &incoming.city,
            &incoming.state,
            &incoming.institution,
            &incoming.registration,
        ];
        if headers.iter().any(|h| h.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(
                "columns.incoming entries must not be empty".into(),
            ));
        }
        if self.columns.roster.identity_number.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "columns.roster.identity_number must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Resolve relative file paths against `base_dir` (the config file's directory).
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        resolve(&mut self.input.incoming);
        resolve(&mut self.input.roster);
        resolve(&mut self.output.feed);
        resolve(&mut self.output.rejected);
        if let Some(ref mut roster) = self.output.roster {
            resolve(roster);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
