use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Contact fields compared and merged during reconciliation, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientField {
    Name,
    Email,
    Phone,
    Address,
    PostalCode,
    Number,
    Neighborhood,
    City,
    State,
}

impl ClientField {
    pub const ALL: [ClientField; 9] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::PostalCode,
        Self::Number,
        Self::Neighborhood,
        Self::City,
        Self::State,
    ];
}

impl std::fmt::Display for ClientField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::Address => write!(f, "address"),
            Self::PostalCode => write!(f, "postal_code"),
            Self::Number => write!(f, "number"),
            Self::Neighborhood => write!(f, "neighborhood"),
            Self::City => write!(f, "city"),
            Self::State => write!(f, "state"),
        }
    }
}

/// Personal/contact data shared by incoming and roster rows.
/// An empty string means the cell was missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
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

impl ContactFields {
    pub fn get(&self, field: ClientField) -> &str {
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

    pub fn get_mut(&mut self, field: ClientField) -> &mut String {
        match field {
            ClientField::Name => &mut self.name,
            ClientField::Email => &mut self.email,
            ClientField::Phone => &mut self.phone,
            ClientField::Address => &mut self.address,
            ClientField::PostalCode => &mut self.postal_code,
            ClientField::Number => &mut self.number,
            ClientField::Neighborhood => &mut self.neighborhood,
            ClientField::City => &mut self.city,
            ClientField::State => &mut self.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Incoming
// ---------------------------------------------------------------------------

/// Birth date as found in the sheet: a date cell, or text in `DD/MM/YYYY` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BirthDate {
    Date(NaiveDate),
    Text(String),
}

impl BirthDate {
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok(),
        }
    }
}

impl std::fmt::Display for BirthDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A cell copied into the feed as-is: numeric cells stay JSON numbers,
/// everything else (leading zeros included) stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetValue {
    Number(f64),
    Text(String),
}

impl SheetValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.trim()),
        }
    }
}

impl Default for SheetValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for SheetValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One row of the prospective-client sheet.
#[derive(Debug, Clone)]
pub struct IncomingRecord {
    /// 0-based data row (header excluded).
    pub row: usize,
    pub identity_number: String,
    pub birth_date: BirthDate,
    /// Text forms, compared against the roster.
    pub contact: ContactFields,
    /// The house-number cell as read; `contact.number` is its text.
    pub house_number: SheetValue,
    pub institution: String,
    pub registration: SheetValue,
    /// Raw cell texts in header order, for the rejected report.
    pub cells: Vec<String>,
}

/// Header positions carried into the feed's provenance annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProvenanceColumns {
    pub identity_number: usize,
    pub registration: usize,
    pub name: usize,
}

/// The prospective-client sheet after column mapping.
#[derive(Debug, Clone, Default)]
pub struct IncomingSheet {
    pub headers: Vec<String>,
    pub provenance: ProvenanceColumns,
    pub records: Vec<IncomingRecord>,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    /// 0-based data row (header excluded).
    pub row: usize,
    pub identity_number: String,
    pub contact: ContactFields,
}

/// Existing-client table. `fields` lists the comparison columns the roster
/// sheet actually carries; reconciliation never touches the others.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub fields: Vec<ClientField>,
    pub records: Vec<RosterRecord>,
}

impl Roster {
    pub fn has_field(&self, field: ClientField) -> bool {
        self.fields.contains(&field)
    }

    pub fn identity_set(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.identity_number.as_str()).collect()
    }

    pub fn contains(&self, identity_number: &str) -> bool {
        self.records.iter().any(|r| r.identity_number == identity_number)
    }

    /// First roster entry with this identity number.
    pub fn find_mut(&mut self, identity_number: &str) -> Option<&mut RosterRecord> {
        self.records.iter_mut().find(|r| r.identity_number == identity_number)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Structured outcome of the address rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCheck {
    pub valid: bool,
    pub reason: Option<String>,
}

impl AddressCheck {
    pub fn ok() -> Self {
        Self { valid: true, reason: None }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self { valid: false, reason: Some(reason.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub identity_number: bool,
    pub name: bool,
    pub legal_age: bool,
    pub email: bool,
    pub phone: bool,
    pub location: AddressCheck,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.identity_number
            && self.name
            && self.legal_age
            && self.email
            && self.phone
            && self.location.valid
    }

    /// One fixed message per failed rule, in rule order.
    pub fn reasons(&self) -> Vec<&'static str> {
        let checks = [
            (self.identity_number, "Invalid identity number."),
            (self.name, "Invalid name."),
            (self.legal_age, "Under legal age."),
            (self.email, "Invalid email."),
            (self.phone, "Invalid phone."),
            (self.location.valid, "Invalid location."),
        ];
        checks.iter().filter(|(ok, _)| !ok).map(|(_, msg)| *msg).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RejectedRecord {
    pub record: IncomingRecord,
    pub reasons: Vec<String>,
}

impl RejectedRecord {
    /// Reasons as written to the report column.
    pub fn joined_reasons(&self) -> String {
        self.reasons.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Audit note for one overwritten roster field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldUpdate {
    pub client_name: String,
    pub identity_number: String,
    pub field: ClientField,
    pub old_value: String,
    pub new_value: String,
}

impl std::fmt::Display for FieldUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "updating {} of {} (identity {}): {} -> {}",
            self.field, self.client_name, self.identity_number, self.old_value, self.new_value
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationOutcome {
    pub existing: Vec<IncomingRecord>,
    pub new: Vec<IncomingRecord>,
    pub updates: Vec<FieldUpdate>,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Returning ("A") vs new ("I") client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClientKind {
    #[serde(rename = "A")]
    Returning,
    #[serde(rename = "I")]
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedAddress {
    pub cep: String,
    pub logradouro: String,
    pub bairro: String,
    pub cidade: String,
    pub numero: serde_json::Value,
    pub uf: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPhone {
    pub tipo: &'static str,
    pub ddd: String,
    pub telefone: String,
}

/// Provenance annotation: where a value came from in the incoming sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedAnnotation {
    pub campo: &'static str,
    pub linha: usize,
    pub coluna: usize,
    pub valor: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFeedEntry {
    pub id: String,
    pub agrupador: String,
    pub tipo_pessoa: &'static str,
    pub nome: String,
    pub cpf: String,
    pub data_nascimento: String,
    pub tipo: ClientKind,
    pub enderecos: Vec<FeedAddress>,
    pub emails: Vec<FeedEmail>,
    pub telefones: Vec<FeedPhone>,
    pub informacoes_adicionais: Vec<FeedAnnotation>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Pre-loaded inputs for one run.
pub struct RunInput {
    pub incoming: IncomingSheet,
    pub roster: Roster,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub valid: usize,
    pub rejected: usize,
    pub existing: usize,
    pub new: usize,
    pub field_updates: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// New entries first, then returning ones.
    pub feed: Vec<ClientFeedEntry>,
    pub rejected: Vec<RejectedRecord>,
    pub headers: Vec<String>,
    pub roster: Roster,
    pub updates: Vec<FieldUpdate>,
    pub summary: RunSummary,
}
