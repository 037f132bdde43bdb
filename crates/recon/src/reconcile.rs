use std::collections::{HashMap, HashSet};

use crate::error::ReconError;
use crate::model::{
    ClientField, ContactFields, FieldUpdate, IncomingRecord, ReconciliationOutcome, Roster,
    RosterRecord,
};
use crate::normalize::{comparison_key, digits_only};

/// Bring the roster into comparison form: digits-only identity numbers,
/// trimmed lowercase contact fields.
pub fn normalize_roster(roster: &mut Roster) {
    let fields = roster.fields.clone();
    for record in &mut roster.records {
        record.identity_number = digits_only(&record.identity_number);
        for &field in &fields {
            let value = record.contact.get_mut(field);
            *value = comparison_key(value);
        }
    }
}

/// Reject rosters where two rows share a normalized identity number.
///
/// The reconciler itself resolves lookups first-match-wins; this guard keeps
/// that from ever silently picking one of two clients. Rows without an
/// identity number can never match an incoming record and are ignored.
pub fn ensure_unique_identities(roster: &Roster) -> Result<(), ReconError> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for record in &roster.records {
        let identity = digits_only(&record.identity_number);
        if identity.is_empty() {
            continue;
        }
        if let Some(&first) = seen.get(&identity) {
            return Err(ReconError::DuplicateIdentity {
                identity,
                first,
                second: record.row,
            });
        }
        seen.insert(identity, record.row);
    }
    Ok(())
}

/// Split valid records into existing/new and merge changed fields into the roster.
///
/// Records keep their incoming order inside each partition. Identity numbers
/// on the returned records are normalized to digits only.
pub fn reconcile(valid: Vec<IncomingRecord>, roster: &mut Roster) -> ReconciliationOutcome {
    normalize_roster(roster);

    let known: HashSet<String> = roster
        .identity_set()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut outcome = ReconciliationOutcome::default();
    for mut record in valid {
        record.identity_number = digits_only(&record.identity_number);
        if known.contains(&record.identity_number) {
            outcome.existing.push(record);
        } else {
            outcome.new.push(record);
        }
    }

    let fields: Vec<ClientField> = ClientField::ALL
        .into_iter()
        .filter(|f| roster.has_field(*f))
        .collect();

    for record in &outcome.existing {
        let Some(entry) = roster.find_mut(&record.identity_number) else {
            continue;
        };
        for &field in &fields {
            let incoming = comparison_key(record.contact.get(field));
            if incoming.is_empty() || incoming == entry.contact.get(field) {
                continue;
            }
            let update = FieldUpdate {
                client_name: record.contact.name.trim().to_string(),
                identity_number: record.identity_number.clone(),
                field,
                old_value: entry.contact.get(field).to_string(),
                new_value: incoming.clone(),
            };
            tracing::info!("{update}");
            *entry.contact.get_mut(field) = incoming;
            outcome.updates.push(update);
        }
    }

    outcome
}

/// Add the new clients to the roster, in comparison form, after their entries
/// have been classified. A client listed twice in the batch is added once.
pub fn append_new(roster: &mut Roster, new: &[IncomingRecord]) {
    let mut next_row = roster.records.iter().map(|r| r.row + 1).max().unwrap_or(0);
    for record in new {
        let identity = digits_only(&record.identity_number);
        if roster.contains(&identity) {
            continue;
        }
        let mut contact = ContactFields::default();
        for field in ClientField::ALL {
            *contact.get_mut(field) = comparison_key(record.contact.get(field));
        }
        tracing::debug!(row = next_row, identity = %identity, "adding client to roster");
        roster.records.push(RosterRecord { row: next_row, identity_number: identity, contact });
        next_row += 1;
    }
}
