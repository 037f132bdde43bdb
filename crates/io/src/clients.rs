//! Column mapping from loaded tables to the engine's client records.

use std::path::Path;

use clientsync_recon::config::{IncomingColumns, RosterColumns};
use clientsync_recon::model::{
    BirthDate, ClientField, ContactFields, IncomingRecord, IncomingSheet, ProvenanceColumns,
    Roster, RosterRecord, SheetValue,
};

use crate::error::IoError;
use crate::table::{Cell, Table};

fn text_at(row: &[Cell], idx: usize) -> String {
    row.get(idx).map(Cell::display).unwrap_or_default()
}

/// Numeric cells keep their kind; anything else is its display text.
fn value_at(row: &[Cell], idx: usize) -> SheetValue {
    match row.get(idx) {
        Some(Cell::Number(n)) => SheetValue::Number(*n),
        Some(other) => SheetValue::Text(other.display()),
        None => SheetValue::default(),
    }
}

fn birth_date_at(row: &[Cell], idx: usize) -> BirthDate {
    match row.get(idx) {
        Some(Cell::Date(d)) => BirthDate::Date(*d),
        Some(other) => BirthDate::Text(other.display()),
        None => BirthDate::Text(String::new()),
    }
}

/// Map the prospective-client table. Every configured column is required.
pub fn incoming_sheet(path: &Path, table: &Table, cols: &IncomingColumns) -> Result<IncomingSheet, IoError> {
    let col = |name: &str| table.require_column(path, name);

    let identity_idx = col(&cols.identity_number)?;
    let name_idx = col(&cols.name)?;
    let birth_idx = col(&cols.birth_date)?;
    let email_idx = col(&cols.email)?;
    let phone_idx = col(&cols.phone)?;
    let postal_idx = col(&cols.postal_code)?;
    let address_idx = col(&cols.address)?;
    let number_idx = col(&cols.number)?;
    let neighborhood_idx = col(&cols.neighborhood)?;
    let city_idx = col(&cols.city)?;
    let state_idx = col(&cols.state)?;
    let institution_idx = col(&cols.institution)?;
    let registration_idx = col(&cols.registration)?;

    let records = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.iter().all(Cell::is_empty))
        .map(|(row_idx, row)| IncomingRecord {
            row: row_idx,
            identity_number: text_at(row, identity_idx),
            birth_date: birth_date_at(row, birth_idx),
            contact: ContactFields {
                name: text_at(row, name_idx),
                email: text_at(row, email_idx),
                phone: text_at(row, phone_idx),
                address: text_at(row, address_idx),
                postal_code: text_at(row, postal_idx),
                number: text_at(row, number_idx),
                neighborhood: text_at(row, neighborhood_idx),
                city: text_at(row, city_idx),
                state: text_at(row, state_idx),
            },
            house_number: value_at(row, number_idx),
            institution: text_at(row, institution_idx),
            registration: value_at(row, registration_idx),
            cells: row.iter().map(Cell::display).collect(),
        })
        .collect();

    Ok(IncomingSheet {
        headers: table.headers.clone(),
        provenance: ProvenanceColumns {
            identity_number: identity_idx,
            registration: registration_idx,
            name: name_idx,
        },
        records,
    })
}

/// Map the roster table. Only the identity column is required.
pub fn roster(path: &Path, table: &Table, cols: &RosterColumns) -> Result<Roster, IoError> {
    let identity_idx = table.require_column(path, &cols.identity_number)?;

    let present: Vec<(ClientField, usize)> = ClientField::ALL
        .into_iter()
        .filter_map(|f| table.column(cols.header(f)).map(|idx| (f, idx)))
        .collect();

    let records = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.iter().all(Cell::is_empty))
        .map(|(row_idx, row)| {
            let mut contact = ContactFields::default();
            for &(field, idx) in &present {
                *contact.get_mut(field) = text_at(row, idx);
            }
            RosterRecord {
                row: row_idx,
                identity_number: text_at(row, identity_idx),
                contact,
            }
        })
        .collect();

    Ok(Roster {
        fields: present.iter().map(|(f, _)| *f).collect(),
        records,
    })
}

/// Header + rows for writing the roster back.
pub fn roster_rows(roster: &Roster, cols: &RosterColumns) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = vec![cols.identity_number.clone()];
    headers.extend(roster.fields.iter().map(|f| cols.header(*f).to_string()));

    let rows = roster
        .records
        .iter()
        .map(|r| {
            let mut row = vec![r.identity_number.clone()];
            row.extend(roster.fields.iter().map(|f| r.contact.get(*f).to_string()));
            row
        })
        .collect();

    (headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    fn incoming_table() -> Table {
        let headers = [
            "CPF", "NOME", "Data de Nascimento", "Email", "Telefone", "CEP", "Endereço",
            "Numero", "Bairro", "Cidade", "Estado", "Faculdade", "RA",
        ];
        Table {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: vec![
                vec![
                    Cell::Number(11122233344.0),
                    text("Ana Souza"),
                    Cell::Date(NaiveDate::from_ymd_opt(1990, 3, 5).unwrap()),
                    text("ana@mail.com"),
                    text("(11) 91234-5678"),
                    text("01310-100"),
                    text("Av. Paulista"),
                    Cell::Number(1000.0),
                    text("Bela Vista"),
                    text("São Paulo"),
                    text("SP"),
                    text("FACX"),
                    Cell::Number(2024001.0),
                ],
                vec![Cell::Empty; 13],
                {
                    let mut row = vec![Cell::Empty; 13];
                    row[0] = text("987.654.321-00");
                    row[2] = text("05/03/1990");
                    row[7] = text("0012");
                    row[12] = text("00123");
                    row
                },
            ],
        }
    }

    #[test]
    fn test_incoming_mapping() {
        let sheet = incoming_sheet(Path::new("dados.xlsx"), &incoming_table(), &IncomingColumns::default()).unwrap();

        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.provenance, ProvenanceColumns { identity_number: 0, registration: 12, name: 1 });

        let first = &sheet.records[0];
        assert_eq!(first.row, 0);
        assert_eq!(first.identity_number, "11122233344");
        assert_eq!(first.birth_date, BirthDate::Date(NaiveDate::from_ymd_opt(1990, 3, 5).unwrap()));
        assert_eq!(first.contact.number, "1000");
        assert_eq!(first.house_number, SheetValue::Number(1000.0));
        assert_eq!(first.registration, SheetValue::Number(2024001.0));
        assert_eq!(first.cells[2], "05/03/1990");

        // Blank row skipped, position kept.
        let second = &sheet.records[1];
        assert_eq!(second.row, 2);
        assert_eq!(second.birth_date, BirthDate::Text("05/03/1990".into()));
        assert_eq!(second.contact.name, "");
        // Text cells keep their leading zeros.
        assert_eq!(second.house_number, SheetValue::Text("0012".into()));
        assert_eq!(second.registration, SheetValue::Text("00123".into()));
    }

    #[test]
    fn test_incoming_missing_column() {
        let mut table = incoming_table();
        table.headers[12] = "Registro".into();
        let err = incoming_sheet(Path::new("dados.xlsx"), &table, &IncomingColumns::default()).unwrap_err();
        assert_eq!(err.to_string(), "dados.xlsx: missing column 'RA'");
    }

    #[test]
    fn test_roster_partial_columns() {
        let table = Table {
            headers: vec!["cpf".into(), "nome".into(), "email".into(), "observacao".into()],
            rows: vec![vec![text("111.222.333-44"), text("Ana Souza"), text("ana@mail.com"), text("vip")]],
        };
        let roster = roster(Path::new("sistema.xlsx"), &table, &RosterColumns::default()).unwrap();

        assert_eq!(roster.fields, vec![ClientField::Name, ClientField::Email]);
        assert_eq!(roster.records[0].identity_number, "111.222.333-44");
        assert_eq!(roster.records[0].contact.email, "ana@mail.com");
        assert_eq!(roster.records[0].contact.city, "");
    }

    #[test]
    fn test_roster_requires_identity() {
        let table = Table { headers: vec!["nome".into()], rows: Vec::new() };
        let err = roster(Path::new("sistema.xlsx"), &table, &RosterColumns::default()).unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }

    #[test]
    fn test_roster_rows() {
        let table = Table {
            headers: vec!["cpf".into(), "email".into()],
            rows: vec![vec![text("11122233344"), text("ana@mail.com")]],
        };
        let cols = RosterColumns::default();
        let roster = roster(Path::new("sistema.csv"), &table, &cols).unwrap();
        let (headers, rows) = roster_rows(&roster, &cols);
        assert_eq!(headers, vec!["cpf", "email"]);
        assert_eq!(rows, vec![vec!["11122233344".to_string(), "ana@mail.com".to_string()]]);
    }
}
