//! Conversion of reconciled records into downstream feed entries.

use crate::error::ReconError;
use crate::model::{
    ClientFeedEntry, ClientKind, FeedAddress, FeedAnnotation, FeedEmail, FeedPhone,
    IncomingRecord, ProvenanceColumns, Roster,
};
use crate::normalize::strip_diacritics;

pub const PERSON_KIND: &str = "FISICA";
pub const PHONE_KIND: &str = "CELULAR";

fn clean(text: &str) -> String {
    strip_diacritics(text).trim().to_string()
}

/// Split `(11) 91234-5678` into area code `11` and number `912345678`.
pub fn split_phone(phone: &str) -> (String, String) {
    let chars: Vec<char> = phone.chars().collect();
    let area: String = chars.iter().take(3).collect();
    let rest: String = chars.iter().skip(5).collect();
    (
        area.trim_matches(|c| c == '(' || c == ')').to_string(),
        rest.replace('-', "").trim().to_string(),
    )
}

/// "A" when the identity number is already on the roster, "I" otherwise.
pub fn classify(record: &IncomingRecord, roster: &Roster) -> ClientKind {
    if roster.contains(&record.identity_number) {
        ClientKind::Returning
    } else {
        ClientKind::New
    }
}

pub fn format_entry(
    record: &IncomingRecord,
    roster: &Roster,
    provenance: &ProvenanceColumns,
) -> Result<ClientFeedEntry, ReconError> {
    let birth = record.birth_date.to_date().ok_or_else(|| ReconError::DateParse {
        row: record.row,
        value: record.birth_date.to_string(),
    })?;

    let name = clean(&record.contact.name);
    let (ddd, telefone) = split_phone(&record.contact.phone);
    let c = &record.contact;

    Ok(ClientFeedEntry {
        id: format!("{}-{}", record.institution, record.identity_number),
        agrupador: clean(&record.institution),
        tipo_pessoa: PERSON_KIND,
        nome: name.clone(),
        cpf: record.identity_number.clone(),
        data_nascimento: birth.format("%Y-%m-%d").to_string(),
        tipo: classify(record, roster),
        enderecos: vec![FeedAddress {
            cep: c.postal_code.trim().to_string(),
            logradouro: clean(&c.address),
            bairro: clean(&c.neighborhood),
            cidade: clean(&c.city),
            numero: record.house_number.to_json(),
            uf: clean(&c.state),
        }],
        emails: vec![FeedEmail { email: c.email.trim().to_string() }],
        telefones: vec![FeedPhone { tipo: PHONE_KIND, ddd, telefone }],
        informacoes_adicionais: vec![
            FeedAnnotation {
                campo: "cpf_aluno",
                linha: record.row,
                coluna: provenance.identity_number,
                valor: serde_json::Value::from(record.identity_number.as_str()),
            },
            FeedAnnotation {
                campo: "registro_aluno",
                linha: record.row,
                coluna: provenance.registration,
                valor: record.registration.to_json(),
            },
            FeedAnnotation {
                campo: "nome_aluno",
                linha: record.row,
                coluna: provenance.name,
                valor: serde_json::Value::from(name),
            },
        ],
    })
}

pub fn format_entries(
    records: &[IncomingRecord],
    roster: &Roster,
    provenance: &ProvenanceColumns,
) -> Result<Vec<ClientFeedEntry>, ReconError> {
    records
        .iter()
        .map(|r| format_entry(r, roster, provenance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BirthDate, ClientField, ContactFields, RosterRecord, SheetValue};
    use chrono::NaiveDate;

    fn record() -> IncomingRecord {
        IncomingRecord {
            row: 4,
            identity_number: "11122233344".into(),
            birth_date: BirthDate::Text("05/03/1990".into()),
            contact: ContactFields {
                name: " João Conceição ".into(),
                email: " joao@mail.com ".into(),
                phone: "(11) 91234-5678".into(),
                address: "Avenida São João".into(),
                postal_code: "01310-100 ".into(),
                number: "1000".into(),
                neighborhood: "Consolação".into(),
                city: "São Paulo".into(),
                state: "SP".into(),
            },
            house_number: SheetValue::Number(1000.0),
            institution: "Faculdade Ávila".into(),
            registration: SheetValue::Number(20240017.0),
            cells: Vec::new(),
        }
    }

    fn provenance() -> ProvenanceColumns {
        ProvenanceColumns { identity_number: 0, registration: 12, name: 1 }
    }

    fn roster(ids: &[&str]) -> Roster {
        Roster {
            fields: ClientField::ALL.to_vec(),
            records: ids
                .iter()
                .enumerate()
                .map(|(row, id)| RosterRecord {
                    row,
                    identity_number: id.to_string(),
                    contact: ContactFields::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn splits_phone() {
        assert_eq!(split_phone("(11) 91234-5678"), ("11".into(), "912345678".into()));
    }

    #[test]
    fn new_client_entry() {
        let entry = format_entry(&record(), &roster(&[]), &provenance()).unwrap();

        assert_eq!(entry.id, "Faculdade Ávila-11122233344");
        assert_eq!(entry.agrupador, "Faculdade Avila");
        assert_eq!(entry.nome, "Joao Conceicao");
        assert_eq!(entry.data_nascimento, "1990-03-05");
        assert_eq!(entry.tipo, ClientKind::New);
        assert_eq!(entry.enderecos[0].cep, "01310-100");
        assert_eq!(entry.enderecos[0].logradouro, "Avenida Sao Joao");
        assert_eq!(entry.enderecos[0].bairro, "Consolacao");
        assert_eq!(entry.enderecos[0].cidade, "Sao Paulo");
        assert_eq!(entry.enderecos[0].numero, serde_json::json!(1000));
        assert_eq!(entry.emails[0].email, "joao@mail.com");
        assert_eq!(entry.telefones[0].ddd, "11");
        assert_eq!(entry.telefones[0].telefone, "912345678");
    }

    #[test]
    fn returning_client_entry() {
        let entry = format_entry(&record(), &roster(&["11122233344"]), &provenance()).unwrap();
        assert_eq!(entry.tipo, ClientKind::Returning);
    }

    #[test]
    fn date_cell_birth_date() {
        let mut rec = record();
        rec.birth_date = BirthDate::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap());
        let entry = format_entry(&rec, &roster(&[]), &provenance()).unwrap();
        assert_eq!(entry.data_nascimento, "1999-12-31");
    }

    #[test]
    fn unparseable_birth_date_is_an_error() {
        let mut rec = record();
        rec.birth_date = BirthDate::Text("1990-03-05".into());
        let err = format_entry(&rec, &roster(&[]), &provenance()).unwrap_err();
        assert!(matches!(err, ReconError::DateParse { row: 4, .. }));
    }

    #[test]
    fn provenance_annotations() {
        let entry = format_entry(&record(), &roster(&[]), &provenance()).unwrap();
        let json = serde_json::to_value(&entry.informacoes_adicionais).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"campo": "cpf_aluno", "linha": 4, "coluna": 0, "valor": "11122233344"},
                {"campo": "registro_aluno", "linha": 4, "coluna": 12, "valor": 20240017},
                {"campo": "nome_aluno", "linha": 4, "coluna": 1, "valor": "Joao Conceicao"},
            ])
        );
    }

    #[test]
    fn wire_keys_and_order() {
        let entry = format_entry(&record(), &roster(&[]), &provenance()).unwrap();
        let text = serde_json::to_string(&entry).unwrap();
        let keys = [
            "\"id\"", "\"agrupador\"", "\"tipoPessoa\"", "\"nome\"", "\"cpf\"",
            "\"dataNascimento\"", "\"tipo\"", "\"enderecos\"", "\"emails\"",
            "\"telefones\"", "\"informacoesAdicionais\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
        assert!(text.contains("\"tipo\":\"I\""));
        assert!(text.contains("\"tipoPessoa\":\"FISICA\""));
    }

    #[test]
    fn text_cells_stay_text() {
        let mut rec = record();
        rec.contact.number = "12B".into();
        rec.house_number = SheetValue::from("12B");
        let entry = format_entry(&rec, &roster(&[]), &provenance()).unwrap();
        assert_eq!(entry.enderecos[0].numero, serde_json::json!("12B"));
    }

    #[test]
    fn leading_zeros_survive_in_text_cells() {
        let mut rec = record();
        rec.house_number = SheetValue::from("0012");
        rec.registration = SheetValue::from("00123");
        let entry = format_entry(&rec, &roster(&[]), &provenance()).unwrap();
        assert_eq!(entry.enderecos[0].numero, serde_json::json!("0012"));
        assert_eq!(entry.informacoes_adicionais[1].valor, serde_json::json!("00123"));
    }

    #[test]
    fn fractional_number_cell_stays_fractional() {
        let mut rec = record();
        rec.house_number = SheetValue::Number(12.5);
        let entry = format_entry(&rec, &roster(&[]), &provenance()).unwrap();
        assert_eq!(entry.enderecos[0].numero, serde_json::json!(12.5));
    }
}
