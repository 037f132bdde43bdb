//! Business rules applied to every incoming row.
//!
//! Each rule is an independent predicate. A record is valid only when all
//! six hold; the failed ones become the reasons in the rejected report.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{AddressCheck, BirthDate, IncomingRecord, ValidationResult};
use crate::normalize::digits_only;

pub const IDENTITY_DIGITS: usize = 11;
pub const POSTAL_CODE_DIGITS: usize = 8;
pub const LEGAL_AGE: i32 = 18;

// `\n?$` accepts one trailing newline, like a `$` anchor in most regex dialects.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ'\- ]+\n?$").expect("name pattern"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\n?$").expect("email pattern")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d{2}\) \d{5}-\d{4}\n?$").expect("phone pattern"));

// ---------------------------------------------------------------------------
// Postal directory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostalLookup {
    Found,
    NotFound,
}

/// External postal-code directory. `Err` means the call itself failed.
pub trait PostalDirectory {
    fn lookup(&self, postal_code: &str) -> Result<PostalLookup, String>;
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// 11 digits after stripping punctuation, not all the same digit.
pub fn is_valid_identity_number(id: &str) -> bool {
    let digits = digits_only(id);
    if digits.len() != IDENTITY_DIGITS {
        return false;
    }
    let first = digits.as_bytes()[0];
    !digits.bytes().all(|b| b == first)
}

/// At least two words, letters (accented included), apostrophes, hyphens and spaces only.
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    if name.split_whitespace().count() < 2 {
        return false;
    }
    NAME_RE.is_match(name)
}

/// Age in whole years on `today`.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

/// Malformed dates are not legal age.
pub fn is_legal_age(birth_date: &BirthDate, today: NaiveDate) -> bool {
    match birth_date.to_date() {
        Some(born) => age_on(born, today) >= LEGAL_AGE,
        None => false,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Exactly `(DD) DDDDD-DDDD`.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Postal code must have 8 digits and be known to the directory.
///
/// `_street_address` is not part of the lookup; it is accepted so callers
/// pass the address pair together.
pub fn address_exists(
    postal_code: &str,
    _street_address: &str,
    directory: &dyn PostalDirectory,
) -> AddressCheck {
    let digits = digits_only(postal_code);
    if digits.len() != POSTAL_CODE_DIGITS {
        return AddressCheck::fail(format!(
            "postal code must have {POSTAL_CODE_DIGITS} digits, got {}",
            digits.len()
        ));
    }

    match directory.lookup(&digits) {
        Ok(PostalLookup::Found) => AddressCheck::ok(),
        Ok(PostalLookup::NotFound) => AddressCheck::fail(format!("postal code {digits} not found")),
        Err(e) => {
            tracing::warn!(postal_code = %digits, error = %e, "postal lookup failed");
            AddressCheck::fail(format!("postal lookup failed: {e}"))
        }
    }
}

/// Run all six rules. Every rule runs, even after an earlier one failed.
pub fn validate_record(
    record: &IncomingRecord,
    directory: &dyn PostalDirectory,
    today: NaiveDate,
) -> ValidationResult {
    ValidationResult {
        identity_number: is_valid_identity_number(&record.identity_number),
        name: is_valid_name(&record.contact.name),
        legal_age: is_legal_age(&record.birth_date, today),
        email: is_valid_email(&record.contact.email),
        phone: is_valid_phone(&record.contact.phone),
        location: address_exists(&record.contact.postal_code, &record.contact.address, directory),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedDirectory {
        known: Vec<&'static str>,
        fail: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FixedDirectory {
        fn new(known: Vec<&'static str>) -> Self {
            Self { known, fail: false, calls: RefCell::new(Vec::new()) }
        }
    }

    impl PostalDirectory for FixedDirectory {
        fn lookup(&self, postal_code: &str) -> Result<PostalLookup, String> {
            self.calls.borrow_mut().push(postal_code.to_string());
            if self.fail {
                return Err("connection refused".into());
            }
            if self.known.contains(&postal_code) {
                Ok(PostalLookup::Found)
            } else {
                Ok(PostalLookup::NotFound)
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn identity_number_rules() {
        assert!(is_valid_identity_number("11122233344"));
        assert!(is_valid_identity_number("111.222.333-44"));
        assert!(!is_valid_identity_number("11111111111"));
        assert!(!is_valid_identity_number("1112223334"));
        assert!(!is_valid_identity_number("111222333445"));
        assert!(!is_valid_identity_number(""));
    }

    #[test]
    fn name_rules() {
        assert!(!is_valid_name("Ana"));
        assert!(is_valid_name("Ana Souza"));
        assert!(is_valid_name("  João D'Ávila-Neto  "));
        assert!(!is_valid_name("Ana Souza 2"));
        assert!(!is_valid_name("Ana_Souza Lima"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn age_boundary() {
        let today = date(2026, 10, 19);
        assert!(is_legal_age(&BirthDate::Date(date(2008, 10, 19)), today));
        assert!(!is_legal_age(&BirthDate::Date(date(2008, 10, 20)), today));
        assert!(is_legal_age(&BirthDate::Text("19/10/2008".into()), today));
        assert!(!is_legal_age(&BirthDate::Text("20/10/2008".into()), today));
    }

    #[test]
    fn malformed_birth_date_is_not_legal() {
        let today = date(2026, 10, 19);
        assert!(!is_legal_age(&BirthDate::Text("2008-10-19".into()), today));
        assert!(!is_legal_age(&BirthDate::Text("31/02/1990".into()), today));
        assert!(!is_legal_age(&BirthDate::Text(String::new()), today));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("ana.souza+x@mail.example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@b.co"));
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("(11) 91234-5678"));
        assert!(!is_valid_phone("11912345678"));
        assert!(!is_valid_phone("(11) 1234-5678"));
        assert!(!is_valid_phone("(11)91234-5678"));
    }

    #[test]
    fn short_postal_code_fails_without_lookup() {
        let dir = FixedDirectory::new(vec!["01310100"]);
        let check = address_exists("0131-010", "Av. Paulista", &dir);
        assert!(!check.valid);
        assert!(check.reason.unwrap().contains("8 digits"));
        assert!(dir.calls.borrow().is_empty());
    }

    #[test]
    fn known_postal_code_passes() {
        let dir = FixedDirectory::new(vec!["01310100"]);
        let check = address_exists("01310-100", "Av. Paulista", &dir);
        assert_eq!(check, AddressCheck::ok());
        assert_eq!(dir.calls.borrow().as_slice(), &["01310100".to_string()]);
    }

    #[test]
    fn unknown_postal_code_fails() {
        let dir = FixedDirectory::new(vec![]);
        let check = address_exists("99999-999", "", &dir);
        assert!(!check.valid);
        assert!(check.reason.unwrap().contains("not found"));
    }

    #[test]
    fn failed_lookup_is_invalid_location() {
        let mut dir = FixedDirectory::new(vec!["01310100"]);
        dir.fail = true;
        let check = address_exists("01310100", "", &dir);
        assert!(!check.valid);
        assert!(check.reason.unwrap().contains("connection refused"));
    }

    #[test]
    fn reasons_follow_rule_order() {
        let result = ValidationResult {
            identity_number: false,
            name: true,
            legal_age: false,
            email: true,
            phone: false,
            location: AddressCheck::fail("x"),
        };
        assert!(!result.is_valid());
        assert_eq!(
            result.reasons(),
            vec!["Invalid identity number.", "Under legal age.", "Invalid phone.", "Invalid location."]
        );
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn repeated_digit_is_invalid(d in 0u8..10) {
                let id: String = std::iter::repeat(char::from(b'0' + d)).take(11).collect();
                prop_assert!(!is_valid_identity_number(&id));
            }

            #[test]
            fn wrong_length_is_invalid(id in "[0-9]{0,10}|[0-9]{12,20}") {
                prop_assert!(!is_valid_identity_number(&id));
            }

            #[test]
            fn eleven_digits_with_two_distinct_is_valid(id in "[0-9]{11}") {
                let first = id.as_bytes()[0];
                prop_assume!(id.bytes().any(|b| b != first));
                prop_assert!(is_valid_identity_number(&id));
            }

            #[test]
            fn names_with_digits_are_invalid(a in "[A-Za-z]{1,8}", b in "[A-Za-z]{0,8}", d in 0u8..10) {
                let name = format!("{a} {b}{d}");
                prop_assert!(!is_valid_name(&name));
            }

            #[test]
            fn eighteenth_birthday_is_legal(y in 1950i32..2000, m in 1u32..=12, d in 1u32..=28) {
                let born = NaiveDate::from_ymd_opt(y, m, d).unwrap();
                let today = NaiveDate::from_ymd_opt(y + 18, m, d).unwrap();
                prop_assert!(is_legal_age(&BirthDate::Date(born), today));
                let day_before = today.pred_opt().unwrap();
                prop_assert!(!is_legal_age(&BirthDate::Date(born), day_before));
            }
        }
    }
}
