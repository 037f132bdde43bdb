//! Text normalization shared by the validators, the reconciler and the feed.

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// NFKD-decompose and drop combining marks: "João" -> "Joao".
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| canonical_combining_class(*c) == 0).collect()
}

/// Keep ASCII digits only: "111.222.333-44" -> "11122233344".
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Trim + lowercase, the form both sides are compared in.
pub fn comparison_key(text: &str) -> String {
    text.trim().to_lowercase()
}
