//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so both store backends and the engine enforce
//! the same rules.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Trim and NFC-normalize a user supplied name; empty names are rejected.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(normalized)
}

/// Trim a free text field, keeping an empty string when nothing is left.
pub(crate) fn normalize_text(value: &str) -> String {
    value.trim().nfc().collect()
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::KeyNotFound(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_composed() {
        assert_eq!(normalize_required_name("  Food ", "category").unwrap(), "Food");
        // "e" followed by a combining acute accent becomes a single "é".
        assert_eq!(
            normalize_required_name("Cafe\u{301}", "category").unwrap(),
            "Caf\u{e9}"
        );
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            normalize_required_name(" \t", "wallet"),
            Err(EngineError::InvalidName(
                "wallet name must not be empty".to_string()
            ))
        );
    }
}
