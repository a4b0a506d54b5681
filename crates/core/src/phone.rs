//! Phone number value object.
//!
//! A [`PhoneNumber`] can only be obtained through [`PhoneNumber::parse`],
//! which validates and canonicalizes the input. Past that boundary the rest
//! of the system may assume the value is well-formed, and every storage key
//! derived from it uses the one canonical form.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

/// International form: `+<country code><subscriber>` where the subscriber is
/// 10 digits starting with `9`.
static INTERNATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{1,3}9\d{9}$").expect("valid phone regex"));

/// Local form: `0<subscriber>` with the same 10-digit subscriber rule.
static LOCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^09\d{9}$").expect("valid phone regex"));

/// Country calling code assumed when normalizing a local number.
const LOCAL_COUNTRY_CODE: &str = "+98";

/// A validated phone number in canonical international form.
///
/// Two textual representations of the same number (`09123456789` and
/// `+989123456789`) normalize to the identical canonical string, so equality
/// and storage keys are stable across input styles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and canonicalize a phone number.
    ///
    /// Accepts the international form (`+<cc>9XXXXXXXXX`) or the local form
    /// (`09XXXXXXXXX`, normalized with [`LOCAL_COUNTRY_CODE`]). Surrounding
    /// whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(CoreError::Validation("phone number cannot be empty".into()));
        }

        if input.starts_with('+') {
            if !INTERNATIONAL.is_match(input) {
                return Err(CoreError::Validation(
                    "invalid international phone number: expected +<country code> \
                     followed by 10 digits starting with 9"
                        .into(),
                ));
            }
            return Ok(Self(input.to_string()));
        }

        if let Some(rest) = input.strip_prefix('0') {
            if !LOCAL.is_match(input) {
                return Err(CoreError::Validation(
                    "invalid local phone number: expected 0 followed by 10 digits \
                     starting with 9"
                        .into(),
                ));
            }
            return Ok(Self(format!("{LOCAL_COUNTRY_CODE}{rest}")));
        }

        Err(CoreError::Validation(
            "phone number must start with + (international) or 0 (local)".into(),
        ))
    }

    /// The canonical international representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the value object, yielding the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_number_normalizes_to_international() {
        let phone = PhoneNumber::parse("09123456789").expect("valid local number");
        assert_eq!(phone.as_str(), "+989123456789");
    }

    #[test]
    fn international_number_is_kept_verbatim() {
        let phone = PhoneNumber::parse("+989123456789").expect("valid international number");
        assert_eq!(phone.as_str(), "+989123456789");
    }

    #[test]
    fn equivalent_forms_normalize_identically() {
        let local = PhoneNumber::parse("09123456789").unwrap();
        let international = PhoneNumber::parse("+989123456789").unwrap();
        assert_eq!(local, international);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let phone = PhoneNumber::parse("  09123456789\n").expect("whitespace trimmed");
        assert_eq!(phone.as_str(), "+989123456789");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(PhoneNumber::parse("").is_err());
        assert!(PhoneNumber::parse("   ").is_err());
    }

    #[test]
    fn rejects_subscriber_not_starting_with_9() {
        assert!(PhoneNumber::parse("08123456789").is_err());
        assert!(PhoneNumber::parse("+988123456789").is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        // One digit short and one digit long, both forms.
        assert!(PhoneNumber::parse("0912345678").is_err());
        assert!(PhoneNumber::parse("091234567890").is_err());
        assert!(PhoneNumber::parse("+98912345678").is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(PhoneNumber::parse("9123456789").is_err());
    }

    #[test]
    fn rejects_non_digit_characters() {
        assert!(PhoneNumber::parse("0912345678a").is_err());
        assert!(PhoneNumber::parse("+98912x456789").is_err());
    }
}
