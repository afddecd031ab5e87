//! Small helpers shared across handlers and services: form field validation,
//! random token generation and constant-time comparison.

use chrono::NaiveDate;
use rand::Rng;

/// True if `value` has non-whitespace content.
pub fn validate_not_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Structural email check: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Parse a `Y-m-d` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Hex encoding of `N` random bytes.
pub fn random_token<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    hex::encode(bytes)
}

/// Byte comparison whose duration does not depend on where the inputs differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
