//! Field validation shared by the configuration value objects.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, WireGuardError};

/// Shape of a base64-encoded 32-byte `WireGuard` key.
///
/// 32 bytes leave 2 significant bits in the 43rd character, hence its
/// restricted alphabet.
pub const WIREGUARD_KEY_PATTERN: &str = r"^[A-Za-z0-9+/]{42}[AEIMQUYcgkosw480]=$";

/// Shape of a Linux network interface name usable by `wg-quick`.
pub const INTERFACE_NAME_PATTERN: &str = r"^[a-zA-Z0-9_=+-]{1,15}$";

/// Shape of a lowercase hex SHA-256 digest.
pub const SHA256_DIGEST_PATTERN: &str = r"^[a-f0-9]{64}$";

static WIREGUARD_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(WIREGUARD_KEY_PATTERN).unwrap_or_else(|_| unreachable!()));

static INTERFACE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(INTERFACE_NAME_PATTERN).unwrap_or_else(|_| unreachable!()));

static SHA256_DIGEST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(SHA256_DIGEST_PATTERN).unwrap_or_else(|_| unreachable!()));

/// Returns whether `value` has the shape of a `WireGuard` key.
#[must_use]
pub fn is_wireguard_key(value: &str) -> bool {
    WIREGUARD_KEY_REGEX.is_match(value)
}

/// Checks that `value` has the shape of a `WireGuard` key.
///
/// The value itself never appears in the error, as it may be secret.
///
/// # Errors
///
/// Returns [`WireGuardError::DataValidation`] naming `field` on mismatch.
pub fn validate_wireguard_key(field: &str, value: &str) -> Result<()> {
    if is_wireguard_key(value) {
        Ok(())
    } else {
        Err(WireGuardError::validation(
            field,
            format!(
                "expected a base64 WireGuard key of 44 characters, got {} characters",
                value.chars().count()
            ),
        ))
    }
}

/// Checks an interface name.
///
/// # Errors
///
/// Returns [`WireGuardError::DataValidation`] if the name does not match
/// [`INTERFACE_NAME_PATTERN`].
pub fn validate_interface_name(value: &str) -> Result<()> {
    if INTERFACE_NAME_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(WireGuardError::validation(
            "name",
            format!("'{value}' must be 1 to 15 characters of [a-zA-Z0-9_=+-]"),
        ))
    }
}

/// Checks a hex SHA-256 digest.
///
/// # Errors
///
/// Returns [`WireGuardError::DataValidation`] naming `field` on mismatch.
pub fn validate_sha256_digest(field: &str, value: &str) -> Result<()> {
    if SHA256_DIGEST_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(WireGuardError::validation(
            field,
            "expected 64 lowercase hexadecimal characters",
        ))
    }
}

/// Checks that `value` holds no line break, so it stays one `.ini` line.
///
/// # Errors
///
/// Returns [`WireGuardError::DataValidation`] naming `field` otherwise.
pub fn validate_single_line(field: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        Err(WireGuardError::validation(field, "must fit on one line"))
    } else {
        Ok(())
    }
}

/// Checks that every named value differs from every other.
///
/// # Errors
///
/// Returns [`WireGuardError::DataValidation`] naming the first equal pair.
pub fn ensure_pairwise_distinct(values: &[(&str, &str)]) -> Result<()> {
    for (index, (field, value)) in values.iter().enumerate() {
        if let Some((other, _)) = values[index + 1..].iter().find(|(_, v)| v == value) {
            return Err(WireGuardError::validation(
                *field,
                format!("must differ from {other}"),
            ));
        }
    }
    Ok(())
}
