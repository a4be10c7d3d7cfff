//! Identifier parsing
//!
//! Operator-supplied identifiers (CLI flags, query strings) arrive both in the
//! canonical hyphenated form and as bare 32-digit hex. Both are accepted.

use uuid::Uuid;

use crate::error::{Result, VstageError};

/// Parse a UUID, ignoring any `-` separators.
///
/// # Errors
///
/// - [`VstageError::InvalidUuidLength`] if the hyphen-stripped input is not
///   exactly 32 characters
/// - [`VstageError::InvalidUuidHex`] if it contains non-hex characters
pub fn parse_uuid(input: &str) -> Result<Uuid> {
    let compact: String = input.chars().filter(|c| *c != '-').collect();
    if compact.len() != 32 {
        return Err(VstageError::InvalidUuidLength);
    }

    let mut bytes = [0u8; 16];
    hex::decode_to_slice(&compact, &mut bytes).map_err(|_| VstageError::InvalidUuidHex)?;

    Ok(Uuid::from_bytes(bytes))
}
