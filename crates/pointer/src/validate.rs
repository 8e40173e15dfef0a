//! Validation functions for JSON Pointer.

use thiserror::Error;

/// Maximum allowed pointer string length.
const MAX_POINTER_LENGTH: usize = 4096;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("Invalid escape sequence")]
    InvalidEscape,
    #[error("Invalid relative pointer prefix")]
    InvalidRelativePrefix,
}

/// Validate a JSON Pointer string.
///
/// # Errors
///
/// - The pointer is non-empty but doesn't start with `/`
/// - A `~` is not followed by `0` or `1`
/// - The pointer exceeds the maximum length
///
/// ```
/// use jsv_pointer::validate_json_pointer;
///
/// validate_json_pointer("").unwrap();
/// validate_json_pointer("/foo/bar").unwrap();
/// validate_json_pointer("foo").unwrap_err();
/// validate_json_pointer("/a~2").unwrap_err();
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(ValidationError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(ValidationError::PointerTooLong);
    }
    check_escapes(pointer)
}

fn check_escapes(pointer: &str) -> Result<(), ValidationError> {
    let mut chars = pointer.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return Err(ValidationError::InvalidEscape);
        }
    }
    Ok(())
}

/// Validate a relative JSON Pointer (`0`, `1/foo`, `2#`).
///
/// The prefix is a non-negative integer without leading zeros, followed by
/// either `#` or a JSON Pointer.
///
/// ```
/// use jsv_pointer::validate_relative_json_pointer;
///
/// validate_relative_json_pointer("0").unwrap();
/// validate_relative_json_pointer("1/foo~1bar").unwrap();
/// validate_relative_json_pointer("2#").unwrap();
/// validate_relative_json_pointer("/foo").unwrap_err();
/// validate_relative_json_pointer("01").unwrap_err();
/// ```
pub fn validate_relative_json_pointer(pointer: &str) -> Result<(), ValidationError> {
    let digits = pointer.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && pointer.starts_with('0')) {
        return Err(ValidationError::InvalidRelativePrefix);
    }
    let rest = &pointer[digits..];
    if rest == "#" {
        return Ok(());
    }
    validate_json_pointer(rest)
}
