//! Collection name validation.
//!
//! A collection name becomes a directory under the database root, so it
//! must be exactly one portable path segment.

use crate::error::{CoreError, CoreResult};

/// Maximum collection name length in bytes.
pub const MAX_NAME_LEN: usize = 255;

const RESERVED_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Checks that `name` can be used as a collection name.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCollectionName`] if the name is empty, too
/// long, starts with `.`, contains a path separator, a control character
/// or a Windows reserved character, or is a Windows device name.
pub fn validate_collection_name(name: &str) -> CoreResult<()> {
    let reject = |reason| Err(CoreError::invalid_collection_name(name, reason));

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return reject("name is longer than 255 bytes");
    }
    if name.starts_with('.') {
        return reject("name starts with '.'");
    }
    if name.chars().any(|c| c.is_control()) {
        return reject("name contains a control character");
    }
    if name.contains(RESERVED_CHARS) {
        return reject("name contains a path separator or reserved character");
    }
    if name.ends_with(' ') {
        return reject("name ends with a space");
    }
    if is_reserved_name(name) {
        return reject("name is a reserved device name");
    }
    Ok(())
}

/// Returns true if `name` is a valid collection name.
#[must_use]
pub fn is_valid_collection_name(name: &str) -> bool {
    validate_collection_name(name).is_ok()
}

fn is_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        for name in ["items", "users_v2", "Orders-2024", "a", "ümlaut", "con_fig"] {
            assert!(is_valid_collection_name(name), "rejected {name:?}");
        }
    }

    #[test]
    fn rejects_path_tricks() {
        for name in ["", ".", "..", ".hidden", "a/b", "a\\b", "../escape"] {
            assert!(!is_valid_collection_name(name), "accepted {name:?}");
        }
    }

    #[test]
    fn rejects_reserved_characters() {
        for name in ["a<b", "a>b", "a:b", "a\"b", "a|b", "a?b", "a*b", "nul\0byte", "tab\t"] {
            assert!(!is_valid_collection_name(name), "accepted {name:?}");
        }
    }

    #[test]
    fn rejects_device_names() {
        for name in ["CON", "con", "Aux", "NUL.json", "com1", "LPT9.txt"] {
            assert!(!is_valid_collection_name(name), "accepted {name:?}");
        }
        assert!(is_valid_collection_name("COM10"));
        assert!(is_valid_collection_name("console"));
    }

    #[test]
    fn rejects_overlong_names() {
        assert!(is_valid_collection_name(&"x".repeat(MAX_NAME_LEN)));
        assert!(!is_valid_collection_name(&"x".repeat(MAX_NAME_LEN + 1)));
    }

    #[test]
    fn error_carries_reason() {
        let err = validate_collection_name("a/b").unwrap_err();
        match err {
            CoreError::InvalidCollectionName { name, reason } => {
                assert_eq!(name, "a/b");
                assert!(reason.contains("separator"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
