//! Document identifier.

use crate::error::{CoreError, CoreResult};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an identifier in characters.
pub const ID_LEN: usize = 16;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Unique identifier for a document within its collection.
///
/// Identifiers are 16 lowercase hexadecimal characters (64 bits of
/// entropy) and double as the document's file name. They are:
/// - Generated from the OS entropy source without any coordination
///   between processes
/// - Immutable once assigned
/// - Free of path separators, so always a single path segment
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_LEN]);

impl Id {
    /// Generates a new random identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GeneratorUnavailable`] if the operating system
    /// entropy source fails. There is no fallback to a weaker source.
    pub fn generate() -> CoreResult<Self> {
        let mut bytes = [0u8; ID_LEN / 2];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CoreError::generator_unavailable(e.to_string()))?;
        Ok(Self::from_entropy(bytes))
    }

    /// Hex-encodes eight bytes of entropy.
    #[must_use]
    pub fn from_entropy(bytes: [u8; ID_LEN / 2]) -> Self {
        let mut out = [0u8; ID_LEN];
        for (i, b) in bytes.iter().enumerate() {
            out[2 * i] = HEX_DIGITS[usize::from(b >> 4)];
            out[2 * i + 1] = HEX_DIGITS[usize::from(b & 0x0f)];
        }
        Self(out)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever constructed from ASCII hex digits.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns true if `s` is a well-formed identifier.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        s.len() == ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl FromStr for Id {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(CoreError::invalid_id(s));
        }
        let mut bytes = [0u8; ID_LEN];
        bytes.copy_from_slice(s.as_bytes());
        Ok(Self(bytes))
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.as_str())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct IdVisitor;

impl de::Visitor<'_> for IdVisitor {
    type Value = Id;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a 16-character lowercase hexadecimal string")
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Id, E> {
        s.parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(s), &self))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn generate_is_well_formed() {
        let id = Id::generate().unwrap();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(Id::is_valid(id.as_str()));
    }

    #[test]
    fn generate_is_unique() {
        let ids: HashSet<Id> = (0..1000).map(|_| Id::generate().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn from_entropy_encodes_hex() {
        let id = Id::from_entropy([0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(id.as_str(), "0123456789abcdef");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "",
            "0123456789abcde",
            "0123456789abcdef0",
            "0123456789ABCDEF",
            "0123456789abcdeg",
            "01234567/9abcdef",
            "LOCK",
            ".tmp-0123456789a",
        ] {
            assert!(
                matches!(bad.parse::<Id>(), Err(CoreError::InvalidId { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn serialize_as_string() {
        let id: Id = "0123456789abcdef".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0123456789abcdef\"");
    }

    #[test]
    fn deserialize_validates() {
        let id: Id = serde_json::from_str("\"0123456789abcdef\"").unwrap();
        assert_eq!(id.to_string(), "0123456789abcdef");

        assert!(serde_json::from_str::<Id>("\"../etc/passwd\"").is_err());
        assert!(serde_json::from_str::<Id>("42").is_err());
    }

    #[test]
    fn debug_format() {
        let id: Id = "00000000000000ff".parse().unwrap();
        assert_eq!(format!("{id:?}"), "Id(00000000000000ff)");
    }

    proptest! {
        #[test]
        fn entropy_round_trips_through_parse(bytes in any::<[u8; 8]>()) {
            let id = Id::from_entropy(bytes);
            let parsed: Id = id.as_str().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
