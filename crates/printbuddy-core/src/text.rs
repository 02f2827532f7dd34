//! Fixed-capacity text fields.
//!
//! Several configuration and telemetry fields are bounded (printer name,
//! API key, host, credentials, error text). [`FixedText`] enforces the bound
//! on every write instead of truncating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// A value did not fit into a fixed-capacity text field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("text of {len} bytes exceeds capacity of {capacity} bytes")]
pub struct TextTooLong {
    pub len: usize,
    pub capacity: usize,
}

/// UTF-8 text holding at most `CAP` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedText<const CAP: usize>(String);

impl<const CAP: usize> FixedText<CAP> {
    /// Maximum length in bytes.
    pub const CAPACITY: usize = CAP;

    pub fn new() -> Self {
        Self(String::new())
    }

    /// Replace the content, rejecting values longer than `CAP` bytes.
    ///
    /// On error the previous content is kept.
    pub fn set(&mut self, value: &str) -> Result<(), TextTooLong> {
        if value.len() > CAP {
            return Err(TextTooLong {
                len: value.len(),
                capacity: CAP,
            });
        }
        self.0.clear();
        self.0.push_str(value);
        Ok(())
    }

    /// Replace the content, cutting `value` at the last char boundary that
    /// fits. Used for messages reported by backends.
    pub fn set_truncated(&mut self, value: &str) {
        let mut end = value.len().min(CAP);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        self.0.clear();
        self.0.push_str(&value[..end]);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const CAP: usize> Deref for FixedText<CAP> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const CAP: usize> fmt::Display for FixedText<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const CAP: usize> TryFrom<&str> for FixedText<CAP> {
    type Error = TextTooLong;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut text = Self::new();
        text.set(value)?;
        Ok(text)
    }
}

impl<const CAP: usize> TryFrom<String> for FixedText<CAP> {
    type Error = TextTooLong;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() > CAP {
            return Err(TextTooLong {
                len: value.len(),
                capacity: CAP,
            });
        }
        Ok(Self(value))
    }
}

impl<const CAP: usize> From<FixedText<CAP>> for String {
    fn from(value: FixedText<CAP>) -> Self {
        value.0
    }
}

impl<const CAP: usize> PartialEq<str> for FixedText<CAP> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<const CAP: usize> PartialEq<&str> for FixedText<CAP> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_up_to_capacity() {
        let text = FixedText::<5>::try_from("abcde").unwrap();
        assert_eq!(text, "abcde");
        assert_eq!(FixedText::<5>::CAPACITY, 5);
    }

    #[test]
    fn test_rejects_over_capacity_and_keeps_previous() {
        let mut text = FixedText::<5>::try_from("abc").unwrap();
        let err = text.set("abcdef").unwrap_err();
        assert_eq!(
            err,
            TextTooLong {
                len: 6,
                capacity: 5
            }
        );
        assert_eq!(text, "abc");
    }

    #[test]
    fn test_set_truncated_respects_char_boundary() {
        let mut text = FixedText::<5>::new();
        text.set_truncated("abcdefgh");
        assert_eq!(text.as_str(), "abcde");

        // 'é' is two bytes and would straddle the limit
        text.set_truncated("abcdé");
        assert_eq!(text.as_str(), "abcd");

        text.set_truncated("ok");
        assert_eq!(text.as_str(), "ok");
    }

    #[test]
    fn test_capacity_counts_bytes() {
        // "ü" is two bytes in UTF-8
        assert!(FixedText::<3>::try_from("üa").is_ok());
        assert!(FixedText::<3>::try_from("üü").is_err());
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: FixedText<4> = serde_json::from_str("\"abcd\"").unwrap();
        assert_eq!(ok, "abcd");
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"abcd\"");

        let err = serde_json::from_str::<FixedText<4>>("\"abcde\"");
        assert!(err.is_err());
    }
}
