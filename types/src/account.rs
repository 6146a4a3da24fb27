//! Opaque account identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Identity of a governance participant.
///
/// The engine never interprets the key: callers hand over an identity that
/// their own authentication layer has already vouched for. Ordering is the
/// byte order of the underlying string, which keeps ordered maps stable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Maximum accepted length of an account key in bytes.
    pub const MAX_LEN: usize = 128;

    /// Wrap a raw key without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse a key, rejecting empty, over-long or whitespace-carrying input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        if raw.is_empty() {
            return Err(TypesError::InvalidAccountId("empty key".into()));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(TypesError::InvalidAccountId(format!(
                "key is {} bytes, limit is {}",
                raw.len(),
                Self::MAX_LEN
            )));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidAccountId(format!(
                "key {raw:?} contains whitespace"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_plain_key() {
        let id = AccountId::parse("alice").unwrap();
        assert_eq!(id.as_str(), "alice");
        assert_eq!(id.to_string(), "alice");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(AccountId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_whitespace() {
        assert!(AccountId::parse("al ice").is_err());
        assert!(AccountId::parse("bob\n").is_err());
    }

    #[test]
    fn test_parse_rejects_over_long() {
        let raw = "x".repeat(AccountId::MAX_LEN + 1);
        assert!(AccountId::parse(&raw).is_err());
        let raw = "x".repeat(AccountId::MAX_LEN);
        assert!(AccountId::parse(&raw).is_ok());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(AccountId::new("a") < AccountId::new("b"));
        assert!(AccountId::new("ab") > AccountId::new("a"));
    }
}
