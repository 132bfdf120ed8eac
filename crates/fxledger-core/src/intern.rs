//! Shared string handles for commodity codes and account names.
//!
//! Commodity mnemonics and account names repeat on nearly every split of a
//! ledger snapshot. [`InternedStr`] stores the text once behind an `Arc` so
//! cloning a handle into maps and price series is a reference-count bump.
//!
//! # Example
//!
//! ```
//! use fxledger_core::intern::InternedStr;
//!
//! let a = InternedStr::new("Assets:Broker");
//! let b = a.clone();
//!
//! assert!(a.ptr_eq(&b));
//! assert_eq!(a, "Assets:Broker");
//! ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A cheaply clonable, immutable string.
///
/// Equality, ordering and hashing follow the string content, so two handles
/// created independently from the same text compare equal.
#[derive(Debug, Clone, Eq)]
pub struct InternedStr(Arc<str>);

impl InternedStr {
    /// Create a new handle owning `s`.
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// Get the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if two handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Serialize for InternedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InternedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

impl PartialEq for InternedStr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl PartialOrd for InternedStr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedStr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::hash::Hash for InternedStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Display for InternedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for InternedStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for InternedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for InternedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InternedStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InternedStr {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Self> for InternedStr {
    fn from(s: &Self) -> Self {
        s.clone()
    }
}

impl PartialEq<str> for InternedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for InternedStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_content_equality() {
        let a = InternedStr::new("USD");
        let b = InternedStr::new(String::from("USD"));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(InternedStr::from("Assets:Bank"));
        assert!(set.contains("Assets:Bank"));
        assert!(!set.contains("Assets:Cash"));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let s = InternedStr::from("EUR");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: InternedStr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, "EUR");
    }
}
