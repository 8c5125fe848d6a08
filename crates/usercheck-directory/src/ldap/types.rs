//! Directory search types

use ldap3::{Scope, SearchEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Search Criteria
// ============================================================================

/// A single search request, built fresh for every call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub base_dn: String,
    pub scope: Scope,
    pub filter: String,
    pub attributes: Vec<String>,
}

// ============================================================================
// Search Results
// ============================================================================

/// One entry returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_values<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Values of an attribute. Attribute names match case-insensitively,
    /// the values themselves are returned verbatim.
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }
}

/// Outcome of a user check
///
/// Existence and membership are kept apart; the HTTP surface only reports
/// `member`, which is false whenever `found` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCheck {
    pub found: bool,
    pub member: bool,
}

impl UserCheck {
    pub fn not_found() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_ignores_name_case() {
        let entry = DirectoryEntry::new("CN=jdoe,OU=People,DC=domain,DC=com")
            .with_values("memberOf", ["CN=a,DC=domain,DC=com"])
            .with_values("mail", ["jdoe@domain.com"]);

        assert_eq!(entry.values("memberof"), ["CN=a,DC=domain,DC=com"]);
        assert_eq!(entry.values("MEMBEROF").len(), 1);
        assert_eq!(entry.first("Mail"), Some("jdoe@domain.com"));
        assert!(entry.values("sn").is_empty());
        assert_eq!(entry.first("givenName"), None);
    }
}
