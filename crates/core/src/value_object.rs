//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A syntactically plausible email address (trimmed, lowercased).
///
/// Deliverability is the identity provider's concern; this only rejects input
/// that can never be an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim().to_lowercase();
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::validation("email must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::validation(format!("'{raw}' is not an email address")));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email must not contain whitespace"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Form inputs send blank optional fields as null.
pub fn blank_to_none(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = EmailAddress::parse("  Yunus@Demo.com ").unwrap();
        assert_eq!(email.as_str(), "yunus@demo.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "plain", "@demo.com", "yunus@", "a@b@c", "a b@c.com"] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw:?} accepted");
        }
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(blank_to_none("   "), None);
        assert_eq!(blank_to_none("x"), Some("x".to_string()));
    }
}
