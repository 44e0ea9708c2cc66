//! Email value object.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DomainError, DomainResult};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// A normalized (trimmed, lower-cased) and validated email address.
///
/// Immutable once constructed; two values are equal when their normalized
/// strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Normalize and validate a raw email string.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidEmail`] when the value is empty after
    /// trimming or does not look like `local@domain.tld`.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() || !EMAIL_PATTERN.is_match(&normalized) {
            return Err(DomainError::InvalidEmail);
        }

        Ok(Self(normalized))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizes_case_and_whitespace() {
        let variants = [
            "user@example.com",
            "USER@EXAMPLE.COM",
            "  User@Example.Com  ",
            "\tuser@example.COM\n",
        ];

        for raw in variants {
            let email = Email::parse(raw).unwrap();
            assert_eq!(email.as_str(), "user@example.com", "input {raw:?}");
        }
    }

    #[test]
    fn test_email_equality_is_by_value() {
        let a = Email::parse("A@X.com").unwrap();
        let b = Email::parse("a@x.COM").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_email_rejects_malformed_input() {
        let invalid = [
            "",
            "   ",
            "no-at-sign.example.com",
            "user@",
            "@example.com",
            "user@example",
            "user@example.c",
            "user name@example.com",
            "user@exa mple.com",
        ];

        for raw in invalid {
            assert_eq!(
                Email::parse(raw),
                Err(DomainError::InvalidEmail),
                "input {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_email_accepts_plus_and_subdomains() {
        let email = Email::parse("first.last+tag@mail.example.co.uk").unwrap();
        assert_eq!(email.to_string(), "first.last+tag@mail.example.co.uk");
    }
}
