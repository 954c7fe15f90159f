use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use stockroom_core::{DomainError, DomainResult, ValueObject};

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-() ]+$").expect("phone pattern compiles"));

/// Contact person of a manufacturer (owned, embedded).
///
/// Email uniqueness across contacts is a store-level constraint; see
/// [`Contact::email_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    name: String,
    email: String,
    phone: Option<String>,
}

impl ValueObject for Contact {}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        let phone = phone.map(|p| p.trim().to_string());

        if name.is_empty() {
            return Err(DomainError::validation("contact name cannot be empty"));
        }
        if !EMAIL_SHAPE.is_match(&email) {
            return Err(DomainError::validation(format!(
                "contact email is not a valid address: {email:?}"
            )));
        }
        if let Some(p) = &phone {
            if !PHONE_SHAPE.is_match(p) {
                return Err(DomainError::validation(format!(
                    "contact phone may only contain digits, '+', '-', '(', ')' and spaces: {p:?}"
                )));
            }
        }

        Ok(Self { name, email, phone })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Key under which email uniqueness is enforced (case-insensitive).
    pub fn email_key(&self) -> String {
        self.email.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_contact() {
        let c = Contact::new(" Ada ", "ada@acme.example", Some("+46 (0)8-123 45".to_string())).unwrap();
        assert_eq!(c.name(), "Ada");
        assert_eq!(c.email(), "ada@acme.example");
        assert_eq!(c.phone(), Some("+46 (0)8-123 45"));
    }

    #[test]
    fn phone_is_optional() {
        let c = Contact::new("Ada", "ada@acme.example", None).unwrap();
        assert_eq!(c.phone(), None);
    }

    #[test]
    fn rejects_empty_name() {
        let err = Contact::new("  ", "ada@acme.example", None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "ada", "ada@acme", "@acme.example", "ada @acme.example", "ada@@acme.example"] {
            let err = Contact::new("Ada", email, None).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "accepted {email:?}");
        }
    }

    #[test]
    fn rejects_phone_with_letters() {
        let err = Contact::new("Ada", "ada@acme.example", Some("call me".to_string())).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_blank_phone() {
        let err = Contact::new("Ada", "ada@acme.example", Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn email_key_is_case_insensitive() {
        let a = Contact::new("Ada", "Ada@Acme.Example", None).unwrap();
        let b = Contact::new("Bob", "ada@acme.example", None).unwrap();
        assert_eq!(a.email_key(), b.email_key());
    }
}
