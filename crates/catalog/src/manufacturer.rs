use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, FieldUpdate, ManufacturerId, ValueObject};

use crate::contact::Contact;

/// Structured postal address; every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl ValueObject for Address {}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none() && self.city.is_none() && self.zip_code.is_none() && self.country.is_none()
    }
}

/// Input for creating a manufacturer (explicitly or through product writes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturerDraft {
    pub name: String,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub contact: Option<Contact>,
}

impl ManufacturerDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The dedup key: the name with surrounding whitespace removed.
    pub fn dedup_key(&self) -> &str {
        self.name.trim()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.dedup_key().is_empty() {
            return Err(DomainError::validation("manufacturer name cannot be empty"));
        }
        Ok(())
    }
}

/// How a product write refers to its manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManufacturerInput {
    /// Reference to an existing manufacturer record.
    Existing(ManufacturerId),
    /// Embedded manufacturer data, resolved by name (created on first sight).
    Details(ManufacturerDraft),
}

/// Partial update of a manufacturer through the explicit update path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturerChanges {
    pub name: FieldUpdate<String>,
    pub country: FieldUpdate<String>,
    pub website: FieldUpdate<String>,
    pub description: FieldUpdate<String>,
    pub address: FieldUpdate<Address>,
    pub contact: FieldUpdate<Contact>,
}

impl ManufacturerChanges {
    pub fn validate(&self) -> DomainResult<()> {
        match &self.name {
            FieldUpdate::Clear => Err(DomainError::validation("manufacturer name cannot be cleared")),
            FieldUpdate::Set(name) if name.trim().is_empty() => {
                Err(DomainError::validation("manufacturer name cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// New dedup key, if this update renames the manufacturer.
    pub fn new_name(&self) -> Option<&str> {
        match &self.name {
            FieldUpdate::Set(name) => Some(name.trim()),
            _ => None,
        }
    }
}

/// Manufacturer entity. Referenced (never owned) by products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    id: ManufacturerId,
    name: String,
    country: Option<String>,
    website: Option<String>,
    description: Option<String>,
    address: Option<Address>,
    contact: Option<Contact>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Manufacturer {
    pub fn create(id: ManufacturerId, draft: ManufacturerDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self::restore(id, draft, now, now))
    }

    /// Rebuild a previously validated record (store rehydration).
    pub fn restore(
        id: ManufacturerId,
        draft: ManufacturerDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            country: draft.country,
            website: draft.website,
            description: draft.description,
            address: draft.address.filter(|a| !a.is_empty()),
            contact: draft.contact,
            created_at,
            updated_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn apply_changes(&mut self, changes: ManufacturerChanges, now: DateTime<Utc>) -> DomainResult<()> {
        changes.validate()?;

        if let FieldUpdate::Set(name) = changes.name {
            self.name = name.trim().to_string();
        }
        changes.country.apply_to(&mut self.country);
        changes.website.apply_to(&mut self.website);
        changes.description.apply_to(&mut self.description);
        changes.address.apply_to(&mut self.address);
        changes.contact.apply_to(&mut self.contact);
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Manufacturer {
    type Id = ManufacturerId;

    fn id(&self) -> ManufacturerId {
        self.id
    }
}
