//! Explicit field presence for partial updates.
//!
//! Update payloads must distinguish "field not supplied" from "field supplied
//! with a falsy value" (`0`, `""`). `FieldUpdate<T>` is that marker: a missing
//! key deserializes to `Unchanged` (via `#[serde(default)]`), an explicit
//! `null` to `Clear`, and any other value to `Set`.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// The field was absent from the payload: keep the stored value.
    Unchanged,
    /// The field was present with `null`: clear the stored value.
    Clear,
    /// The field was present with a value: overwrite.
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            FieldUpdate::Unchanged => FieldUpdate::Unchanged,
            FieldUpdate::Clear => FieldUpdate::Clear,
            FieldUpdate::Set(v) => FieldUpdate::Set(f(v)),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<FieldUpdate<U>, E> {
        Ok(match self {
            FieldUpdate::Unchanged => FieldUpdate::Unchanged,
            FieldUpdate::Clear => FieldUpdate::Clear,
            FieldUpdate::Set(v) => FieldUpdate::Set(f(v)?),
        })
    }

    /// Apply to an optional slot.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Clear => *slot = None,
            FieldUpdate::Set(v) => *slot = Some(v),
        }
    }
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets, `None` clears. There is no `Option` spelling of `Unchanged`.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldUpdate::Set(v),
            None => FieldUpdate::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldUpdate<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(FieldUpdate::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        stock: FieldUpdate<i64>,
        #[serde(default)]
        description: FieldUpdate<String>,
    }

    #[test]
    fn absent_key_is_unchanged() {
        let p: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.stock, FieldUpdate::Unchanged);
        assert_eq!(p.description, FieldUpdate::Unchanged);
    }

    #[test]
    fn falsy_values_are_set_not_skipped() {
        let p: Payload = serde_json::from_str(r#"{"stock": 0, "description": ""}"#).unwrap();
        assert_eq!(p.stock, FieldUpdate::Set(0));
        assert_eq!(p.description, FieldUpdate::Set(String::new()));
    }

    #[test]
    fn explicit_null_clears() {
        let p: Payload = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(p.description, FieldUpdate::Clear);
        assert_eq!(p.stock, FieldUpdate::Unchanged);
    }

    #[test]
    fn apply_to_optional_slot() {
        let mut slot = Some("old".to_string());
        FieldUpdate::Unchanged.apply_to(&mut slot);
        assert_eq!(slot.as_deref(), Some("old"));
        FieldUpdate::Set(String::new()).apply_to(&mut slot);
        assert_eq!(slot.as_deref(), Some(""));
        FieldUpdate::Clear.apply_to(&mut slot);
        assert_eq!(slot, None);
    }
}
