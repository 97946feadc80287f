use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A selectable reference-data entry, normalised from a raw entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupOption {
    pub id: String,
    /// Never empty: falls back to `id`.
    pub label: String,
}

impl LookupOption {
    /// Normalise a raw entity.
    ///
    /// The label is the first non-blank string among `label_fields`, or the
    /// id. Entities without a string `id` yield `None`.
    pub fn from_entity(entity: &Value, label_fields: &[&str]) -> Option<Self> {
        let id = entity
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())?;

        let label = label_fields
            .iter()
            .find_map(|field| {
                entity
                    .get(*field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(id);

        Some(Self {
            id: id.to_owned(),
            label: label.to_owned(),
        })
    }
}
