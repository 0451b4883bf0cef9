use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::{RelmapError, Result};
use crate::resolution::RelationshipResolver;
use crate::types::{FieldMeta, RelationMeta};

/// Field and relation metadata of one schema, as exported in a schema
/// snapshot.
///
/// Snapshot files carry more than this (`version`, `collections`, per-field
/// types); everything but the two lists is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
    #[serde(default)]
    pub relations: Vec<RelationMeta>,
}

impl SchemaCatalog {
    pub fn new(fields: Vec<FieldMeta>, relations: Vec<RelationMeta>) -> Self {
        Self { fields, relations }
    }

    /// Parses a schema snapshot from a JSON string.
    ///
    /// Snapshot endpoints wrap the payload in a `data` envelope; exported
    /// files do not. Either way the payload must be a JSON object.
    pub fn from_snapshot_str(contents: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(contents)?;
        let payload = match document {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };

        if !payload.is_object() {
            return Err(serde_json::Error::custom("snapshot payload must be a JSON object").into());
        }

        Ok(serde_json::from_value(payload)?)
    }

    /// Reads and parses a schema snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| RelmapError::Catalog {
            message: format!("failed to read snapshot: {}", e),
            path: path.display().to_string(),
        })?;

        let catalog = Self::from_snapshot_str(&contents).map_err(|e| RelmapError::Catalog {
            message: format!("failed to parse snapshot: {}", e),
            path: path.display().to_string(),
        })?;

        info!(
            path = %path.display(),
            fields = catalog.fields.len(),
            relations = catalog.relations.len(),
            "loaded schema snapshot"
        );
        Ok(catalog)
    }

    /// Distinct collection names declared in the field list, in first-seen order.
    pub fn collections(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for field in &self.fields {
            if !seen.contains(&field.collection.as_str()) {
                seen.push(field.collection.as_str());
            }
        }
        seen
    }

    /// Returns a resolver borrowing this catalog's metadata.
    pub fn resolver(&self) -> RelationshipResolver<'_> {
        RelationshipResolver::new(&self.fields, &self.relations)
    }
}
