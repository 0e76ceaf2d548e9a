//! Document descriptors.
//!
//! A descriptor names the index a view searches and, optionally, the
//! engine-side kinds of its fields. Compilation itself only consults the
//! index name, the id field and the mapping name; the field table is
//! carried for tooling and for the pre-7 mapping-type gates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Engine-side kind of one indexed field.
///
/// Unit kinds serialize as plain strings, container kinds as single-key
/// objects, so a descriptor reads like a trimmed-down engine mapping:
///
/// ```json
/// {"title": "text", "location": "geo_point",
///  "tags": {"list": {"of": "keyword"}},
///  "city": {"nested": {"properties": {"name": "text"}}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Keyword,
    Integer,
    Float,
    Boolean,
    Date,
    GeoPoint,
    GeoShape,
    Completion,
    Attachment,
    Object {
        #[serde(default)]
        properties: BTreeMap<String, FieldKind>,
    },
    Nested {
        #[serde(default)]
        properties: BTreeMap<String, FieldKind>,
    },
    List {
        of: Box<FieldKind>,
    },
}

/// Declarative description of one searchable index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Index or alias name the view searches.
    pub index: String,
    /// Mapping type name. Only consulted when the engine version is
    /// below 7, where document types still exist on the wire.
    #[serde(default)]
    pub mapping: Option<String>,
    /// Field carrying the stable document id. When this is `id` the
    /// detail action uses the engine's direct document GET; any other
    /// field is resolved through a term filter.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Known fields, keyed by path.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldKind>,
}

fn default_id_field() -> String {
    "id".to_owned()
}

impl DocumentDescriptor {
    pub fn new(index: impl Into<String>) -> Self {
        DocumentDescriptor {
            index: index.into(),
            mapping: None,
            id_field: default_id_field(),
            fields: BTreeMap::new(),
        }
    }
}
