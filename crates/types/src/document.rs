//! Persisted document types.
//!
//! The host editor serializes each node to its own workflow document; this
//! subsystem contributes one `wavespeed` block per node plus three
//! host-visible scalars consumed by downstream execution. Field names are
//! camelCase because the document is owned and read by the JS-side host.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The serialized `wavespeed` block embedded in the host's node document.
///
/// `parameter_values` stores plain values only; array and object containers
/// are reconstructed from the schema on restore. `saved_fields` records which
/// flattened fields existed and which carried a connection, without raw link
/// identifiers (those are owned and renumbered by the host on every save).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    /// Catalog identifier of the model the node was configured for.
    pub model_id: String,
    /// Resolved API path the execution layer submits to.
    pub api_path: String,
    /// Catalog category the model was picked from.
    #[serde(default)]
    pub category: String,
    /// Plain field values keyed by field name, in binding order.
    #[serde(default)]
    pub parameter_values: IndexMap<String, Value>,
    /// One entry per bound field at snapshot time.
    #[serde(default)]
    pub saved_fields: Vec<SavedField>,
    /// Snapshot timestamp, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedDocument {
    /// Clears the restoration-only portions after the document has been
    /// consumed by a restore pass. The identity fields stay so a later
    /// snapshot can be diffed against the original selection.
    pub fn clear_restore_state(&mut self) {
        self.saved_fields.clear();
    }
}

/// Identity and connectedness of one bound field at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedField {
    /// Flattened field name (`image_0`, `prompt`, ...).
    pub name: String,
    /// Whether the field's slot had an incoming link when saved.
    #[serde(default)]
    pub has_link: bool,
    /// Array group the field belonged to, when it was an element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_array_name: Option<String>,
    /// Element index within the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
}

/// The three host-visible scalars consumed by downstream execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandoff {
    /// Resolved API path (the host field is historically named `model_id`).
    pub model_id: String,
    /// JSON-encoded parameter values after per-kind type coercion.
    pub request_json: String,
    /// JSON-encoded per-field metadata map, see [`ParamMapEntry`].
    pub param_map: String,
}

/// Per-field metadata entry inside the `param_map` handoff scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamMapEntry {
    /// Type tag for the execution layer (`string`, `integer`, `number`,
    /// `boolean`, `options`, `array`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Allowed values for option parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    /// Present and true when the entry describes an array container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<bool>,
    /// Element type tag for array containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serializes_with_camel_case_keys() {
        let mut parameter_values = IndexMap::new();
        parameter_values.insert("prompt".to_string(), json!("a cat"));

        let document = PersistedDocument {
            model_id: "wavespeed-ai/flux-dev".into(),
            api_path: "/api/v3/wavespeed-ai/flux-dev".into(),
            category: "text-to-image".into(),
            parameter_values,
            saved_fields: vec![SavedField {
                name: "image_0".into(),
                has_link: true,
                parent_array_name: Some("images".into()),
                array_index: Some(0),
            }],
            saved_at: None,
        };

        let encoded = serde_json::to_value(&document).expect("serialize document");
        assert_eq!(encoded["modelId"], json!("wavespeed-ai/flux-dev"));
        assert_eq!(encoded["apiPath"], json!("/api/v3/wavespeed-ai/flux-dev"));
        assert_eq!(encoded["savedFields"][0]["hasLink"], json!(true));
        assert_eq!(encoded["savedFields"][0]["parentArrayName"], json!("images"));
    }

    #[test]
    fn missing_optional_sections_deserialize_to_defaults() {
        let document: PersistedDocument =
            serde_json::from_value(json!({ "modelId": "m", "apiPath": "/api/v3/m" })).expect("deserialize minimal document");
        assert!(document.parameter_values.is_empty());
        assert!(document.saved_fields.is_empty());
        assert!(document.category.is_empty());
    }

    #[test]
    fn clear_restore_state_drops_saved_fields_only() {
        let mut document = PersistedDocument {
            model_id: "m".into(),
            api_path: "/api/v3/m".into(),
            saved_fields: vec![SavedField {
                name: "prompt".into(),
                has_link: false,
                parent_array_name: None,
                array_index: None,
            }],
            ..PersistedDocument::default()
        };
        document.parameter_values.insert("prompt".into(), json!("kept"));

        document.clear_restore_state();

        assert!(document.saved_fields.is_empty());
        assert_eq!(document.parameter_values.get("prompt"), Some(&json!("kept")));
        assert_eq!(document.model_id, "m");
    }

    #[test]
    fn param_map_entry_uses_js_facing_key_names() {
        let entry = ParamMapEntry {
            kind: "array".into(),
            options: None,
            is_array: Some(true),
            item_type: Some("string".into()),
        };
        let encoded = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(encoded, json!({ "type": "array", "isArray": true, "itemType": "string" }));
    }
}
