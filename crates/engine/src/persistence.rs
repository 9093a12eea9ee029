//! Snapshot, restore, and the execution handoff.
//!
//! The host serializes each node on every save and replays the document on
//! load and undo. This module turns registry state into the persisted
//! `wavespeed` block and back, and builds the three host-visible scalars
//! downstream execution consumes.
//!
//! Restore is best-effort forward reconciliation: the saved document was
//! written against whatever schema the model had at save time, and the
//! model may have changed upstream since. Saved fields that no longer
//! exist are dropped with a diagnostic line; new fields take their schema
//! defaults.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};
use wavespeed_schema::{expand_parameters, parse_input_schema};
use wavespeed_types::{ExecutionHandoff, FieldRole, ParamKind, ParamMapEntry, PersistedDocument, SavedField};
use wavespeed_util::coerce::coerce_value;

use crate::host::GraphHost;
use crate::registry::BindingRegistry;

/// Identity of the active model, carried alongside the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIdentity {
    /// Catalog identifier of the model.
    pub model_id: String,
    /// Resolved API path requests are submitted to.
    pub api_path: String,
    /// Catalog category the model was picked from.
    pub category: String,
}

/// Source of input schemas for the restore path. Implemented by the catalog
/// controller; tests plug in stubs.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetches the current input schema of `model_id`.
    async fn fetch_schema(&self, model_id: &str) -> Result<Value>;
}

/// What a restore pass accomplished.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Saved values that found a binding to land in.
    pub restored_values: usize,
    /// Slots created ahead of activation for the host's link restoration.
    pub pre_created_slots: usize,
    /// Saved fields absent from the current schema, silently dropped.
    pub dropped_fields: Vec<String>,
}

/// Serializes the registry into a persisted document.
///
/// Values are emitted only for fields that hold one, are not containers
/// (arrays and objects are reconstructed from the schema), and are not
/// currently satisfied by an incoming connection; a connected field's
/// transient value must not silently reappear when the link is removed
/// later. Link identifiers themselves are never written, only
/// connectedness, because the host renumbers links on every save.
pub fn snapshot(identity: &ModelIdentity, registry: &BindingRegistry, host: &dyn GraphHost) -> PersistedDocument {
    let mut parameter_values = IndexMap::new();
    let mut saved_fields = Vec::new();

    for (name, binding) in registry.bindings() {
        let has_link = binding.slot.is_some_and(|slot| host.slot_has_link(slot));
        let (parent_array_name, array_index) = match &binding.descriptor.role {
            FieldRole::Element { parent, index } => (Some(parent.clone()), Some(*index)),
            FieldRole::GroupTitle { parent } => (Some(parent.clone()), None),
            FieldRole::Scalar => (None, None),
        };
        saved_fields.push(SavedField {
            name: name.to_string(),
            has_link,
            parent_array_name,
            array_index,
        });

        if !binding.descriptor.holds_value() || has_link {
            continue;
        }
        if let Some(value) = registry.value(name) {
            if matches!(value, Value::Array(_) | Value::Object(_)) {
                continue;
            }
            parameter_values.insert(name.to_string(), value.clone());
        }
    }

    PersistedDocument {
        model_id: identity.model_id.clone(),
        api_path: identity.api_path.clone(),
        category: identity.category.clone(),
        parameter_values,
        saved_fields,
        saved_at: Some(Utc::now()),
    }
}

/// Rebuilds registry state from a persisted document.
///
/// Sequence: (1) re-fetch and parse the saved model's schema, (2) expand,
/// (3) pre-create slots for saved fields so the host's link restoration
/// finds them by name, (4) activate with restored values applied at
/// construction, (5) re-apply values as an idempotent second pass for
/// controls created before their value was known. The document's
/// restoration-only state is cleared once consumed.
pub async fn restore(
    document: &mut PersistedDocument,
    provider: &dyn SchemaProvider,
    registry: &mut BindingRegistry,
    host: &mut dyn GraphHost,
) -> RestoreReport {
    let schema = match provider.fetch_schema(&document.model_id).await {
        Ok(schema) => schema,
        Err(error) => {
            warn!(model_id = %document.model_id, %error, "schema fetch failed during restore; node will have no parameters");
            Value::Null
        }
    };

    let descriptors = parse_input_schema(&schema);
    let fields = expand_parameters(&descriptors);

    let pre_created_slots = registry.pre_create_slots(host, &fields, &document.saved_fields);

    let field_names: HashSet<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    let dropped_fields: Vec<String> = document
        .saved_fields
        .iter()
        .filter(|saved| !field_names.contains(saved.name.as_str()))
        .map(|saved| saved.name.clone())
        .collect();
    for name in &dropped_fields {
        debug!(field = %name, "saved field no longer exists in current schema; dropping");
    }

    registry.seed_values(document.parameter_values.clone());
    registry.activate(host, &fields);

    let mut restored_values = 0;
    for (name, value) in &document.parameter_values {
        if let Some(binding) = registry.binding(name) {
            host.set_control_value(binding.control, value);
            restored_values += 1;
        }
    }

    document.clear_restore_state();

    RestoreReport {
        restored_values,
        pre_created_slots,
        dropped_fields,
    }
}

/// Builds the three host-visible scalars consumed by downstream execution:
/// `model_id` (the resolved api path), `request_json` (coerced parameter
/// values, with element values gathered back into their arrays), and
/// `param_map` (per-parameter type metadata).
pub fn execution_handoff(identity: &ModelIdentity, registry: &BindingRegistry) -> ExecutionHandoff {
    let mut request_body: IndexMap<String, Value> = IndexMap::new();
    let mut param_map: IndexMap<String, ParamMapEntry> = IndexMap::new();
    let mut group_values: IndexMap<String, Vec<(usize, Value)>> = IndexMap::new();

    for (name, binding) in registry.bindings() {
        match &binding.descriptor.role {
            FieldRole::GroupTitle { parent } => {
                param_map.entry(parent.clone()).or_insert_with(|| group_entry(binding));
            }
            FieldRole::Element { parent, index } => {
                param_map.entry(parent.clone()).or_insert_with(|| group_entry(binding));
                if let Some(value) = registry.value(name) {
                    let coerced = coerce_element_value(binding, value);
                    if !is_empty_value(&coerced) {
                        group_values.entry(parent.clone()).or_default().push((*index, coerced));
                    }
                }
            }
            FieldRole::Scalar => {
                param_map.insert(name.to_string(), scalar_entry(binding));
                if let Some(value) = registry.value(name) {
                    let coerced = coerce_value(value, binding.descriptor.kind);
                    if !is_empty_value(&coerced) {
                        request_body.insert(name.to_string(), coerced);
                    }
                }
            }
        }
    }

    for (parent, mut elements) in group_values {
        elements.sort_by_key(|(index, _)| *index);
        let values: Vec<Value> = elements.into_iter().map(|(_, value)| value).collect();
        if !values.is_empty() {
            request_body.insert(parent, Value::Array(values));
        }
    }

    ExecutionHandoff {
        model_id: identity.api_path.clone(),
        request_json: encode(&request_body),
        param_map: encode(&param_map),
    }
}

fn scalar_entry(binding: &crate::registry::FieldBinding) -> ParamMapEntry {
    let options = if binding.descriptor.kind == ParamKind::Enum {
        Some(binding.descriptor.enum_options.iter().map(|option| option.value.clone()).collect())
    } else {
        None
    };
    ParamMapEntry {
        kind: binding.descriptor.kind.request_type().to_string(),
        options,
        is_array: None,
        item_type: None,
    }
}

fn group_entry(binding: &crate::registry::FieldBinding) -> ParamMapEntry {
    // Titles carry the array kind; elements carry the item shape through
    // their object-field list.
    let item_type = match binding.descriptor.kind {
        ParamKind::ArrayOfObject => "object",
        ParamKind::ArrayOfPrimitive => "string",
        _ if !binding.descriptor.object_fields.is_empty() => "object",
        _ => "string",
    };
    ParamMapEntry {
        kind: "array".to_string(),
        options: None,
        is_array: Some(true),
        item_type: Some(item_type.to_string()),
    }
}

fn coerce_element_value(binding: &crate::registry::FieldBinding, value: &Value) -> Value {
    // Object-array rows are edited as JSON text; hand them to the API as
    // real objects when they parse.
    if !binding.descriptor.object_fields.is_empty()
        && let Some(text) = value.as_str()
        && let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(text)
    {
        return parsed;
    }
    coerce_value(value, binding.descriptor.kind)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn encode<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        warn!(%error, "handoff encoding failed");
        "{}".to_string()
    })
}
