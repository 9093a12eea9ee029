//! Schema-to-descriptor conversion.
//!
//! The upstream catalog serves a JSON-Schema-like `input_schema` per model.
//! Parsing degrades rather than fails: a document without a `properties`
//! map yields an empty descriptor list, and a property that cannot be
//! understood falls back to a plain text parameter.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use wavespeed_types::{ARRAY_ITEM_CEILING, EnumOption, NumericBounds, ParamKind, ParameterDescriptor};
use wavespeed_util::names::{display_name, is_media_role};

/// Top-level shape of an input-schema document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSchema {
    properties: Option<IndexMap<String, Value>>,
    required: Vec<String>,
    #[serde(rename = "x-order-properties")]
    order_hint: Option<Vec<String>>,
}

/// One property entry. Every attribute is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawProperty {
    #[serde(rename = "type")]
    type_name: Option<String>,
    r#enum: Vec<Value>,
    default: Option<Value>,
    description: Option<String>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    step: Option<f64>,
    #[serde(rename = "maxItems")]
    max_items: Option<usize>,
    items: Option<RawItems>,
    disabled: bool,
    hidden: bool,
}

/// Item schema of an array property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawItems {
    #[serde(rename = "type")]
    type_name: Option<String>,
    properties: Option<IndexMap<String, Value>>,
}

/// Parses a raw input-schema document into an ordered descriptor list.
///
/// Ordering follows the schema's `x-order-properties` hint when present
/// (names missing from `properties` are skipped); otherwise declaration
/// order applies. Disabled or hidden properties never produce a descriptor.
/// A document without a `properties` map parses to an empty list: callers
/// must treat "no parameters" as a valid, silent outcome.
pub fn parse_input_schema(raw: &Value) -> Vec<ParameterDescriptor> {
    let schema: RawSchema = match serde_json::from_value(raw.clone()) {
        Ok(schema) => schema,
        Err(error) => {
            warn!(%error, "input schema did not deserialize; treating as empty");
            return Vec::new();
        }
    };

    let Some(properties) = schema.properties else {
        debug!("input schema has no properties map");
        return Vec::new();
    };

    let ordered_names: Vec<String> = match &schema.order_hint {
        Some(hint) => hint.iter().filter(|name| properties.contains_key(*name)).cloned().collect(),
        None => properties.keys().cloned().collect(),
    };

    ordered_names
        .iter()
        .filter_map(|name| {
            let raw_property = parse_property(name, &properties[name.as_str()]);
            build_descriptor(name, raw_property, &schema.required)
        })
        .collect()
}

fn parse_property(name: &str, value: &Value) -> RawProperty {
    match serde_json::from_value::<RawProperty>(value.clone()) {
        Ok(property) => property,
        Err(error) => {
            warn!(property = name, %error, "malformed property entry; treating as plain text");
            RawProperty::default()
        }
    }
}

fn build_descriptor(name: &str, property: RawProperty, required: &[String]) -> Option<ParameterDescriptor> {
    if property.disabled || property.hidden {
        return None;
    }

    let kind = kind_for(name, &property);
    let enum_options = enum_options_for(&property);
    let default = default_for(name, kind, &property, &enum_options);
    let max_items = if kind.is_array() {
        Some(property.max_items.unwrap_or(ARRAY_ITEM_CEILING).min(ARRAY_ITEM_CEILING))
    } else {
        None
    };
    let object_fields = if kind == ParamKind::ArrayOfObject {
        property
            .items
            .as_ref()
            .and_then(|items| items.properties.as_ref())
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Some(ParameterDescriptor {
        name: name.to_string(),
        display_name: display_name(name),
        kind,
        required: required.iter().any(|entry| entry == name),
        default,
        description: property.description.clone().unwrap_or_default(),
        bounds: bounds_for(kind, &property),
        enum_options,
        max_items,
        object_fields,
    })
}

fn kind_for(name: &str, property: &RawProperty) -> ParamKind {
    // A declared enum wins over the primitive type.
    if !property.r#enum.is_empty() {
        return ParamKind::Enum;
    }

    match property.type_name.as_deref() {
        Some("integer") => ParamKind::Integer,
        Some("number") => ParamKind::Float,
        Some("boolean") => ParamKind::Boolean,
        Some("array") => array_kind_for(name, property),
        _ => ParamKind::Text,
    }
}

fn array_kind_for(name: &str, property: &RawProperty) -> ParamKind {
    // Weighting constructs stay primitive arrays no matter what their item
    // schema declares.
    if name.to_ascii_lowercase().contains("lora") {
        return ParamKind::ArrayOfPrimitive;
    }
    let items_are_objects = property
        .items
        .as_ref()
        .is_some_and(|items| items.type_name.as_deref() == Some("object"));
    if items_are_objects {
        ParamKind::ArrayOfObject
    } else {
        ParamKind::ArrayOfPrimitive
    }
}

fn enum_options_for(property: &RawProperty) -> Vec<EnumOption> {
    property
        .r#enum
        .iter()
        .map(|value| EnumOption {
            label: match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            value: value.clone(),
        })
        .collect()
}

fn default_for(name: &str, kind: ParamKind, property: &RawProperty, enum_options: &[EnumOption]) -> Option<Value> {
    if kind == ParamKind::Enum {
        // A default outside the declared options is replaced by the first
        // option so the control never starts on an unsubmittable value.
        let declared = property.default.clone();
        let is_member = declared
            .as_ref()
            .is_some_and(|value| enum_options.iter().any(|option| &option.value == value));
        return if is_member {
            declared
        } else {
            enum_options.first().map(|option| option.value.clone())
        };
    }

    // Media, URL, and prompt defaults are upstream placeholders, not safe
    // initial values.
    if matches!(kind, ParamKind::Text | ParamKind::ArrayOfPrimitive) && is_media_role(name) {
        return Some(Value::String(String::new()));
    }

    if kind == ParamKind::Boolean {
        return Some(property.default.clone().unwrap_or(Value::Bool(false)));
    }

    property.default.clone()
}

fn bounds_for(kind: ParamKind, property: &RawProperty) -> Option<NumericBounds> {
    if !matches!(kind, ParamKind::Integer | ParamKind::Float) {
        return None;
    }
    if property.minimum.is_none() && property.maximum.is_none() && property.step.is_none() {
        return None;
    }
    let step = property.step.or(if kind == ParamKind::Integer { Some(1.0) } else { None });
    Some(NumericBounds {
        minimum: property.minimum,
        maximum: property.maximum,
        step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_schema_parses_to_ordered_descriptors() {
        let schema = json!({
            "properties": {
                "prompt": { "type": "string" },
                "seed": { "type": "integer", "minimum": 0, "maximum": 100 }
            },
            "required": ["prompt"]
        });

        let descriptors = parse_input_schema(&schema);

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "prompt");
        assert_eq!(descriptors[0].kind, ParamKind::Text);
        assert!(descriptors[0].required);
        assert_eq!(descriptors[1].name, "seed");
        assert_eq!(descriptors[1].kind, ParamKind::Integer);
        assert!(!descriptors[1].required);
        let bounds = descriptors[1].bounds.expect("seed has bounds");
        assert_eq!(bounds.minimum, Some(0.0));
        assert_eq!(bounds.maximum, Some(100.0));
    }

    #[test]
    fn order_hint_overrides_declaration_order() {
        let schema = json!({
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "string" },
                "c": { "type": "string" }
            },
            "x-order-properties": ["c", "missing", "a"]
        });

        let names: Vec<String> = parse_input_schema(&schema).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn disabled_and_hidden_properties_are_dropped() {
        let schema = json!({
            "properties": {
                "visible": { "type": "string" },
                "off": { "type": "string", "disabled": true },
                "ghost": { "type": "string", "hidden": true }
            }
        });

        let names: Vec<String> = parse_input_schema(&schema).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["visible"]);
    }

    #[test]
    fn enum_list_forces_enum_kind_regardless_of_declared_type() {
        let schema = json!({
            "properties": {
                "size": { "type": "integer", "enum": [512, 768, 1024] }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].kind, ParamKind::Enum);
        assert_eq!(descriptors[0].enum_options.len(), 3);
        assert_eq!(descriptors[0].enum_options[0].label, "512");
    }

    #[test]
    fn enum_default_outside_options_falls_back_to_first_option() {
        let schema = json!({
            "properties": {
                "quality": { "type": "string", "enum": ["draft", "high"], "default": "ultra" }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].default, Some(json!("draft")));
    }

    #[test]
    fn enum_default_inside_options_is_kept() {
        let schema = json!({
            "properties": {
                "quality": { "type": "string", "enum": ["draft", "high"], "default": "high" }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].default, Some(json!("high")));
    }

    #[test]
    fn media_role_defaults_are_cleared() {
        let schema = json!({
            "properties": {
                "image_url": { "type": "string", "default": "https://example.com/placeholder.png" },
                "steps": { "type": "integer", "default": 30 }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].default, Some(json!("")));
        assert_eq!(descriptors[1].default, Some(json!(30)));
    }

    #[test]
    fn booleans_default_to_false_when_unspecified() {
        let schema = json!({
            "properties": { "enable_safety_checker": { "type": "boolean" } }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].default, Some(json!(false)));
    }

    #[test]
    fn array_of_plain_objects_maps_to_array_of_object_with_fields() {
        let schema = json!({
            "properties": {
                "controls": {
                    "type": "array",
                    "maxItems": 3,
                    "items": {
                        "type": "object",
                        "properties": { "path": { "type": "string" }, "weight": { "type": "number" } }
                    }
                }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].kind, ParamKind::ArrayOfObject);
        assert_eq!(descriptors[0].object_fields, vec!["path", "weight"]);
        assert_eq!(descriptors[0].max_items, Some(3));
    }

    #[test]
    fn lora_arrays_stay_primitive_even_with_object_items() {
        let schema = json!({
            "properties": {
                "loras": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "path": { "type": "string" }, "scale": { "type": "number" } }
                    }
                }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].kind, ParamKind::ArrayOfPrimitive);
    }

    #[test]
    fn declared_max_items_is_clamped_to_the_ceiling() {
        let schema = json!({
            "properties": { "images": { "type": "array", "maxItems": 8 } }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].max_items, Some(ARRAY_ITEM_CEILING));
    }

    #[test]
    fn missing_properties_map_yields_empty_list() {
        assert!(parse_input_schema(&json!({})).is_empty());
        assert!(parse_input_schema(&json!({ "required": ["x"] })).is_empty());
        assert!(parse_input_schema(&json!("not even an object")).is_empty());
    }

    #[test]
    fn malformed_property_degrades_to_text() {
        let schema = json!({
            "properties": {
                "odd": { "type": ["string", "null"], "disabled": "nope" }
            }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].kind, ParamKind::Text);
    }

    #[test]
    fn display_names_are_title_cased_from_property_names() {
        let schema = json!({
            "properties": { "guidance_scale": { "type": "number" } }
        });

        let descriptors = parse_input_schema(&schema);
        assert_eq!(descriptors[0].display_name, "Guidance Scale");
    }
}
