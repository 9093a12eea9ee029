//! Shared type definitions for the WaveSpeed node.
//!
//! This crate owns the data model that flows between the schema parser, the
//! parameter expander, the binding registry, and the persistence adapter:
//! declarative [`ParameterDescriptor`]s, flattened [`FieldDescriptor`]s, the
//! persisted `wavespeed` document block, and the catalog item types returned
//! by the WaveSpeed API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod catalog;
pub mod document;

pub use catalog::{Category, ModelDetail, ModelSummary, UploadKind, UploadOutcome, UploadPayload};
pub use document::{ExecutionHandoff, ParamMapEntry, PersistedDocument, SavedField};

/// Hard ceiling on the number of UI elements an array parameter may expand
/// to, independent of the upstream schema's declared `maxItems`.
pub const ARRAY_ITEM_CEILING: usize = 5;

/// Concrete kind of a model input parameter.
///
/// The kind fully determines which optional descriptor attributes are
/// meaningful: `bounds` applies to `Integer`/`Float`, `enum_options` to
/// `Enum`, `max_items` to the array kinds, and `object_fields` to
/// `ArrayOfObject` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Free-form text, including prompt and media-URL parameters.
    Text,
    /// Whole-number parameter, optionally bounded.
    Integer,
    /// Floating-point parameter, optionally bounded.
    Float,
    /// True/false toggle.
    Boolean,
    /// Closed set of options; forced whenever the schema declares an enum.
    Enum,
    /// Array expanded to one connectable element per index.
    ArrayOfPrimitive,
    /// Array of flat objects expanded to one composite row per index.
    ArrayOfObject,
}

impl ParamKind {
    /// Returns true for the two expandable array kinds.
    pub fn is_array(self) -> bool {
        matches!(self, ParamKind::ArrayOfPrimitive | ParamKind::ArrayOfObject)
    }

    /// Type tag written into the `param_map` handoff for downstream
    /// execution. Array kinds report their element role through `isArray`
    /// and `itemType` instead.
    pub fn request_type(self) -> &'static str {
        match self {
            ParamKind::Text => "string",
            ParamKind::Integer => "integer",
            ParamKind::Float => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Enum => "options",
            ParamKind::ArrayOfPrimitive | ParamKind::ArrayOfObject => "array",
        }
    }

    /// Element type tag for array kinds (`itemType` in the handoff).
    pub fn item_type(self) -> Option<&'static str> {
        match self {
            ParamKind::ArrayOfPrimitive => Some("string"),
            ParamKind::ArrayOfObject => Some("object"),
            _ => None,
        }
    }
}

/// Numeric range constraints declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericBounds {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Step increment for the UI control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// One selectable option of an `Enum` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    /// Human-readable label shown in the UI.
    pub label: String,
    /// Value submitted to the API when the option is selected.
    pub value: Value,
}

/// One declared input of a model, before UI materialization.
///
/// Produced by the schema parser in schema order. `name` is unique within a
/// schema; the parser's ordered property map keeps one entry per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Unique key within the schema.
    pub name: String,
    /// Title-cased label derived from the name.
    pub display_name: String,
    /// Concrete parameter kind.
    pub kind: ParamKind,
    /// Whether the schema lists this parameter as required.
    pub required: bool,
    /// Initial value; media-role parameters have this cleared at parse time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Schema-provided description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Numeric constraints (Integer/Float only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<NumericBounds>,
    /// Closed option set (Enum only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<EnumOption>,
    /// Post-clamp element count for array kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Ordered sub-field names (ArrayOfObject only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_fields: Vec<String>,
}

impl ParameterDescriptor {
    /// Number of elements this descriptor expands to; zero for scalars.
    pub fn element_count(&self) -> usize {
        if self.kind.is_array() {
            self.max_items.unwrap_or(ARRAY_ITEM_CEILING).min(ARRAY_ITEM_CEILING)
        } else {
            0
        }
    }
}

/// Structural role of a flattened field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// A scalar descriptor passed through unchanged.
    Scalar,
    /// Synthetic header carrying no value, inserted before an array group.
    GroupTitle {
        /// Name of the array descriptor this title belongs to.
        parent: String,
    },
    /// One indexed element of an expanded array.
    Element {
        /// Name of the array descriptor this element belongs to.
        parent: String,
        /// Zero-based position within the group.
        index: usize,
    },
}

/// A flattened, UI-addressable unit produced from a [`ParameterDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique field name; element names are `<singular>_<index>`, titles
    /// are `<parent>_title`.
    pub name: String,
    /// Label shown next to the control.
    pub display_name: String,
    /// Kind of the value this field edits. Elements carry the item kind of
    /// their parent array.
    pub kind: ParamKind,
    /// Required flag inherited from the originating descriptor.
    pub required: bool,
    /// Initial value applied when the control is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description inherited from the originating descriptor.
    #[serde(default)]
    pub description: String,
    /// Numeric constraints inherited from the originating descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<NumericBounds>,
    /// Option set inherited from the originating descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<EnumOption>,
    /// Sub-field names when this field is an object-array element.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_fields: Vec<String>,
    /// Structural role within the flattened list.
    pub role: FieldRole,
}

impl FieldDescriptor {
    /// Whether activation should create a connection slot for this field.
    ///
    /// Group titles and object-array elements only get a UI control; every
    /// other field is connectable.
    pub fn wants_slot(&self) -> bool {
        match &self.role {
            FieldRole::GroupTitle { .. } => false,
            FieldRole::Element { .. } => self.object_fields.is_empty(),
            FieldRole::Scalar => true,
        }
    }

    /// Whether this field is a synthetic group header.
    pub fn is_title(&self) -> bool {
        matches!(self.role, FieldRole::GroupTitle { .. })
    }

    /// Name of the array group this field belongs to, if any.
    pub fn group_parent(&self) -> Option<&str> {
        match &self.role {
            FieldRole::GroupTitle { parent } | FieldRole::Element { parent, .. } => Some(parent),
            FieldRole::Scalar => None,
        }
    }

    /// Index within the group for element fields.
    pub fn element_index(&self) -> Option<usize> {
        match &self.role {
            FieldRole::Element { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Whether this field holds a value the persistence adapter should
    /// snapshot. Titles carry no value; container values are reconstructed
    /// from the schema rather than stored.
    pub fn holds_value(&self) -> bool {
        !self.is_title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn array_descriptor(name: &str, kind: ParamKind, max_items: Option<usize>) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            display_name: name.to_string(),
            kind,
            required: false,
            default: None,
            description: String::new(),
            bounds: None,
            enum_options: Vec::new(),
            max_items,
            object_fields: Vec::new(),
        }
    }

    #[test]
    fn element_count_clamps_to_ceiling() {
        let descriptor = array_descriptor("images", ParamKind::ArrayOfPrimitive, Some(8));
        assert_eq!(descriptor.element_count(), ARRAY_ITEM_CEILING);
    }

    #[test]
    fn element_count_respects_smaller_declared_maximum() {
        let descriptor = array_descriptor("images", ParamKind::ArrayOfPrimitive, Some(3));
        assert_eq!(descriptor.element_count(), 3);
    }

    #[test]
    fn element_count_is_zero_for_scalars() {
        let descriptor = array_descriptor("seed", ParamKind::Integer, None);
        assert_eq!(descriptor.element_count(), 0);
    }

    #[test]
    fn titles_and_object_elements_do_not_want_slots() {
        let title = FieldDescriptor {
            name: "images_title".into(),
            display_name: "Images".into(),
            kind: ParamKind::ArrayOfPrimitive,
            required: false,
            default: None,
            description: String::new(),
            bounds: None,
            enum_options: Vec::new(),
            object_fields: Vec::new(),
            role: FieldRole::GroupTitle { parent: "images".into() },
        };
        assert!(!title.wants_slot());

        let object_element = FieldDescriptor {
            name: "lora_0".into(),
            display_name: "Lora 1".into(),
            kind: ParamKind::Text,
            required: false,
            default: None,
            description: String::new(),
            bounds: None,
            enum_options: Vec::new(),
            object_fields: vec!["path".into(), "scale".into()],
            role: FieldRole::Element { parent: "loras".into(), index: 0 },
        };
        assert!(!object_element.wants_slot());

        let primitive_element = FieldDescriptor {
            object_fields: Vec::new(),
            name: "image_0".into(),
            role: FieldRole::Element { parent: "images".into(), index: 0 },
            ..object_element.clone()
        };
        assert!(primitive_element.wants_slot());
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let descriptor = ParameterDescriptor {
            name: "guidance_scale".into(),
            display_name: "Guidance Scale".into(),
            kind: ParamKind::Float,
            required: false,
            default: Some(json!(7.5)),
            description: "Classifier-free guidance".into(),
            bounds: Some(NumericBounds {
                minimum: Some(0.0),
                maximum: Some(20.0),
                step: Some(0.1),
            }),
            enum_options: Vec::new(),
            max_items: None,
            object_fields: Vec::new(),
        };

        let encoded = serde_json::to_string(&descriptor).expect("serialize descriptor");
        let decoded: ParameterDescriptor = serde_json::from_str(&encoded).expect("deserialize descriptor");
        assert_eq!(decoded, descriptor);
    }
}
