//! Descriptor-to-field flattening.
//!
//! Array parameters cannot be edited as a single control; each one expands
//! in place to a synthetic group title plus one field per element, up to the
//! descriptor's post-clamp `max_items`. Scalars pass through unchanged.
//! Expansion is a pure function of its input: identical descriptor lists
//! always yield identical field lists, in the same order.

use serde_json::Value;
use wavespeed_types::{FieldDescriptor, FieldRole, ParamKind, ParameterDescriptor};
use wavespeed_util::names::{display_name, element_name, singularize, title_name};

/// Flattens an ordered descriptor list into the ordered field list the
/// binding registry activates.
///
/// For an array descriptor with N elements the output contains exactly
/// `1 + N` fields at the descriptor's position: the group title first, then
/// the elements by ascending index.
pub fn expand_parameters(descriptors: &[ParameterDescriptor]) -> Vec<FieldDescriptor> {
    let mut fields = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if descriptor.kind.is_array() {
            expand_array(descriptor, &mut fields);
        } else {
            fields.push(scalar_field(descriptor));
        }
    }
    fields
}

fn scalar_field(descriptor: &ParameterDescriptor) -> FieldDescriptor {
    FieldDescriptor {
        name: descriptor.name.clone(),
        display_name: descriptor.display_name.clone(),
        kind: descriptor.kind,
        required: descriptor.required,
        default: descriptor.default.clone(),
        description: descriptor.description.clone(),
        bounds: descriptor.bounds,
        enum_options: descriptor.enum_options.clone(),
        object_fields: Vec::new(),
        role: FieldRole::Scalar,
    }
}

fn expand_array(descriptor: &ParameterDescriptor, fields: &mut Vec<FieldDescriptor>) {
    fields.push(FieldDescriptor {
        name: title_name(&descriptor.name),
        display_name: descriptor.display_name.clone(),
        kind: descriptor.kind,
        required: false,
        default: None,
        description: descriptor.description.clone(),
        bounds: None,
        enum_options: Vec::new(),
        object_fields: Vec::new(),
        role: FieldRole::GroupTitle {
            parent: descriptor.name.clone(),
        },
    });

    let element_label_stem = display_name(&singularize(&descriptor.name));
    for index in 0..descriptor.element_count() {
        fields.push(FieldDescriptor {
            name: element_name(&descriptor.name, index),
            display_name: format!("{} {}", element_label_stem, index + 1),
            kind: element_kind(descriptor.kind),
            required: descriptor.required && index == 0,
            default: element_default(descriptor, index),
            description: String::new(),
            bounds: None,
            enum_options: Vec::new(),
            object_fields: descriptor.object_fields.clone(),
            role: FieldRole::Element {
                parent: descriptor.name.clone(),
                index,
            },
        });
    }
}

fn element_kind(array_kind: ParamKind) -> ParamKind {
    // Elements are edited as text: primitive arrays hold URLs or strings,
    // object arrays hold one JSON row per element.
    match array_kind {
        ParamKind::ArrayOfPrimitive | ParamKind::ArrayOfObject => ParamKind::Text,
        other => other,
    }
}

fn element_default(descriptor: &ParameterDescriptor, index: usize) -> Option<Value> {
    match &descriptor.default {
        Some(Value::Array(items)) => items.get(index).cloned(),
        _ => None,
    }
}
