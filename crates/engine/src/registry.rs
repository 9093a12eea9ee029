//! The binding registry.
//!
//! One authoritative arena maps each field name to its live
//! [`FieldBinding`] (UI control plus optional connection slot). "Slot
//! points at control" and "control points at slot" are derived lookups over
//! this one map, so the two directions cannot drift apart; replacing a
//! binding replaces both at once.
//!
//! The registry also owns the parameter-value map of the active model.
//! Both are discarded together on an ordinary model switch; only the
//! explicit restore path carries values forward by name.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;
use wavespeed_types::{FieldDescriptor, SavedField};

use crate::host::{ControlId, ControlSpec, GraphHost, SlotIndex};

/// Live pairing of one field with its host-side objects.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// The field this binding realizes.
    pub descriptor: FieldDescriptor,
    /// The UI control editing the field.
    pub control: ControlId,
    /// The connection slot, absent for titles and object-array elements.
    pub slot: Option<SlotIndex>,
}

/// Owner of the active model's bindings and parameter values.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: IndexMap<String, FieldBinding>,
    values: IndexMap<String, Value>,
    /// Slots created ahead of their controls on the restore path, so the
    /// host's link-restoration pass (which matches by slot name) finds them
    /// already present.
    pending_slots: IndexMap<String, SlotIndex>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a field, if any.
    pub fn value(&self, field_name: &str) -> Option<&Value> {
        self.values.get(field_name)
    }

    /// The full parameter-value map, in binding order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Stores a field value, typically from a user edit.
    pub fn set_value(&mut self, field_name: &str, value: Value) {
        self.values.insert(field_name.to_string(), value);
    }

    /// Merges restored values in ahead of activation so controls are
    /// created with them instead of flashing defaults first.
    pub fn seed_values(&mut self, values: IndexMap<String, Value>) {
        self.values.extend(values);
    }

    /// Records a value change reported by the host for a control, returning
    /// the owning field name. A control id that is no longer in the arena
    /// belongs to a torn-down binding and is ignored.
    pub fn record_control_change(&mut self, control: ControlId, value: Value) -> Option<String> {
        let field_name = self.field_for_control(control)?.to_string();
        self.values.insert(field_name.clone(), value);
        Some(field_name)
    }

    /// Pre-creates slots for fields that were connected (or merely present)
    /// in a saved document, before any control exists. Restore step three.
    pub fn pre_create_slots(&mut self, host: &mut dyn GraphHost, fields: &[FieldDescriptor], saved: &[SavedField]) -> usize {
        let saved_names: HashSet<&str> = saved.iter().map(|entry| entry.name.as_str()).collect();
        let mut created = 0;
        for field in fields {
            if !field.wants_slot() || !saved_names.contains(field.name.as_str()) {
                continue;
            }
            if self.pending_slots.contains_key(&field.name) || self.bindings.contains_key(&field.name) {
                continue;
            }
            let slot = host.add_slot(&field.name);
            self.pending_slots.insert(field.name.clone(), slot);
            created += 1;
        }
        created
    }

    /// Creates bindings for `fields` in order.
    ///
    /// Per connectable field the sequence is strict: the slot is created
    /// (or adopted from a pre-created/stale one) first, the control second,
    /// and the two are joined in the arena before the next field is
    /// touched. The host recomputes layout incrementally as slots appear,
    /// and an unjoined slot would be misplaced by that pass.
    pub fn activate(&mut self, host: &mut dyn GraphHost, fields: &[FieldDescriptor]) {
        for field in fields {
            // A prior partial activation (restore path) may have left a
            // binding whose control is stale. Clear it before creating the
            // fresh control so lookups by control identity cannot land on
            // the wrong field; the slot itself is reused.
            let stale_slot = match self.bindings.shift_remove(&field.name) {
                Some(stale) => {
                    debug!(field = %field.name, "replacing stale control");
                    host.remove_control(stale.control);
                    stale.slot
                }
                None => None,
            };

            let slot = if field.wants_slot() {
                Some(
                    self.pending_slots
                        .shift_remove(&field.name)
                        .or(stale_slot)
                        .unwrap_or_else(|| host.add_slot(&field.name)),
                )
            } else {
                if let Some(slot) = stale_slot {
                    host.remove_slot(slot);
                }
                None
            };

            if field.holds_value() && !self.values.contains_key(&field.name) {
                if let Some(default) = &field.default {
                    self.values.insert(field.name.clone(), default.clone());
                }
            }

            let control = host.add_control(&ControlSpec::for_field(field, self.values.get(&field.name)));

            self.bindings.insert(
                field.name.clone(),
                FieldBinding {
                    descriptor: field.clone(),
                    control,
                    slot,
                },
            );
        }
    }

    /// Destroys every binding of the current model.
    ///
    /// Each arena entry carries both cross-references, so removing it clears
    /// both directions at once; the host objects are removed afterwards and
    /// can never be found through a half-dead binding.
    pub fn teardown(&mut self, host: &mut dyn GraphHost) {
        for (_, binding) in self.bindings.drain(..) {
            host.remove_control(binding.control);
            if let Some(slot) = binding.slot {
                host.remove_slot(slot);
            }
        }
        for (_, slot) in self.pending_slots.drain(..) {
            host.remove_slot(slot);
        }
    }

    /// Ordinary user-initiated model switch: bindings and values both go.
    pub fn switch_model(&mut self, host: &mut dyn GraphHost) {
        self.teardown(host);
        self.values.clear();
    }

    /// Restores the ordering invariant after any external reordering of the
    /// host's control collection: each group's title immediately precedes
    /// its first element, elements ascend by index, and everything else
    /// keeps its relative position. The desired order is computed in full,
    /// then applied in one atomic swap; calling this twice changes nothing
    /// further.
    pub fn reconcile_order(&self, host: &mut dyn GraphHost) {
        let current = host.control_order();
        let binding_by_control: HashMap<ControlId, &FieldBinding> =
            self.bindings.values().map(|binding| (binding.control, binding)).collect();
        let group_members = self.group_member_controls();

        let missing_from_current: Vec<ControlId> = self
            .bindings
            .values()
            .map(|binding| binding.control)
            .filter(|control| !current.contains(control))
            .collect();

        let mut desired = Vec::with_capacity(current.len() + missing_from_current.len());
        let mut emitted_groups: HashSet<String> = HashSet::new();
        for control in current.iter().copied().chain(missing_from_current) {
            match binding_by_control.get(&control) {
                // Controls the host owns outright keep their position.
                None => desired.push(control),
                Some(binding) => match binding.descriptor.group_parent() {
                    None => desired.push(control),
                    Some(parent) => {
                        if emitted_groups.insert(parent.to_string()) {
                            desired.extend(&group_members[parent]);
                        }
                    }
                },
            }
        }

        if desired != current {
            host.set_control_order(&desired);
        }
    }

    /// Whether the named field currently has an incoming link.
    pub fn is_connected(&self, field_name: &str, host: &dyn GraphHost) -> bool {
        self.bindings
            .get(field_name)
            .and_then(|binding| binding.slot)
            .is_some_and(|slot| host.slot_has_link(slot))
    }

    pub fn binding(&self, field_name: &str) -> Option<&FieldBinding> {
        self.bindings.get(field_name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &FieldBinding)> {
        self.bindings.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Derived accessor: the field a control belongs to.
    pub fn field_for_control(&self, control: ControlId) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.control == control)
            .map(|(name, _)| name.as_str())
    }

    /// Derived accessor: the slot joined to a control.
    pub fn slot_for_control(&self, control: ControlId) -> Option<SlotIndex> {
        self.bindings.values().find(|binding| binding.control == control)?.slot
    }

    /// Derived accessor: the control joined to a slot.
    pub fn control_for_slot(&self, slot: SlotIndex) -> Option<ControlId> {
        self.bindings
            .values()
            .find(|binding| binding.slot == Some(slot))
            .map(|binding| binding.control)
    }

    /// Derived accessor: the field a slot belongs to.
    pub fn field_for_slot(&self, slot: SlotIndex) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.slot == Some(slot))
            .map(|(name, _)| name.as_str())
    }

    fn group_member_controls(&self) -> IndexMap<String, Vec<ControlId>> {
        let mut groups: IndexMap<String, (Option<ControlId>, Vec<(usize, ControlId)>)> = IndexMap::new();
        for binding in self.bindings.values() {
            let Some(parent) = binding.descriptor.group_parent() else {
                continue;
            };
            let entry = groups.entry(parent.to_string()).or_default();
            if binding.descriptor.is_title() {
                entry.0 = Some(binding.control);
            } else if let Some(index) = binding.descriptor.element_index() {
                entry.1.push((index, binding.control));
            }
        }

        groups
            .into_iter()
            .map(|(parent, (title, mut elements))| {
                elements.sort_by_key(|(index, _)| *index);
                let mut members = Vec::with_capacity(elements.len() + 1);
                members.extend(title);
                members.extend(elements.into_iter().map(|(_, control)| control));
                (parent, members)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEvent, MemoryHost};
    use serde_json::json;
    use wavespeed_types::{FieldRole, ParamKind};

    fn scalar(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            display_name: name.to_string(),
            kind: ParamKind::Text,
            required: false,
            default: None,
            description: String::new(),
            bounds: None,
            enum_options: Vec::new(),
            object_fields: Vec::new(),
            role: FieldRole::Scalar,
        }
    }

    fn title(parent: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: format!("{parent}_title"),
            role: FieldRole::GroupTitle { parent: parent.into() },
            ..scalar(parent)
        }
    }

    fn element(parent: &str, stem: &str, index: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: format!("{stem}_{index}"),
            role: FieldRole::Element {
                parent: parent.into(),
                index,
            },
            ..scalar(parent)
        }
    }

    fn image_group() -> Vec<FieldDescriptor> {
        vec![
            scalar("prompt"),
            title("images"),
            element("images", "image", 0),
            element("images", "image", 1),
            scalar("seed"),
        ]
    }

    #[test]
    fn activation_interleaves_slot_and_control_per_field() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();

        registry.activate(&mut host, &[scalar("prompt"), scalar("seed")]);

        assert_eq!(
            host.events,
            vec![
                HostEvent::SlotAdded("prompt".into()),
                HostEvent::ControlAdded("prompt".into()),
                HostEvent::SlotAdded("seed".into()),
                HostEvent::ControlAdded("seed".into()),
            ]
        );
    }

    #[test]
    fn titles_get_controls_but_never_slots() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();

        registry.activate(&mut host, &image_group());

        assert_eq!(registry.len(), 5);
        assert!(registry.binding("images_title").expect("title bound").slot.is_none());
        assert!(registry.binding("image_0").expect("element bound").slot.is_some());
        assert_eq!(host.slot_count(), 4);
        assert_eq!(host.control_count(), 5);
    }

    #[test]
    fn values_present_before_activation_reach_the_control_at_construction() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.set_value("prompt", json!("restored prompt"));

        registry.activate(&mut host, &[scalar("prompt")]);

        let control = registry.binding("prompt").expect("bound").control;
        let record = host.control(control).expect("control exists");
        assert_eq!(record.spec.initial_value, Some(json!("restored prompt")));
        assert_eq!(record.value, Some(json!("restored prompt")));
    }

    #[test]
    fn defaults_are_recorded_into_the_value_map_on_activation() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        let mut field = scalar("steps");
        field.kind = ParamKind::Integer;
        field.default = Some(json!(30));

        registry.activate(&mut host, &[field]);

        assert_eq!(registry.value("steps"), Some(&json!(30)));
    }

    #[test]
    fn stale_control_is_replaced_and_slot_reused_on_reactivation() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &[scalar("prompt")]);
        let first = registry.binding("prompt").expect("bound").clone();

        registry.activate(&mut host, &[scalar("prompt")]);
        let second = registry.binding("prompt").expect("rebound").clone();

        assert_ne!(first.control, second.control);
        assert_eq!(first.slot, second.slot);
        assert_eq!(registry.field_for_control(second.control), Some("prompt"));
        // Lookups by the stale control identity must miss, not mismatch.
        assert_eq!(registry.field_for_control(first.control), None);
        assert_eq!(host.control_count(), 1);
        assert_eq!(host.slot_count(), 1);
    }

    #[test]
    fn pre_created_slots_are_adopted_instead_of_duplicated() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        let fields = [scalar("prompt")];
        let saved = [SavedField {
            name: "prompt".into(),
            has_link: true,
            parent_array_name: None,
            array_index: None,
        }];

        let created = registry.pre_create_slots(&mut host, &fields, &saved);
        assert_eq!(created, 1);
        let pre_created = host.slot_by_name("prompt").expect("slot exists before activation");

        registry.activate(&mut host, &fields);

        assert_eq!(registry.binding("prompt").expect("bound").slot, Some(pre_created));
        assert_eq!(host.slot_count(), 1);
    }

    #[test]
    fn teardown_removes_both_directions_of_every_binding() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &image_group());
        let control = registry.binding("prompt").expect("bound").control;
        let slot = registry.binding("prompt").expect("bound").slot.expect("has slot");

        registry.teardown(&mut host);

        assert!(registry.is_empty());
        assert_eq!(registry.field_for_control(control), None);
        assert_eq!(registry.control_for_slot(slot), None);
        assert_eq!(host.slot_count(), 0);
        assert_eq!(host.control_count(), 0);
    }

    #[test]
    fn switch_model_drops_values_but_restore_seeding_keeps_them() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &[scalar("prompt")]);
        registry.set_value("prompt", json!("typed"));

        registry.switch_model(&mut host);
        assert!(registry.values().is_empty());

        let mut seeded = IndexMap::new();
        seeded.insert("prompt".to_string(), json!("carried"));
        registry.seed_values(seeded);
        registry.activate(&mut host, &[scalar("prompt")]);
        assert_eq!(registry.value("prompt"), Some(&json!("carried")));
    }

    #[test]
    fn reconcile_order_restores_group_layout_and_is_idempotent() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &image_group());

        host.scramble_order();
        registry.reconcile_order(&mut host);

        let names = host.ordered_field_names();
        let title_position = names.iter().position(|name| name == "images_title").expect("title present");
        assert_eq!(names[title_position + 1], "image_0");
        assert_eq!(names[title_position + 2], "image_1");

        let replacements_after_first = host.order_replacements();
        registry.reconcile_order(&mut host);
        assert_eq!(host.order_replacements(), replacements_after_first);
    }

    #[test]
    fn record_control_change_ignores_torn_down_controls() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &[scalar("prompt")]);
        let control = registry.binding("prompt").expect("bound").control;
        registry.teardown(&mut host);

        assert_eq!(registry.record_control_change(control, json!("late event")), None);
        assert!(registry.values().get("prompt").is_none());
    }

    #[test]
    fn derived_accessors_agree_with_each_other() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &image_group());

        for (name, binding) in registry.bindings() {
            assert_eq!(registry.field_for_control(binding.control), Some(name));
            if let Some(slot) = binding.slot {
                assert_eq!(registry.control_for_slot(slot), Some(binding.control));
                assert_eq!(registry.field_for_slot(slot), Some(name));
                assert_eq!(registry.slot_for_control(binding.control), Some(slot));
            }
        }
    }

    #[test]
    fn connectedness_reflects_host_links() {
        let mut host = MemoryHost::new();
        let mut registry = BindingRegistry::new();
        registry.activate(&mut host, &[scalar("prompt")]);
        let slot = registry.binding("prompt").expect("bound").slot.expect("has slot");

        assert!(!registry.is_connected("prompt", &host));
        host.connect(slot);
        assert!(registry.is_connected("prompt", &host));
    }
}
