//! The host-editor seam.
//!
//! Everything the engine needs from the node-graph editor is expressed as
//! the [`GraphHost`] trait: slot and control creation, value application,
//! control ordering, and link inspection. The engine computes desired state
//! and hands it over; the host owns layout, rendering, and link routing.
//!
//! [`MemoryHost`] is a complete in-memory implementation used by the test
//! suites and as the reference for host adapters.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use wavespeed_types::{EnumOption, FieldDescriptor, NumericBounds, ParamKind};

/// Index of a connection slot within the host's slot collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex(pub usize);

/// Opaque identifier of a UI control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u64);

/// Everything the host needs to materialize one UI control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    /// Field the control belongs to; unique within the node.
    pub field_name: String,
    /// Label rendered next to the control.
    pub label: String,
    /// Value kind, which picks the control widget.
    pub kind: ParamKind,
    /// Value the control starts with. Applying this at construction avoids
    /// a visible flash of defaults on restore.
    pub initial_value: Option<Value>,
    /// Options for enum controls.
    pub enum_options: Vec<EnumOption>,
    /// Range constraints for numeric controls.
    pub bounds: Option<NumericBounds>,
    /// Whether this is a value-less group header.
    pub is_title: bool,
}

impl ControlSpec {
    /// Builds a spec for `field`, preferring `value` over the field default.
    pub fn for_field(field: &FieldDescriptor, value: Option<&Value>) -> Self {
        ControlSpec {
            field_name: field.name.clone(),
            label: field.display_name.clone(),
            kind: field.kind,
            initial_value: value.cloned().or_else(|| field.default.clone()),
            enum_options: field.enum_options.clone(),
            bounds: field.bounds,
            is_title: field.is_title(),
        }
    }
}

/// Host-editor operations the engine drives.
///
/// The host recomputes layout incrementally as slots appear, which is why
/// activation interleaves slot and control creation per field instead of
/// batching; see `BindingRegistry::activate`.
pub trait GraphHost {
    /// Appends a named connection slot and returns its index.
    fn add_slot(&mut self, name: &str) -> SlotIndex;
    /// Removes a slot. Links into it are dropped by the host.
    fn remove_slot(&mut self, slot: SlotIndex);
    /// Creates a UI control and returns its identifier.
    fn add_control(&mut self, spec: &ControlSpec) -> ControlId;
    /// Removes a control.
    fn remove_control(&mut self, control: ControlId);
    /// Applies a value to an existing control.
    fn set_control_value(&mut self, control: ControlId, value: &Value);
    /// Current display order of controls.
    fn control_order(&self) -> Vec<ControlId>;
    /// Atomically replaces the display order. Unknown ids are ignored by
    /// the host.
    fn set_control_order(&mut self, order: &[ControlId]);
    /// Whether the slot currently has an incoming link.
    fn slot_has_link(&self, slot: SlotIndex) -> bool;
}

/// Host events recorded by [`MemoryHost`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SlotAdded(String),
    SlotRemoved(usize),
    ControlAdded(String),
    ControlRemoved(u64),
    OrderReplaced,
}

/// One live control inside [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct ControlRecord {
    pub spec: ControlSpec,
    pub value: Option<Value>,
}

/// In-memory [`GraphHost`] used by the engine's tests and as a template for
/// real host adapters.
#[derive(Debug, Default)]
pub struct MemoryHost {
    next_slot: usize,
    next_control: u64,
    slots: HashMap<SlotIndex, String>,
    controls: HashMap<ControlId, ControlRecord>,
    order: Vec<ControlId>,
    linked_slots: HashSet<SlotIndex>,
    /// Chronological log of host mutations, for sequence assertions.
    pub events: Vec<HostEvent>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a slot as having an incoming link, as the host's own
    /// link-restoration pass would.
    pub fn connect(&mut self, slot: SlotIndex) {
        self.linked_slots.insert(slot);
    }

    /// Drops the link into a slot.
    pub fn disconnect(&mut self, slot: SlotIndex) {
        self.linked_slots.remove(&slot);
    }

    /// Name of a live slot.
    pub fn slot_name(&self, slot: SlotIndex) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Looks up a live slot by name.
    pub fn slot_by_name(&self, name: &str) -> Option<SlotIndex> {
        self.slots
            .iter()
            .find(|(_, slot_name)| slot_name.as_str() == name)
            .map(|(slot, _)| *slot)
    }

    /// Current record of a live control.
    pub fn control(&self, control: ControlId) -> Option<&ControlRecord> {
        self.controls.get(&control)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    /// Field names of the controls in display order.
    pub fn ordered_field_names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|control| self.controls.get(control))
            .map(|record| record.spec.field_name.clone())
            .collect()
    }

    /// Number of `set_control_order` calls observed.
    pub fn order_replacements(&self) -> usize {
        self.events.iter().filter(|event| **event == HostEvent::OrderReplaced).count()
    }

    /// Scrambles display order, simulating an external host reordering.
    pub fn scramble_order(&mut self) {
        self.order.reverse();
    }
}

impl GraphHost for MemoryHost {
    fn add_slot(&mut self, name: &str) -> SlotIndex {
        let slot = SlotIndex(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(slot, name.to_string());
        self.events.push(HostEvent::SlotAdded(name.to_string()));
        slot
    }

    fn remove_slot(&mut self, slot: SlotIndex) {
        self.slots.remove(&slot);
        self.linked_slots.remove(&slot);
        self.events.push(HostEvent::SlotRemoved(slot.0));
    }

    fn add_control(&mut self, spec: &ControlSpec) -> ControlId {
        let control = ControlId(self.next_control);
        self.next_control += 1;
        self.controls.insert(
            control,
            ControlRecord {
                spec: spec.clone(),
                value: spec.initial_value.clone(),
            },
        );
        self.order.push(control);
        self.events.push(HostEvent::ControlAdded(spec.field_name.clone()));
        control
    }

    fn remove_control(&mut self, control: ControlId) {
        self.controls.remove(&control);
        self.order.retain(|existing| *existing != control);
        self.events.push(HostEvent::ControlRemoved(control.0));
    }

    fn set_control_value(&mut self, control: ControlId, value: &Value) {
        if let Some(record) = self.controls.get_mut(&control) {
            record.value = Some(value.clone());
        }
    }

    fn control_order(&self) -> Vec<ControlId> {
        self.order.clone()
    }

    fn set_control_order(&mut self, order: &[ControlId]) {
        let known: Vec<ControlId> = order.iter().copied().filter(|control| self.controls.contains_key(control)).collect();
        self.order = known;
        self.events.push(HostEvent::OrderReplaced);
    }

    fn slot_has_link(&self, slot: SlotIndex) -> bool {
        self.linked_slots.contains(&slot)
    }
}
