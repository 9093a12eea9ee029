//! Dynamic parameter synchronization engine.
//!
//! Given the flattened field list produced by `wavespeed-schema`, this crate
//! keeps a node's UI controls and connection slots in lock-step as the user
//! switches models, and carries the binding state across the host editor's
//! serialize/restore cycles.
//!
//! The host editor itself is reached only through the [`host::GraphHost`]
//! trait; the engine never touches host data structures directly. One
//! authoritative map from field name to `{slot, control}` (the
//! [`registry::BindingRegistry`] arena) replaces mutable back-references
//! between slots and controls, so the two directions cannot disagree.

pub mod host;
pub mod lifecycle;
pub mod load_mode;
pub mod persistence;
pub mod registry;
pub mod session;

pub use host::{ControlId, ControlSpec, GraphHost, MemoryHost, SlotIndex};
pub use lifecycle::{InterceptorChain, NodeLifecycle};
pub use load_mode::{LoadEvent, LoadMode};
pub use persistence::{ModelIdentity, RestoreReport, SchemaProvider, execution_handoff, restore, snapshot};
pub use registry::{BindingRegistry, FieldBinding};
pub use session::SwitchTracker;
