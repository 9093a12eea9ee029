//! Input-schema parsing and parameter expansion.
//!
//! [`parse::parse_input_schema`] converts a raw JSON-Schema-like document
//! into an ordered list of [`wavespeed_types::ParameterDescriptor`];
//! [`expand::expand_parameters`] flattens those descriptors into the
//! UI-addressable [`wavespeed_types::FieldDescriptor`] list the binding
//! registry consumes. Both are pure functions: the same document always
//! produces the same field list, which is what makes re-running them on
//! every model switch and on every restore safe.

pub mod expand;
pub mod parse;

pub use expand::expand_parameters;
pub use parse::parse_input_schema;
