//! Leaf helpers shared across the WaveSpeed node crates.

pub mod coerce;
pub mod fuzzy;
pub mod names;

pub use coerce::coerce_value;
pub use fuzzy::{FuzzyMatch, fuzzy_match};
pub use names::{category_display_name, display_name, element_name, is_media_role, singularize, title_name};
