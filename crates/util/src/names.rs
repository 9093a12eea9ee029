//! Identifier and display-name shaping.
//!
//! Field, group, and category names all derive from schema property names
//! and catalog keys; this module keeps the derivation rules in one place so
//! the parser, the expander, and the binding registry agree on them.

use std::collections::HashMap;

use heck::ToTitleCase;
use once_cell::sync::Lazy;
use regex::Regex;

/// Property names matching this pattern carry media, URL, or prompt content;
/// their schema defaults are placeholders, not safe initial values.
static MEDIA_ROLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)image|video|audio|media|url|file|prompt").expect("media role pattern compiles"));

/// Fixed display names for the well-known category keys; anything else
/// falls back to title-casing the key.
static CATEGORY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("text-to-video", "Text to Video"),
        ("text-to-image", "Text to Image"),
        ("image-to-video", "Image to Video"),
        ("image-to-image", "Image to Image"),
        ("image-to-3d", "Image to 3D"),
        ("video-to-video", "Video to Video"),
        ("text-to-audio", "Text to Audio"),
        ("audio-to-video", "Audio to Video"),
        ("image-to-text", "Image to Text"),
        ("text-to-text", "Text to Text"),
        ("training", "Training"),
        ("image-effects", "Image Effects"),
        ("video-effects", "Video Effects"),
        ("scenario-marketing", "Scenario Marketing"),
        ("image-tools", "Image Tools"),
    ])
});

/// Title-cased label for a schema property name.
///
/// `guidance_scale` becomes `Guidance Scale`.
pub fn display_name(property_name: &str) -> String {
    property_name.to_title_case()
}

/// Human-readable name for a catalog category key.
pub fn category_display_name(category_value: &str) -> String {
    match CATEGORY_NAMES.get(category_value) {
        Some(name) => (*name).to_string(),
        None => category_value.replace('-', " ").to_title_case(),
    }
}

/// Whether a property name signals media/URL/prompt content whose schema
/// default must be cleared.
pub fn is_media_role(property_name: &str) -> bool {
    MEDIA_ROLE_PATTERN.is_match(property_name)
}

/// Singular form of an array parameter name, used as the element-name stem.
///
/// Hyphens are normalized to underscores; a plural trailing `s` is dropped
/// (`images` → `image`).
pub fn singularize(name: &str) -> String {
    let normalized = name.replace('-', "_");
    match normalized.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => normalized,
    }
}

/// Name of the `index`-th element field of the array parameter `parent`.
pub fn element_name(parent: &str, index: usize) -> String {
    format!("{}_{index}", singularize(parent))
}

/// Name of the synthetic group-title field of the array parameter `parent`.
pub fn title_name(parent: &str) -> String {
    format!("{parent}_title")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_title_cases_snake_case() {
        assert_eq!(display_name("guidance_scale"), "Guidance Scale");
        assert_eq!(display_name("prompt"), "Prompt");
    }

    #[test]
    fn known_categories_use_the_fixed_table() {
        assert_eq!(category_display_name("image-to-3d"), "Image to 3D");
        assert_eq!(category_display_name("text-to-image"), "Text to Image");
    }

    #[test]
    fn unknown_categories_fall_back_to_title_casing() {
        assert_eq!(category_display_name("audio-tools"), "Audio Tools");
    }

    #[test]
    fn media_role_detection_is_case_insensitive() {
        assert!(is_media_role("input_image"));
        assert!(is_media_role("VideoUrl"));
        assert!(is_media_role("prompt"));
        assert!(!is_media_role("seed"));
        assert!(!is_media_role("guidance_scale"));
    }

    #[test]
    fn singularize_strips_plural_suffix() {
        assert_eq!(singularize("images"), "image");
        assert_eq!(singularize("loras"), "lora");
        // A bare "s" must not singularize to the empty string.
        assert_eq!(singularize("s"), "s");
    }

    #[test]
    fn element_and_title_names_follow_the_naming_contract() {
        assert_eq!(element_name("images", 0), "image_0");
        assert_eq!(element_name("images", 4), "image_4");
        assert_eq!(title_name("images"), "images_title");
    }
}
