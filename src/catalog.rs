//! Built-in value types and property types.
//!
//! The tables are built once on first use and never mutated; everything is
//! exposed through plain lookup functions.

use crate::model::{PlatformMappings, PropertyInheritance, PropertyType, ResolvedValueType, StandardValueType};
use once_cell::sync::Lazy;

/// Id of the universal property type every value type is compatible with.
pub const ALL_PROPERTY_TYPE_ID: &str = "ALL";

static STANDARD_VALUE_TYPES: Lazy<Vec<ResolvedValueType>> = Lazy::new(|| {
    StandardValueType::ALL
        .into_iter()
        .map(|t| ResolvedValueType {
            id: t.default_id().to_string(),
            display_name: display_name(t),
            value_type: Some(t),
            description: None,
            validation: None,
        })
        .collect()
});

static STANDARD_PROPERTY_TYPES: Lazy<Vec<PropertyType>> = Lazy::new(|| {
    vec![
        property("background-color", "Background color", "color", &["color"], ("background-color", "backgroundColor", "background"), false),
        property("text-color", "Text color", "color", &["color"], ("color", "textColor", "textColor"), true),
        property("border-color", "Border color", "color", &["color"], ("border-color", "borderColor", "strokeColor"), false),
        property("width-height", "Width and height", "size", &["dimension"], ("width", "frame", "layout_width"), false),
        property("border-width", "Border width", "border", &["dimension"], ("border-width", "borderWidth", "strokeWidth"), false),
        property("position", "Position", "layout", &["dimension"], ("inset", "offset", "translation"), false),
        property("padding", "Padding", "layout", &["spacing"], ("padding", "padding", "padding"), false),
        property("gap", "Gap", "layout", &["spacing"], ("gap", "spacing", "spacedBy"), false),
        property("corner-radius", "Corner radius", "border", &["radius"], ("border-radius", "cornerRadius", "cornerRadius"), false),
        property("font-family", "Font family", "typography", &["font-family"], ("font-family", "fontName", "fontFamily"), true),
        property("font-weight", "Font weight", "typography", &["font-weight"], ("font-weight", "fontWeight", "fontWeight"), true),
        property("font-size", "Font size", "typography", &["font-size"], ("font-size", "fontSize", "textSize"), true),
        property("line-height", "Line height", "typography", &["line-height"], ("line-height", "lineSpacing", "lineHeight"), true),
        property("letter-spacing", "Letter spacing", "typography", &["letter-spacing"], ("letter-spacing", "kerning", "letterSpacing"), true),
        property("animation-duration", "Animation duration", "motion", &["duration"], ("transition-duration", "duration", "durationMillis"), false),
        property("animation-easing", "Animation easing", "motion", &["cubic-bezier"], ("transition-timing-function", "timingCurve", "easing"), false),
        property("shadow-blur", "Shadow blur", "effect", &["blur"], ("box-shadow", "shadowRadius", "elevation"), false),
        property("shadow-spread", "Shadow spread", "effect", &["spread"], ("box-shadow", "shadowSpread", "shadowSpread"), false),
    ]
});

static UNIVERSAL_PROPERTY_TYPE: Lazy<PropertyType> = Lazy::new(|| PropertyType {
    id: ALL_PROPERTY_TYPE_ID.to_string(),
    display_name: "All properties".to_string(),
    category: "universal".to_string(),
    compatible_value_types: Vec::new(),
    platform_mappings: PlatformMappings::default(),
    inheritance: PropertyInheritance::default(),
});

fn display_name(value_type: StandardValueType) -> String {
    value_type
        .as_str()
        .split('_')
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 {
                let mut chars = lower.chars();
                chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect())
                    .unwrap_or_default()
            } else {
                lower
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn property(
    id: &str,
    display_name: &str,
    category: &str,
    compatible: &[&str],
    (web, ios, android): (&str, &str, &str),
    inherits: bool,
) -> PropertyType {
    PropertyType {
        id: id.to_string(),
        display_name: display_name.to_string(),
        category: category.to_string(),
        compatible_value_types: compatible.iter().map(ToString::to_string).collect(),
        platform_mappings: PlatformMappings {
            web: Some(web.to_string()),
            ios: Some(ios.to_string()),
            android: Some(android.to_string()),
        },
        inheritance: PropertyInheritance {
            inherits,
            initial_value: None,
        },
    }
}

#[must_use]
pub fn standard_value_types() -> &'static [ResolvedValueType] {
    &STANDARD_VALUE_TYPES
}

/// Looks up a built-in value type by its conventional id (`color`, `font-size`, ...).
#[must_use]
pub fn standard_value_type(id: &str) -> Option<&'static ResolvedValueType> {
    STANDARD_VALUE_TYPES.iter().find(|t| t.id == id)
}

#[must_use]
pub fn standard_property_types() -> &'static [PropertyType] {
    &STANDARD_PROPERTY_TYPES
}

#[must_use]
pub fn standard_property_type(id: &str) -> Option<&'static PropertyType> {
    STANDARD_PROPERTY_TYPES.iter().find(|p| p.id == id)
}

#[must_use]
pub fn universal_property_type() -> &'static PropertyType {
    &UNIVERSAL_PROPERTY_TYPE
}
