//! Typed data model for token systems, theme override files and platform
//! extensions.
//!
//! Field names follow the exchanged JSON documents exactly (`valuesByMode`,
//! `modeIds`, `figmaFileKey`, ...), so a document deserialized into these
//! types serializes back with the same keys.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::ops::Deref;

/// The fixed set of standard value categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandardValueType {
    Color,
    Dimension,
    Spacing,
    FontFamily,
    FontWeight,
    FontSize,
    LineHeight,
    LetterSpacing,
    Duration,
    CubicBezier,
    Blur,
    Spread,
    Radius,
}

impl StandardValueType {
    pub const ALL: [StandardValueType; 13] = [
        StandardValueType::Color,
        StandardValueType::Dimension,
        StandardValueType::Spacing,
        StandardValueType::FontFamily,
        StandardValueType::FontWeight,
        StandardValueType::FontSize,
        StandardValueType::LineHeight,
        StandardValueType::LetterSpacing,
        StandardValueType::Duration,
        StandardValueType::CubicBezier,
        StandardValueType::Blur,
        StandardValueType::Spread,
        StandardValueType::Radius,
    ];

    /// The upper-snake-case name used in documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardValueType::Color => "COLOR",
            StandardValueType::Dimension => "DIMENSION",
            StandardValueType::Spacing => "SPACING",
            StandardValueType::FontFamily => "FONT_FAMILY",
            StandardValueType::FontWeight => "FONT_WEIGHT",
            StandardValueType::FontSize => "FONT_SIZE",
            StandardValueType::LineHeight => "LINE_HEIGHT",
            StandardValueType::LetterSpacing => "LETTER_SPACING",
            StandardValueType::Duration => "DURATION",
            StandardValueType::CubicBezier => "CUBIC_BEZIER",
            StandardValueType::Blur => "BLUR",
            StandardValueType::Spread => "SPREAD",
            StandardValueType::Radius => "RADIUS",
        }
    }

    /// The conventional lower-kebab-case id of the built-in value type.
    #[must_use]
    pub fn default_id(&self) -> &'static str {
        match self {
            StandardValueType::Color => "color",
            StandardValueType::Dimension => "dimension",
            StandardValueType::Spacing => "spacing",
            StandardValueType::FontFamily => "font-family",
            StandardValueType::FontWeight => "font-weight",
            StandardValueType::FontSize => "font-size",
            StandardValueType::LineHeight => "line-height",
            StandardValueType::LetterSpacing => "letter-spacing",
            StandardValueType::Duration => "duration",
            StandardValueType::CubicBezier => "cubic-bezier",
            StandardValueType::Blur => "blur",
            StandardValueType::Spread => "spread",
            StandardValueType::Radius => "radius",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl Display for StandardValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional literal constraints declared on a value type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedValueType {
    pub id: String,
    pub display_name: String,
    /// Absent for custom value types.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<StandardValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

impl ResolvedValueType {
    /// The category two value types must share for an alias between them.
    #[must_use]
    pub fn category(&self) -> ValueCategory<'_> {
        match self.value_type {
            Some(standard) => ValueCategory::Standard(standard),
            None => ValueCategory::Custom(&self.id),
        }
    }
}

/// Standard types compare by enum member, custom types by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory<'a> {
    Standard(StandardValueType),
    Custom(&'a str),
}

impl Display for ValueCategory<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueCategory::Standard(t) => write!(f, "{t}"),
            ValueCategory::Custom(id) => write!(f, "custom:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub modes: Vec<Mode>,
    /// Falls back to the first mode when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<String>,
}

impl Dimension {
    #[must_use]
    pub fn default_mode_id(&self) -> Option<&str> {
        self.default_mode
            .as_deref()
            .or_else(|| self.modes.first().map(|m| m.id.as_str()))
    }

    #[must_use]
    pub fn has_mode(&self, mode_id: &str) -> bool {
        self.modes.iter().any(|m| m.id == mode_id)
    }
}

/// Reference to another token used in place of a literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AliasRef {
    pub token_id: String,
}

/// Either an alias `{ "tokenId": ... }` or an opaque literal payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Alias(AliasRef),
    Literal(Value),
}

impl TokenValue {
    #[must_use]
    pub fn alias(token_id: impl Into<String>) -> Self {
        TokenValue::Alias(AliasRef {
            token_id: token_id.into(),
        })
    }

    #[must_use]
    pub fn alias_target(&self) -> Option<&str> {
        match self {
            TokenValue::Alias(alias) => Some(&alias.token_id),
            TokenValue::Literal(_) => None,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            TokenValue::Literal(value) => Some(value),
            TokenValue::Alias(_) => None,
        }
    }
}

impl From<Value> for TokenValue {
    fn from(value: Value) -> Self {
        TokenValue::Literal(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverride {
    pub platform_id: String,
    pub value: Value,
}

/// One value of a token, applicable when all of `mode_ids` are active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeValueEntry {
    /// Set semantics; document order is preserved for round-trips.
    pub mode_ids: Vec<String>,
    pub value: TokenValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platform_overrides: Vec<PlatformOverride>,
}

impl ModeValueEntry {
    #[must_use]
    pub fn new<I, S>(mode_ids: I, value: TokenValue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModeValueEntry {
            mode_ids: mode_ids.into_iter().map(Into::into).collect(),
            value,
            platform_overrides: Vec::new(),
        }
    }

    #[must_use]
    pub fn platform_override(&self, platform_id: &str) -> Option<&Value> {
        self.platform_overrides
            .iter()
            .find(|o| o.platform_id == platform_id)
            .map(|o| &o.value)
    }

    /// The mode ids as a sorted, deduplicated list.
    #[must_use]
    pub fn mode_set(&self) -> Vec<&str> {
        let mut set: Vec<&str> = self.mode_ids.iter().map(String::as_str).collect();
        set.sort_unstable();
        set.dedup();
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyRef {
    pub taxonomy_id: String,
    pub term_id: String,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resolved_value_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_collection_id: Option<String>,
    pub values_by_mode: Vec<ModeValueEntry>,
    /// Platform id to the token's name on that platform.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub code_syntax: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taxonomies: Vec<TaxonomyRef>,
    /// Property types this token may be bound to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub themeable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMappings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInheritance {
    pub inherits: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
}

/// A bindable UI/export property and the value types it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyType {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub compatible_value_types: Vec<String>,
    #[serde(default)]
    pub platform_mappings: PlatformMappings,
    #[serde(default)]
    pub inheritance: PropertyInheritance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCollection {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resolved_value_type_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyTerm {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub terms: Vec<TaxonomyTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeStatus {
    Active,
    Deprecated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSource {
    pub repository_uri: String,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ThemeStatus,
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_source: Option<OverrideSource>,
}

/// The core document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSystem {
    pub system_id: String,
    pub system_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_collections: Vec<TokenCollection>,
    pub dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimension_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taxonomies: Vec<Taxonomy>,
    pub resolved_value_types: Vec<ResolvedValueType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<Theme>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<PropertyType>,
}

impl TokenSystem {
    #[must_use]
    pub fn token(&self, id: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn resolved_value_type(&self, id: &str) -> Option<&ResolvedValueType> {
        self.resolved_value_types.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    /// The dimension owning `mode_id`, if any.
    #[must_use]
    pub fn dimension_of_mode(&self, mode_id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.has_mode(mode_id))
    }

    #[must_use]
    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn platform(&self, id: &str) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Dimensions in `dimensionOrder` first, then the remaining ones in
    /// document order.
    #[must_use]
    pub fn ordered_dimensions(&self) -> Vec<&Dimension> {
        let mut ordered: Vec<&Dimension> = self
            .dimension_order
            .iter()
            .filter_map(|id| self.dimension(id))
            .collect();
        for dimension in &self.dimensions {
            if !ordered.iter().any(|d| d.id == dimension.id) {
                ordered.push(dimension);
            }
        }
        ordered
    }
}

/// Values supplied for one token by an override document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOverride {
    pub token_id: String,
    pub values_by_mode: Vec<ModeValueEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeOverrideFile {
    pub system_id: String,
    pub theme_id: String,
    /// Required by the schema; optional here so partially loaded documents
    /// can still take part in uniqueness checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_file_key: Option<String>,
    pub token_overrides: Vec<TokenOverride>,
}

impl ThemeOverrideFile {
    #[must_use]
    pub fn token_override(&self, token_id: &str) -> Option<&TokenOverride> {
        self.token_overrides.iter().find(|o| o.token_id == token_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformExtension {
    pub platform_id: String,
    pub system_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_file_key: Option<String>,
    #[serde(default)]
    pub token_overrides: Vec<TokenOverride>,
}

impl PlatformExtension {
    #[must_use]
    pub fn token_override(&self, token_id: &str) -> Option<&TokenOverride> {
        self.token_overrides.iter().find(|o| o.token_id == token_id)
    }
}

/// The three document kinds the engine validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    TokenSystem,
    ThemeOverrideFile,
    PlatformExtension,
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::TokenSystem => write!(f, "token system"),
            DocumentKind::ThemeOverrideFile => write!(f, "theme override file"),
            DocumentKind::PlatformExtension => write!(f, "platform extension"),
        }
    }
}

/// Dimension id to active mode id.
pub type ActiveModes = BTreeMap<String, String>;

/// A token system that passed schema, reference and type checks, with id
/// lookups prepared for resolution.
#[derive(Debug, Clone)]
pub struct ValidatedTokenSystem {
    system: TokenSystem,
    tokens: HashMap<String, usize>,
    value_types: HashMap<String, usize>,
    mode_dimensions: HashMap<String, usize>,
}

impl ValidatedTokenSystem {
    pub(crate) fn new(system: TokenSystem) -> Self {
        let tokens = system
            .tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let value_types = system
            .resolved_value_types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let mode_dimensions = system
            .dimensions
            .iter()
            .enumerate()
            .flat_map(|(i, d)| d.modes.iter().map(move |m| (m.id.clone(), i)))
            .collect();
        ValidatedTokenSystem {
            system,
            tokens,
            value_types,
            mode_dimensions,
        }
    }

    #[must_use]
    pub fn token(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id).map(|&i| &self.system.tokens[i])
    }

    #[must_use]
    pub fn resolved_value_type(&self, id: &str) -> Option<&ResolvedValueType> {
        self.value_types
            .get(id)
            .map(|&i| &self.system.resolved_value_types[i])
    }

    #[must_use]
    pub fn dimension_of_mode(&self, mode_id: &str) -> Option<&Dimension> {
        self.mode_dimensions
            .get(mode_id)
            .map(|&i| &self.system.dimensions[i])
    }

    /// The default mode of every dimension, keyed by dimension id.
    #[must_use]
    pub fn default_modes(&self) -> ActiveModes {
        self.system
            .ordered_dimensions()
            .into_iter()
            .filter_map(|d| Some((d.id.clone(), d.default_mode_id()?.to_string())))
            .collect()
    }

    /// Fills dimensions missing from `active` with their default modes.
    #[must_use]
    pub fn complete_modes(&self, active: &ActiveModes) -> ActiveModes {
        let mut complete = self.default_modes();
        complete.extend(active.iter().map(|(k, v)| (k.clone(), v.clone())));
        complete
    }

    #[must_use]
    pub fn into_inner(self) -> TokenSystem {
        self.system
    }
}

impl Deref for ValidatedTokenSystem {
    type Target = TokenSystem;

    fn deref(&self) -> &Self::Target {
        &self.system
    }
}

/// Serializes as the plain core document; the indexes are rebuilt on load.
impl Serialize for ValidatedTokenSystem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.system.serialize(serializer)
    }
}

/// A theme override file that passed schema (and, when linked, reference
/// and type) checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedThemeOverrideFile(pub(crate) ThemeOverrideFile);

impl ValidatedThemeOverrideFile {
    #[must_use]
    pub fn into_inner(self) -> ThemeOverrideFile {
        self.0
    }
}

impl Deref for ValidatedThemeOverrideFile {
    type Target = ThemeOverrideFile;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
