use crate::model::DocumentKind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt::Display;
use thiserror::Error;

/// Crate-level error for callers that chain loading, validation and
/// resolution with `?`.
#[derive(Error, Debug, Diagnostic)]
pub enum TokenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LoadError {
    #[error("Invalid JSON: {message}")]
    #[diagnostic(
        code(load::invalid_json),
        help("The document must be a single well-formed JSON object.")
    )]
    Json {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("Invalid YAML: {message}")]
    #[diagnostic(code(load::invalid_yaml))]
    Yaml {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("Could not read {path}: {message}")]
    #[diagnostic(code(load::io))]
    Io { path: String, message: String },
}

/// A structural violation found by the schema validator.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{path}: missing required field `{field}`")]
    #[diagnostic(
        code(schema::missing_field),
        help("Add the missing field; the document cannot be interpreted without it.")
    )]
    MissingField { path: String, field: String },

    #[error("{path}: expected {expected}, found {found}")]
    #[diagnostic(code(schema::wrong_type))]
    WrongType {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: `{value}` is not one of {allowed}")]
    #[diagnostic(code(schema::invalid_enum))]
    InvalidEnum {
        path: String,
        value: String,
        allowed: String,
    },

    #[error("{path}: `{value}` does not match the {format} format")]
    #[diagnostic(
        code(schema::invalid_format),
        help("figmaFileKey values may only contain letters, digits, `_` and `-`.")
    )]
    InvalidFormat {
        path: String,
        value: String,
        format: String,
    },

    #[error("{path}: pattern `{pattern}` does not compile: {reason}")]
    #[diagnostic(code(schema::invalid_pattern))]
    InvalidPattern {
        path: String,
        pattern: String,
        reason: String,
    },

    #[error("{path}: minimum {minimum} is greater than maximum {maximum}")]
    #[diagnostic(code(schema::invalid_range))]
    InvalidRange {
        path: String,
        minimum: f64,
        maximum: f64,
    },

    #[error("{path}: {message}")]
    #[diagnostic(code(schema::invalid_value))]
    InvalidValue { path: String, message: String },

    #[error("{path}: unknown field `{field}`")]
    #[diagnostic(code(schema::unknown_field))]
    UnknownField { path: String, field: String },
}

impl SchemaError {
    /// Location of the offending node, e.g. `tokens[2].valuesByMode[0].modeIds`.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            SchemaError::MissingField { path, .. }
            | SchemaError::WrongType { path, .. }
            | SchemaError::InvalidEnum { path, .. }
            | SchemaError::InvalidFormat { path, .. }
            | SchemaError::InvalidPattern { path, .. }
            | SchemaError::InvalidRange { path, .. }
            | SchemaError::InvalidValue { path, .. }
            | SchemaError::UnknownField { path, .. } => path,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// The entity kind a foreign key points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Token,
    ResolvedValueType,
    Dimension,
    Mode,
    Platform,
    Taxonomy,
    TaxonomyTerm,
    Collection,
    Theme,
    PropertyType,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::Token => "token",
            ReferenceKind::ResolvedValueType => "resolved value type",
            ReferenceKind::Dimension => "dimension",
            ReferenceKind::Mode => "mode",
            ReferenceKind::Platform => "platform",
            ReferenceKind::Taxonomy => "taxonomy",
            ReferenceKind::TaxonomyTerm => "taxonomy term",
            ReferenceKind::Collection => "token collection",
            ReferenceKind::Theme => "theme",
            ReferenceKind::PropertyType => "property type",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("`{referencing_entity_id}` references missing {kind} `{missing_id}`")]
    #[diagnostic(
        code(reference::missing),
        help("Create the referenced entity or correct the id.")
    )]
    Missing {
        kind: ReferenceKind,
        missing_id: String,
        referencing_entity_id: String,
    },

    #[error("{kind} id `{id}` is defined more than once")]
    #[diagnostic(code(reference::duplicate_id))]
    Duplicate { kind: ReferenceKind, id: String },

    #[error("token `{token_id}` has a value entry with several modes of dimension `{dimension_id}`: {}", .mode_ids.join(", "))]
    #[diagnostic(
        code(reference::mode_conflict),
        help("A value entry may name at most one mode per dimension.")
    )]
    ModeConflict {
        token_id: String,
        dimension_id: String,
        mode_ids: Vec<String>,
    },

    #[error("token `{token_id}` has more than one value entry for modes [{}]", .mode_ids.join(", "))]
    #[diagnostic(
        code(reference::duplicate_mode_set),
        help("Merge the entries; identical mode sets can never be told apart during resolution.")
    )]
    DuplicateModeSet {
        token_id: String,
        mode_ids: Vec<String>,
    },

    #[error("more than one default theme: {}", .theme_ids.join(", "))]
    #[diagnostic(code(reference::multiple_default_themes))]
    MultipleDefaultThemes { theme_ids: Vec<String> },

    #[error("theme `{theme_id}` overrides token `{token_id}`, which is not themeable")]
    #[diagnostic(code(reference::not_themeable))]
    NotThemeable { token_id: String, theme_id: String },

    #[error("{document} belongs to system `{found}`, expected `{expected}`")]
    #[diagnostic(code(reference::system_mismatch))]
    SystemMismatch {
        document: DocumentKind,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum TypeError {
    #[error("token `{token_id}` ({expected_type}) aliases `{target_id}` of type {actual_type}")]
    #[diagnostic(
        code(types::alias_mismatch),
        help("An alias must point at a token with the same value type category.")
    )]
    AliasMismatch {
        token_id: String,
        target_id: String,
        expected_type: String,
        actual_type: String,
    },

    #[error("token `{token_id}` expects {expected_type}, got {actual_type}: {reason}")]
    #[diagnostic(code(types::literal_mismatch))]
    LiteralMismatch {
        token_id: String,
        expected_type: String,
        actual_type: String,
        reason: String,
    },

    #[error("token `{token_id}` of type {actual_type} cannot bind property `{property_type_id}` (accepts {expected_type})")]
    #[diagnostic(code(types::incompatible_property))]
    IncompatibleProperty {
        token_id: String,
        property_type_id: String,
        expected_type: String,
        actual_type: String,
    },

    #[error("token `{token_id}` of type {actual_type} is not allowed in collection `{collection_id}` (accepts {expected_type})")]
    #[diagnostic(code(types::collection_mismatch))]
    CollectionMismatch {
        token_id: String,
        collection_id: String,
        expected_type: String,
        actual_type: String,
    },
}

impl TypeError {
    #[must_use]
    pub fn token_id(&self) -> &str {
        match self {
            TypeError::AliasMismatch { token_id, .. }
            | TypeError::LiteralMismatch { token_id, .. }
            | TypeError::IncompatibleProperty { token_id, .. }
            | TypeError::CollectionMismatch { token_id, .. } => token_id,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum AliasError {
    #[error("alias cycle: {}", .chain.join(" -> "))]
    #[diagnostic(
        code(alias::cycle),
        help("Break the cycle by giving one of these tokens a literal value.")
    )]
    Cycle { chain: Vec<String> },

    #[error("alias chain longer than {max_depth}: {}", .chain.join(" -> "))]
    #[diagnostic(code(alias::depth_exceeded))]
    DepthExceeded { chain: Vec<String>, max_depth: usize },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("unknown token `{token_id}`")]
    #[diagnostic(code(resolve::unknown_token))]
    UnknownToken { token_id: String },

    #[error("token `{token_id}` has no value for the active mode combination [{}]", .active_modes.join(", "))]
    #[diagnostic(
        code(resolve::not_found),
        help("Add a value entry for these modes, or a default entry with empty modeIds.")
    )]
    NotFound {
        token_id: String,
        active_modes: Vec<String>,
    },

    #[error("token `{token_id}` has several equally specific values for the active modes: {}", .candidates.join(" | "))]
    #[diagnostic(code(resolve::ambiguous_match))]
    AmbiguousMatch {
        token_id: String,
        candidates: Vec<String>,
    },

    #[error("unknown theme `{theme_id}`")]
    #[diagnostic(code(resolve::unknown_theme))]
    UnknownTheme { theme_id: String },

    #[error("unknown platform `{platform_id}`")]
    #[diagnostic(code(resolve::unknown_platform))]
    UnknownPlatform { platform_id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Alias(#[from] AliasError),
}

/// Where a duplicated figmaFileKey was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOccurrence {
    pub kind: DocumentKind,
    /// Theme id or platform id of the document.
    pub id: String,
}

impl Display for KeyOccurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} `{}`", self.kind, self.id)
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("figmaFileKey `{key}` is used by {}", join_occurrences(.occurrences))]
#[diagnostic(
    code(uniqueness::duplicate_figma_file_key),
    help("Every theme override file and platform extension must link its own Figma file.")
)]
pub struct DuplicateKeyError {
    pub key: String,
    pub occurrences: Vec<KeyOccurrence>,
}

fn join_occurrences(occurrences: &[KeyOccurrence]) -> String {
    occurrences
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Type(#[from] TypeError),
}

/// Every violation found in one document.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("{} found {} validation error(s)", .kind, .errors.len())]
#[diagnostic(code(validation::failed))]
pub struct ValidationErrors {
    pub kind: DocumentKind,
    #[related]
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn schema_errors(&self) -> Vec<&SchemaError> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::Schema(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn reference_errors(&self) -> Vec<&ReferenceError> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::Reference(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn type_errors(&self) -> Vec<&TypeError> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::Type(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}
