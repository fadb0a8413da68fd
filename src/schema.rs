//! Structural validation.
//!
//! Each document kind is described by a [`Shape`] tree built once at first
//! use. [`SchemaValidator`] walks a raw `serde_json::Value` against that
//! tree and collects every violation, then deserializes the document into
//! its typed model. Checks that need the whole document graph (references,
//! type compatibility) live in other modules.

use crate::config::EngineConfig;
use crate::error::SchemaError;
use crate::model::{DocumentKind, PlatformExtension, StandardValueType, ThemeOverrideFile, TokenSystem};
use crate::utils::json_kind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

static FIGMA_FILE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

static STANDARD_TYPE_NAMES: Lazy<Vec<&'static str>> =
    Lazy::new(|| StandardValueType::ALL.iter().map(StandardValueType::as_str).collect());

const THEME_STATUSES: &[&str] = &["active", "deprecated"];

/// Whether `key` is an acceptable `figmaFileKey`.
#[must_use]
pub fn is_valid_figma_file_key(key: &str) -> bool {
    FIGMA_FILE_KEY.is_match(key)
}

/// Node-local invariant run after an object's fields have been checked.
pub type NodeCheck = fn(&Map<String, Value>, &str, &mut Vec<SchemaError>);

#[derive(Debug)]
pub enum Format {
    FigmaFileKey,
}

pub enum Shape {
    Any,
    String,
    NonEmptyString,
    Formatted(Format),
    Number,
    Boolean,
    Enum(Vec<&'static str>),
    Array(Box<Shape>),
    /// An object with free-form keys whose values share one shape.
    Map(Box<Shape>),
    Object(ObjectShape),
    /// Any non-null JSON value that is not an alias.
    Literal,
    /// A literal or an alias object `{ "tokenId": ... }`.
    TokenValue,
}

pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

pub struct ObjectShape {
    pub fields: Vec<Field>,
    pub checks: Vec<NodeCheck>,
}

fn req(name: &'static str, shape: Shape) -> Field {
    Field {
        name,
        shape,
        required: true,
    }
}

fn opt(name: &'static str, shape: Shape) -> Field {
    Field {
        name,
        shape,
        required: false,
    }
}

fn object(fields: Vec<Field>) -> Shape {
    Shape::Object(ObjectShape {
        fields,
        checks: Vec::new(),
    })
}

fn object_with_checks(fields: Vec<Field>, checks: Vec<NodeCheck>) -> Shape {
    Shape::Object(ObjectShape { fields, checks })
}

fn array(shape: Shape) -> Shape {
    Shape::Array(Box::new(shape))
}

fn mode_value_entry() -> Shape {
    object(vec![
        req("modeIds", array(Shape::NonEmptyString)),
        req("value", Shape::TokenValue),
        opt(
            "platformOverrides",
            array(object(vec![
                req("platformId", Shape::NonEmptyString),
                req("value", Shape::Literal),
            ])),
        ),
    ])
}

fn token_override() -> Shape {
    object(vec![
        req("tokenId", Shape::NonEmptyString),
        req("valuesByMode", array(mode_value_entry())),
    ])
}

fn check_validation_rules(node: &Map<String, Value>, path: &str, errors: &mut Vec<SchemaError>) {
    if let (Some(minimum), Some(maximum)) = (
        node.get("minimum").and_then(Value::as_f64),
        node.get("maximum").and_then(Value::as_f64),
    ) {
        if minimum > maximum {
            errors.push(SchemaError::InvalidRange {
                path: path.to_string(),
                minimum,
                maximum,
            });
        }
    }
    if let Some(pattern) = node.get("pattern").and_then(Value::as_str) {
        if let Err(err) = Regex::new(pattern) {
            errors.push(SchemaError::InvalidPattern {
                path: format!("{path}.pattern"),
                pattern: pattern.to_string(),
                reason: err.to_string(),
            });
        }
    }
}

static TOKEN_SYSTEM_SHAPE: Lazy<Shape> = Lazy::new(|| {
    let token = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        opt("description", Shape::String),
        req("resolvedValueTypeId", Shape::NonEmptyString),
        opt("tokenCollectionId", Shape::NonEmptyString),
        req("valuesByMode", array(mode_value_entry())),
        opt("codeSyntax", Shape::Map(Box::new(Shape::NonEmptyString))),
        opt(
            "taxonomies",
            array(object(vec![
                req("taxonomyId", Shape::NonEmptyString),
                req("termId", Shape::NonEmptyString),
            ])),
        ),
        opt("propertyTypes", array(Shape::NonEmptyString)),
        opt("private", Shape::Boolean),
        opt("themeable", Shape::Boolean),
    ]);

    let resolved_value_type = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        opt("type", Shape::Enum(STANDARD_TYPE_NAMES.clone())),
        opt("description", Shape::String),
        opt(
            "validation",
            object_with_checks(
                vec![
                    opt("pattern", Shape::String),
                    opt("minimum", Shape::Number),
                    opt("maximum", Shape::Number),
                ],
                vec![check_validation_rules as NodeCheck],
            ),
        ),
    ]);

    let dimension = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        opt("description", Shape::String),
        req(
            "modes",
            array(object(vec![
                req("id", Shape::NonEmptyString),
                req("displayName", Shape::String),
                opt("description", Shape::String),
            ])),
        ),
        opt("defaultMode", Shape::NonEmptyString),
    ]);

    let collection = object(vec![
        req("id", Shape::NonEmptyString),
        req("name", Shape::String),
        opt("description", Shape::String),
        req("resolvedValueTypeIds", array(Shape::NonEmptyString)),
    ]);

    let platform = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        opt("description", Shape::String),
    ]);

    let taxonomy = object(vec![
        req("id", Shape::NonEmptyString),
        req("name", Shape::String),
        opt("description", Shape::String),
        req(
            "terms",
            array(object(vec![
                req("id", Shape::NonEmptyString),
                req("name", Shape::String),
            ])),
        ),
    ]);

    let theme = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        opt("description", Shape::String),
        req("status", Shape::Enum(THEME_STATUSES.to_vec())),
        req("isDefault", Shape::Boolean),
        opt(
            "overrideSource",
            object(vec![
                req("repositoryUri", Shape::NonEmptyString),
                req("filePath", Shape::NonEmptyString),
            ]),
        ),
    ]);

    let property_type = object(vec![
        req("id", Shape::NonEmptyString),
        req("displayName", Shape::String),
        req("category", Shape::String),
        req("compatibleValueTypes", array(Shape::NonEmptyString)),
        opt(
            "platformMappings",
            object(vec![
                opt("web", Shape::String),
                opt("ios", Shape::String),
                opt("android", Shape::String),
            ]),
        ),
        opt(
            "inheritance",
            object(vec![req("inherits", Shape::Boolean), opt("initialValue", Shape::Any)]),
        ),
    ]);

    object(vec![
        req("systemId", Shape::NonEmptyString),
        req("systemName", Shape::String),
        opt("description", Shape::String),
        opt("version", Shape::String),
        req("tokens", array(token)),
        opt("tokenCollections", array(collection)),
        req("dimensions", array(dimension)),
        opt("dimensionOrder", array(Shape::NonEmptyString)),
        opt("platforms", array(platform)),
        opt("taxonomies", array(taxonomy)),
        req("resolvedValueTypes", array(resolved_value_type)),
        opt("themes", array(theme)),
        opt("propertyTypes", array(property_type)),
    ])
});

static THEME_OVERRIDE_FILE_SHAPE: Lazy<Shape> = Lazy::new(|| {
    object(vec![
        req("systemId", Shape::NonEmptyString),
        req("themeId", Shape::NonEmptyString),
        req("figmaFileKey", Shape::Formatted(Format::FigmaFileKey)),
        req("tokenOverrides", array(token_override())),
    ])
});

static PLATFORM_EXTENSION_SHAPE: Lazy<Shape> = Lazy::new(|| {
    object(vec![
        req("platformId", Shape::NonEmptyString),
        req("systemId", Shape::NonEmptyString),
        opt("figmaFileKey", Shape::Formatted(Format::FigmaFileKey)),
        opt("tokenOverrides", array(token_override())),
    ])
});

/// The declared shape of a document kind.
#[must_use]
pub fn shape_of(kind: DocumentKind) -> &'static Shape {
    match kind {
        DocumentKind::TokenSystem => &TOKEN_SYSTEM_SHAPE,
        DocumentKind::ThemeOverrideFile => &THEME_OVERRIDE_FILE_SHAPE,
        DocumentKind::PlatformExtension => &PLATFORM_EXTENSION_SHAPE,
    }
}

pub struct SchemaValidator<'a> {
    config: &'a EngineConfig,
}

impl<'a> SchemaValidator<'a> {
    #[must_use]
    pub fn new(config: &'a EngineConfig) -> Self {
        SchemaValidator { config }
    }

    /// Every structural violation in `document`; empty when it conforms.
    #[must_use]
    pub fn check(&self, document: &Value, kind: DocumentKind) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        self.check_node(shape_of(kind), document, "$", &mut errors);
        if kind == DocumentKind::PlatformExtension
            && self.config.require_platform_figma_file_key
            && document.get("figmaFileKey").is_none()
        {
            errors.push(SchemaError::MissingField {
                path: "$".to_string(),
                field: "figmaFileKey".to_string(),
            });
        }
        log::debug!("schema check of {kind} found {} error(s)", errors.len());
        errors
    }

    /// Checks `document` and deserializes it into its typed model.
    ///
    /// # Errors
    /// Returns every schema violation found.
    pub fn validate<T: DeserializeOwned>(
        &self,
        document: &Value,
        kind: DocumentKind,
    ) -> Result<T, Vec<SchemaError>> {
        let errors = self.check(document, kind);
        if !errors.is_empty() {
            return Err(errors);
        }
        T::deserialize(document).map_err(|err| {
            vec![SchemaError::InvalidValue {
                path: "$".to_string(),
                message: err.to_string(),
            }]
        })
    }

    /// # Errors
    /// Returns every schema violation found.
    pub fn validate_token_system(&self, document: &Value) -> Result<TokenSystem, Vec<SchemaError>> {
        self.validate(document, DocumentKind::TokenSystem)
    }

    /// # Errors
    /// Returns every schema violation found.
    pub fn validate_theme_override_file(
        &self,
        document: &Value,
    ) -> Result<ThemeOverrideFile, Vec<SchemaError>> {
        self.validate(document, DocumentKind::ThemeOverrideFile)
    }

    /// # Errors
    /// Returns every schema violation found.
    pub fn validate_platform_extension(
        &self,
        document: &Value,
    ) -> Result<PlatformExtension, Vec<SchemaError>> {
        self.validate(document, DocumentKind::PlatformExtension)
    }

    fn check_node(&self, shape: &Shape, value: &Value, path: &str, errors: &mut Vec<SchemaError>) {
        match shape {
            Shape::Any => {}
            Shape::String => {
                expect_kind(value.is_string(), "string", value, path, errors);
            }
            Shape::NonEmptyString => match value.as_str() {
                Some(s) if s.trim().is_empty() => errors.push(SchemaError::InvalidValue {
                    path: path.to_string(),
                    message: "must not be empty".to_string(),
                }),
                Some(_) => {}
                None => expect_kind(false, "string", value, path, errors),
            },
            Shape::Formatted(Format::FigmaFileKey) => match value.as_str() {
                Some(key) if !is_valid_figma_file_key(key) => {
                    errors.push(SchemaError::InvalidFormat {
                        path: path.to_string(),
                        value: key.to_string(),
                        format: "figmaFileKey".to_string(),
                    });
                }
                Some(_) => {}
                None => expect_kind(false, "string", value, path, errors),
            },
            Shape::Number => {
                expect_kind(value.is_number(), "number", value, path, errors);
            }
            Shape::Boolean => {
                expect_kind(value.is_boolean(), "boolean", value, path, errors);
            }
            Shape::Enum(allowed) => match value.as_str() {
                Some(s) if !allowed.contains(&s) => errors.push(SchemaError::InvalidEnum {
                    path: path.to_string(),
                    value: s.to_string(),
                    allowed: allowed.join(", "),
                }),
                Some(_) => {}
                None => expect_kind(false, "string", value, path, errors),
            },
            Shape::Array(element) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check_node(element, item, &format!("{path}[{i}]"), errors);
                    }
                }
                None => expect_kind(false, "array", value, path, errors),
            },
            Shape::Map(element) => match value.as_object() {
                Some(members) => {
                    for (key, item) in members {
                        self.check_node(element, item, &format!("{path}.{key}"), errors);
                    }
                }
                None => expect_kind(false, "object", value, path, errors),
            },
            Shape::Object(object) => match value.as_object() {
                Some(members) => self.check_object(object, members, path, errors),
                None => expect_kind(false, "object", value, path, errors),
            },
            Shape::Literal => match value {
                Value::Null => errors.push(SchemaError::InvalidValue {
                    path: path.to_string(),
                    message: "value must not be null".to_string(),
                }),
                Value::Object(members) if members.contains_key("tokenId") => {
                    errors.push(SchemaError::InvalidValue {
                        path: path.to_string(),
                        message: "a literal is required here, found an alias".to_string(),
                    });
                }
                _ => {}
            },
            Shape::TokenValue => match value {
                Value::Null => errors.push(SchemaError::InvalidValue {
                    path: path.to_string(),
                    message: "value must not be null".to_string(),
                }),
                Value::Object(members) if members.contains_key("tokenId") => {
                    let target_path = format!("{path}.tokenId");
                    self.check_node(&Shape::NonEmptyString, &members["tokenId"], &target_path, errors);
                    if members.len() > 1 {
                        errors.push(SchemaError::InvalidValue {
                            path: path.to_string(),
                            message: "an alias object may only contain `tokenId`".to_string(),
                        });
                    }
                }
                _ => {}
            },
        }
    }

    fn check_object(
        &self,
        object: &ObjectShape,
        members: &Map<String, Value>,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        for field in &object.fields {
            match members.get(field.name) {
                Some(value) => {
                    self.check_node(&field.shape, value, &format!("{path}.{}", field.name), errors);
                }
                None if field.required => errors.push(SchemaError::MissingField {
                    path: path.to_string(),
                    field: field.name.to_string(),
                }),
                None => {}
            }
        }
        for key in members.keys() {
            if object.fields.iter().any(|f| f.name == key) {
                continue;
            }
            if self.config.allow_unknown_fields {
                log::warn!("{path}: ignoring unknown field `{key}`");
            } else {
                errors.push(SchemaError::UnknownField {
                    path: path.to_string(),
                    field: key.clone(),
                });
            }
        }
        for check in &object.checks {
            check(members, path, errors);
        }
    }
}

fn expect_kind(ok: bool, expected: &str, value: &Value, path: &str, errors: &mut Vec<SchemaError>) {
    if !ok {
        errors.push(SchemaError::WrongType {
            path: path.to_string(),
            expected: expected.to_string(),
            found: json_kind(value).to_string(),
        });
    }
}
