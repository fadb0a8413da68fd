//! Type compatibility between tokens, their literal values, their alias
//! targets and the properties they can be bound to.

use crate::catalog;
use crate::error::TypeError;
use crate::model::{
    ModeValueEntry, PropertyType, ResolvedValueType, StandardValueType, Token, TokenOverride, TokenSystem,
    TokenValue, ValueCategory,
};
use crate::utils::{json_kind, leading_number, normalize_id};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());
static COLOR_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z-]+\(.*\)$").unwrap());
static COLOR_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static NUMBER_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(\d+(\.\d*)?|\.\d+)([a-zA-Z]+|%)?$").unwrap());

/// Property types a token of value type `resolved_value_type_id` may be
/// bound to, always ending with the universal `ALL` entry.
///
/// Standard types match on `compatibleValueTypes`. Custom types use explicit
/// listings when a property names them, and otherwise fall back to matching
/// property ids against the value type id, ignoring case and separators.
#[must_use]
pub fn compatible_property_types(system: &TokenSystem, resolved_value_type_id: &str) -> Vec<PropertyType> {
    let available = property_catalog(system);
    let value_type = system
        .resolved_value_type(resolved_value_type_id)
        .or_else(|| catalog::standard_value_type(resolved_value_type_id));

    let mut matches: Vec<PropertyType> = match value_type.and_then(|t| t.value_type) {
        Some(standard) => available
            .iter()
            .filter(|p| {
                p.compatible_value_types
                    .iter()
                    .any(|id| id == resolved_value_type_id || id == standard.default_id())
            })
            .map(|p| (*p).clone())
            .collect(),
        None => {
            let listed: Vec<PropertyType> = available
                .iter()
                .filter(|p| p.compatible_value_types.iter().any(|id| id == resolved_value_type_id))
                .map(|p| (*p).clone())
                .collect();
            if listed.is_empty() {
                let wanted = normalize_id(resolved_value_type_id);
                available
                    .iter()
                    .filter(|p| {
                        let candidate = normalize_id(&p.id);
                        !wanted.is_empty() && (candidate.contains(&wanted) || wanted.contains(&candidate))
                    })
                    .map(|p| (*p).clone())
                    .collect()
            } else {
                listed
            }
        }
    };
    matches.push(catalog::universal_property_type().clone());
    log::trace!(
        "{} property type(s) compatible with `{resolved_value_type_id}`",
        matches.len()
    );
    matches
}

/// The standard property types with the system's own declarations layered
/// on top by id.
fn property_catalog(system: &TokenSystem) -> Vec<&PropertyType> {
    let mut catalog: Vec<&PropertyType> = catalog::standard_property_types()
        .iter()
        .map(|standard| {
            system
                .property_types
                .iter()
                .find(|p| p.id == standard.id)
                .unwrap_or(standard)
        })
        .collect();
    for declared in &system.property_types {
        if !catalog.iter().any(|p| p.id == declared.id) {
            catalog.push(declared);
        }
    }
    catalog
}

pub struct TypeChecker<'a> {
    system: &'a TokenSystem,
    patterns: HashMap<&'a str, Regex>,
    strict_categories: bool,
}

impl<'a> TypeChecker<'a> {
    /// Compiles the value types' patterns once. Patterns that do not compile
    /// are reported by the schema validator and skipped here.
    #[must_use]
    pub fn new(system: &'a TokenSystem) -> Self {
        let patterns = system
            .resolved_value_types
            .iter()
            .filter_map(|t| {
                let pattern = t.validation.as_ref()?.pattern.as_deref()?;
                Regex::new(pattern).ok().map(|re| (t.id.as_str(), re))
            })
            .collect();
        TypeChecker {
            system,
            patterns,
            strict_categories: false,
        }
    }

    /// Turns literals that do not look like their standard category into
    /// errors. Otherwise they are only logged.
    #[must_use]
    pub fn with_strict_categories(mut self, strict: bool) -> Self {
        self.strict_categories = strict;
        self
    }

    /// Checks one value entry's main value against the token's value type.
    ///
    /// # Errors
    /// Returns the first mismatch of the literal or of the alias target.
    pub fn check_value(&self, token: &Token, entry: &ModeValueEntry) -> Result<(), TypeError> {
        self.check_token_value(token, &entry.value)
    }

    /// Every type error in the core document.
    #[must_use]
    pub fn check_system(&self) -> Vec<TypeError> {
        let mut errors = Vec::new();
        for token in &self.system.tokens {
            let Some(value_type) = self.system.resolved_value_type(&token.resolved_value_type_id) else {
                continue;
            };
            for entry in &token.values_by_mode {
                self.check_entry(token, entry, &mut errors);
            }
            self.check_bindings(token, value_type, &mut errors);
        }
        log::debug!(
            "type check of system `{}` found {} error(s)",
            self.system.system_id,
            errors.len()
        );
        errors
    }

    /// Type errors of override entries, checked against the core tokens.
    #[must_use]
    pub fn check_overrides(&self, overrides: &[TokenOverride]) -> Vec<TypeError> {
        let mut errors = Vec::new();
        for token_override in overrides {
            let Some(token) = self.system.token(&token_override.token_id) else {
                continue;
            };
            for entry in &token_override.values_by_mode {
                self.check_entry(token, entry, &mut errors);
            }
        }
        errors
    }

    fn check_entry(&self, token: &Token, entry: &ModeValueEntry, errors: &mut Vec<TypeError>) {
        if let Err(err) = self.check_value(token, entry) {
            errors.push(err);
        }
        let Some(value_type) = self.system.resolved_value_type(&token.resolved_value_type_id) else {
            return;
        };
        for platform_override in &entry.platform_overrides {
            if let Err(err) = self.check_literal(&token.id, value_type, &platform_override.value) {
                errors.push(err);
            }
        }
    }

    fn check_token_value(&self, token: &Token, value: &TokenValue) -> Result<(), TypeError> {
        let Some(value_type) = self.system.resolved_value_type(&token.resolved_value_type_id) else {
            return Ok(());
        };
        match value {
            TokenValue::Literal(literal) => self.check_literal(&token.id, value_type, literal),
            TokenValue::Alias(alias) => {
                let Some(target) = self.system.token(&alias.token_id) else {
                    return Ok(());
                };
                let Some(target_type) = self.system.resolved_value_type(&target.resolved_value_type_id) else {
                    return Ok(());
                };
                if value_type.category() == target_type.category() {
                    Ok(())
                } else {
                    Err(TypeError::AliasMismatch {
                        token_id: token.id.clone(),
                        target_id: target.id.clone(),
                        expected_type: value_type.category().to_string(),
                        actual_type: target_type.category().to_string(),
                    })
                }
            }
        }
    }

    /// Checks a literal against its value type's declared `validation` rules.
    /// Without rules any literal is accepted. A literal that does not look
    /// like its standard category is logged, and rejected only in strict mode.
    ///
    /// # Errors
    /// Returns a `LiteralMismatch` naming the first failed rule.
    pub fn check_literal(&self, token_id: &str, value_type: &ResolvedValueType, literal: &Value) -> Result<(), TypeError> {
        let fail = |reason: String| TypeError::LiteralMismatch {
            token_id: token_id.to_string(),
            expected_type: value_type.category().to_string(),
            actual_type: json_kind(literal).to_string(),
            reason,
        };

        if let ValueCategory::Standard(standard) = value_type.category() {
            if let Some(reason) = category_mismatch(standard, literal) {
                if self.strict_categories {
                    return Err(fail(reason));
                }
                log::warn!("token `{token_id}`: {reason} for {standard}");
            }
        }

        if let Some(pattern) = self.patterns.get(value_type.id.as_str()) {
            let text = match literal {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            match text {
                Some(text) if !pattern.is_match(&text) => {
                    return Err(fail(format!("`{text}` does not match pattern `{}`", pattern.as_str())));
                }
                None => return Err(fail(format!("pattern `{}` needs a string or number", pattern.as_str()))),
                Some(_) => {}
            }
        }

        if let Some(rules) = &value_type.validation {
            if rules.minimum.is_some() || rules.maximum.is_some() {
                let Some(number) = leading_number(literal) else {
                    return Err(fail("a numeric value is required by the declared range".to_string()));
                };
                if let Some(minimum) = rules.minimum {
                    if number < minimum {
                        return Err(fail(format!("{number} is below the minimum {minimum}")));
                    }
                }
                if let Some(maximum) = rules.maximum {
                    if number > maximum {
                        return Err(fail(format!("{number} is above the maximum {maximum}")));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_bindings(&self, token: &Token, value_type: &ResolvedValueType, errors: &mut Vec<TypeError>) {
        if let Some(collection_id) = &token.token_collection_id {
            if let Some(collection) = self.system.token_collections.iter().find(|c| &c.id == collection_id) {
                if !collection.resolved_value_type_ids.contains(&value_type.id) {
                    errors.push(TypeError::CollectionMismatch {
                        token_id: token.id.clone(),
                        collection_id: collection.id.clone(),
                        expected_type: collection.resolved_value_type_ids.join(" | "),
                        actual_type: value_type.id.clone(),
                    });
                }
            }
        }

        if token.property_types.is_empty() {
            return;
        }
        let compatible = compatible_property_types(self.system, &value_type.id);
        for property_type_id in &token.property_types {
            if compatible.iter().any(|p| &p.id == property_type_id) {
                continue;
            }
            let accepted = property_catalog(self.system)
                .into_iter()
                .find(|p| &p.id == property_type_id)
                .map(|p| p.compatible_value_types.join(" | "));
            if let Some(expected_type) = accepted {
                errors.push(TypeError::IncompatibleProperty {
                    token_id: token.id.clone(),
                    property_type_id: property_type_id.clone(),
                    expected_type,
                    actual_type: value_type.id.clone(),
                });
            }
        }
    }
}

/// Why `literal` cannot be a value of the standard category, if it cannot.
fn category_mismatch(standard: StandardValueType, literal: &Value) -> Option<String> {
    match standard {
        StandardValueType::Color => match literal {
            Value::String(s) => {
                let s = s.trim();
                let recognized = HEX_COLOR.is_match(s) || COLOR_FUNCTION.is_match(s) || COLOR_KEYWORD.is_match(s);
                (!recognized).then(|| format!("`{s}` is not a recognizable color"))
            }
            Value::Object(_) => None,
            _ => Some("a color string or color object is required".to_string()),
        },
        StandardValueType::FontFamily => {
            (!literal.is_string()).then(|| "a font family name is required".to_string())
        }
        StandardValueType::FontWeight => match literal {
            Value::Number(_) | Value::String(_) => None,
            _ => Some("a numeric or named font weight is required".to_string()),
        },
        StandardValueType::CubicBezier => match literal {
            Value::String(_) => None,
            Value::Array(points) if points.len() == 4 && points.iter().all(Value::is_number) => None,
            _ => Some("four control point numbers or an easing string are required".to_string()),
        },
        StandardValueType::LineHeight => match literal {
            Value::String(s) if s == "normal" => None,
            _ => numeric_mismatch(literal),
        },
        StandardValueType::Dimension
        | StandardValueType::Spacing
        | StandardValueType::FontSize
        | StandardValueType::LetterSpacing
        | StandardValueType::Duration
        | StandardValueType::Blur
        | StandardValueType::Spread
        | StandardValueType::Radius => numeric_mismatch(literal),
    }
}

fn numeric_mismatch(literal: &Value) -> Option<String> {
    match literal {
        Value::Number(_) => None,
        Value::String(s) if NUMBER_WITH_UNIT.is_match(s.trim()) => None,
        Value::String(s) => Some(format!("`{s}` is not a number with an optional unit")),
        _ => Some("a number with an optional unit is required".to_string()),
    }
}
