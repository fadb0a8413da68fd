use crate::compat::{self, TypeChecker};
use crate::config::EngineConfig;
use crate::error::{LoadError, ResolutionError, TokenError, ValidationError, ValidationErrors};
use crate::model::{
    DocumentKind, PlatformExtension, PropertyType, ThemeOverrideFile, ThemeStatus,
    ValidatedThemeOverrideFile, ValidatedTokenSystem,
};
use crate::references::ReferenceChecker;
use crate::resolver::{ResolutionContext, ResolvedValue, Resolver};
use crate::schema::SchemaValidator;
use crate::uniqueness::{self, UniquenessReport};
use crate::utils::offset_from_line_and_column;
use miette::NamedSource;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// The outcome of validating a platform extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    /// The typed document, present whenever it passed the schema check.
    pub extension: Option<PlatformExtension>,
}

impl ValidatedTokenSystem {
    /// Serializes the system back into a pretty-printed JSON document.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_json(self)
    }

    /// Serializes the system into a YAML document.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        to_yaml(self)
    }
}

/// # Errors
/// Returns a `serde_json::Error` if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(document: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// # Errors
/// Returns a `serde_yaml::Error` if serialization fails.
pub fn to_yaml<T: Serialize + ?Sized>(document: &T) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(document)
}

/// Parses a document's text. Names ending in `.yaml` or `.yml` are read as
/// YAML, everything else as JSON.
///
/// # Errors
/// Returns a `LoadError` pointing at the offending position when the text
/// does not parse.
pub fn parse_document(source: &str, file_name: &str) -> Result<Value, LoadError> {
    let is_yaml = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(source).map_err(|err| {
            let offset = err.location().map_or(0, |location| location.index());
            LoadError::Yaml {
                src: NamedSource::new(file_name, source.to_string()),
                span: span_at(source, offset),
                message: err.to_string(),
            }
        })
    } else {
        serde_json::from_str(source).map_err(|err| {
            let offset = offset_from_line_and_column(source, err.line(), err.column());
            LoadError::Json {
                src: NamedSource::new(file_name, source.to_string()),
                span: span_at(source, offset),
                message: err.to_string(),
            }
        })
    }
}

fn span_at(source: &str, offset: usize) -> miette::SourceSpan {
    let offset = offset.min(source.len());
    let len = usize::from(offset < source.len());
    (offset, len).into()
}

/// Reads and parses a document from disk.
///
/// # Errors
/// Returns `LoadError::Io` if the file cannot be read, or a parse error.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse_document(&source, &path.to_string_lossy())
}

/// Loads and validates a token system file in one step.
///
/// # Errors
/// Returns a `TokenError` if loading or validation fails.
pub fn load_token_system(path: impl AsRef<Path>) -> Result<ValidatedTokenSystem, TokenError> {
    let document = load_document(path)?;
    Ok(validate_token_system(&document)?)
}

/// Validates a core token system document: schema first, then references
/// and types together.
///
/// # Errors
/// Returns every violation found. Schema errors stop validation before the
/// reference and type checks run.
pub fn validate_token_system(document: &Value) -> Result<ValidatedTokenSystem, ValidationErrors> {
    validate_token_system_with_config(document, &EngineConfig::default())
}

/// # Errors
/// See [`validate_token_system`].
pub fn validate_token_system_with_config(
    document: &Value,
    config: &EngineConfig,
) -> Result<ValidatedTokenSystem, ValidationErrors> {
    let kind = DocumentKind::TokenSystem;
    let system = SchemaValidator::new(config)
        .validate_token_system(document)
        .map_err(|errors| schema_failure(kind, errors))?;

    let mut errors: Vec<ValidationError> = ReferenceChecker::new(&system)
        .check_system()
        .into_iter()
        .map(ValidationError::from)
        .collect();
    errors.extend(
        TypeChecker::new(&system)
            .with_strict_categories(config.strict_literal_categories)
            .check_system()
            .into_iter()
            .map(ValidationError::from),
    );
    if !errors.is_empty() {
        return Err(ValidationErrors { kind, errors });
    }

    log::debug!(
        "token system `{}` is valid ({} tokens)",
        system.system_id,
        system.tokens.len()
    );
    Ok(ValidatedTokenSystem::new(system))
}

/// Validates a theme override file, and its links into `system` when given.
///
/// # Errors
/// Returns every violation found.
pub fn validate_theme_override_file(
    document: &Value,
    system: Option<&ValidatedTokenSystem>,
) -> Result<ValidatedThemeOverrideFile, ValidationErrors> {
    validate_theme_override_file_with_config(document, system, &EngineConfig::default())
}

/// # Errors
/// See [`validate_theme_override_file`].
pub fn validate_theme_override_file_with_config(
    document: &Value,
    system: Option<&ValidatedTokenSystem>,
    config: &EngineConfig,
) -> Result<ValidatedThemeOverrideFile, ValidationErrors> {
    let kind = DocumentKind::ThemeOverrideFile;
    let file = SchemaValidator::new(config)
        .validate_theme_override_file(document)
        .map_err(|errors| schema_failure(kind, errors))?;

    if let Some(system) = system {
        let mut errors: Vec<ValidationError> = ReferenceChecker::new(system)
            .check_theme_override_file(&file)
            .into_iter()
            .map(ValidationError::from)
            .collect();
        errors.extend(
            TypeChecker::new(system)
                .with_strict_categories(config.strict_literal_categories)
                .check_overrides(&file.token_overrides)
                .into_iter()
                .map(ValidationError::from),
        );
        if !errors.is_empty() {
            return Err(ValidationErrors { kind, errors });
        }
        if system
            .theme(&file.theme_id)
            .is_some_and(|theme| theme.status == ThemeStatus::Deprecated)
        {
            log::warn!("theme `{}` is deprecated", file.theme_id);
        }
    }
    Ok(ValidatedThemeOverrideFile(file))
}

/// Validates a platform extension, and its links into `system` when given.
#[must_use]
pub fn validate_platform_extension(document: &Value, system: Option<&ValidatedTokenSystem>) -> ValidationReport {
    validate_platform_extension_with_config(document, system, &EngineConfig::default())
}

#[must_use]
pub fn validate_platform_extension_with_config(
    document: &Value,
    system: Option<&ValidatedTokenSystem>,
    config: &EngineConfig,
) -> ValidationReport {
    let extension = match SchemaValidator::new(config).validate_platform_extension(document) {
        Ok(extension) => extension,
        Err(errors) => {
            return ValidationReport {
                is_valid: false,
                errors: errors.into_iter().map(ValidationError::from).collect(),
                extension: None,
            }
        }
    };

    let mut errors = Vec::new();
    if let Some(system) = system {
        errors.extend(
            ReferenceChecker::new(system)
                .check_platform_extension(&extension)
                .into_iter()
                .map(ValidationError::from),
        );
        errors.extend(
            TypeChecker::new(system)
                .with_strict_categories(config.strict_literal_categories)
                .check_overrides(&extension.token_overrides)
                .into_iter()
                .map(ValidationError::from),
        );
    }
    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        extension: Some(extension),
    }
}

/// Checks that no two override documents share a figmaFileKey.
#[must_use]
pub fn validate_figma_file_key_uniqueness_across_all(
    platform_extensions: &[PlatformExtension],
    theme_override_files: &[ThemeOverrideFile],
) -> UniquenessReport {
    uniqueness::check_uniqueness(platform_extensions, theme_override_files)
}

/// Resolves one token with the given override documents in play.
///
/// # Errors
/// Returns the first `ResolutionError` met.
pub fn resolve_value(
    system: &ValidatedTokenSystem,
    platform_extensions: &[PlatformExtension],
    theme_override_files: &[ThemeOverrideFile],
    token_id: &str,
    context: &ResolutionContext,
) -> Result<ResolvedValue, ResolutionError> {
    let resolver = platform_extensions
        .iter()
        .fold(Resolver::new(system), Resolver::with_platform_extension);
    let resolver = theme_override_files
        .iter()
        .fold(resolver, Resolver::with_theme_override_file);
    resolver.resolve_value(token_id, context)
}

/// Property types a token of the given value type may be bound to. The
/// universal `ALL` entry is always last.
#[must_use]
pub fn compatible_property_types(system: &ValidatedTokenSystem, resolved_value_type_id: &str) -> Vec<PropertyType> {
    compat::compatible_property_types(system, resolved_value_type_id)
}

fn schema_failure(kind: DocumentKind, errors: Vec<crate::error::SchemaError>) -> ValidationErrors {
    ValidationErrors {
        kind,
        errors: errors.into_iter().map(ValidationError::from).collect(),
    }
}
