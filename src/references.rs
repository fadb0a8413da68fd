//! Reference integrity.
//!
//! Verifies that every id used as a foreign key resolves to an entity of the
//! core document, that ids are unique where they must be, and that value
//! entries name modes consistently. Every broken reference is reported; no
//! check stops the others.

use crate::catalog;
use crate::error::{ReferenceError, ReferenceKind};
use crate::model::{DocumentKind, ModeValueEntry, PlatformExtension, ThemeOverrideFile, TokenSystem};
use std::collections::{HashMap, HashSet};

pub struct ReferenceChecker<'a> {
    system: &'a TokenSystem,
    tokens: HashSet<&'a str>,
    value_types: HashSet<&'a str>,
    /// Mode id to owning dimension id.
    modes: HashMap<&'a str, &'a str>,
    platforms: HashSet<&'a str>,
    collections: HashSet<&'a str>,
    themes: HashSet<&'a str>,
    taxonomies: HashMap<&'a str, HashSet<&'a str>>,
    property_types: HashSet<&'a str>,
}

impl<'a> ReferenceChecker<'a> {
    #[must_use]
    pub fn new(system: &'a TokenSystem) -> Self {
        let mut property_types: HashSet<&'a str> = system.property_types.iter().map(|p| p.id.as_str()).collect();
        property_types.extend(catalog::standard_property_types().iter().map(|p| p.id.as_str()));
        property_types.insert(catalog::ALL_PROPERTY_TYPE_ID);

        ReferenceChecker {
            system,
            tokens: system.tokens.iter().map(|t| t.id.as_str()).collect(),
            value_types: system.resolved_value_types.iter().map(|t| t.id.as_str()).collect(),
            modes: system
                .dimensions
                .iter()
                .flat_map(|d| d.modes.iter().map(move |m| (m.id.as_str(), d.id.as_str())))
                .collect(),
            platforms: system.platforms.iter().map(|p| p.id.as_str()).collect(),
            collections: system.token_collections.iter().map(|c| c.id.as_str()).collect(),
            themes: system.themes.iter().map(|t| t.id.as_str()).collect(),
            taxonomies: system
                .taxonomies
                .iter()
                .map(|t| (t.id.as_str(), t.terms.iter().map(|term| term.id.as_str()).collect()))
                .collect(),
            property_types,
        }
    }

    /// Checks the core document on its own.
    #[must_use]
    pub fn check_system(&self) -> Vec<ReferenceError> {
        let mut errors = Vec::new();
        let system = self.system;

        duplicates(ReferenceKind::Token, system.tokens.iter().map(|t| t.id.as_str()), &mut errors);
        duplicates(ReferenceKind::Dimension, system.dimensions.iter().map(|d| d.id.as_str()), &mut errors);
        duplicates(
            ReferenceKind::Mode,
            system.dimensions.iter().flat_map(|d| d.modes.iter().map(|m| m.id.as_str())),
            &mut errors,
        );
        duplicates(
            ReferenceKind::ResolvedValueType,
            system.resolved_value_types.iter().map(|t| t.id.as_str()),
            &mut errors,
        );
        duplicates(
            ReferenceKind::Collection,
            system.token_collections.iter().map(|c| c.id.as_str()),
            &mut errors,
        );
        duplicates(ReferenceKind::Platform, system.platforms.iter().map(|p| p.id.as_str()), &mut errors);
        duplicates(ReferenceKind::Taxonomy, system.taxonomies.iter().map(|t| t.id.as_str()), &mut errors);
        for taxonomy in &system.taxonomies {
            duplicates(
                ReferenceKind::TaxonomyTerm,
                taxonomy.terms.iter().map(|t| t.id.as_str()),
                &mut errors,
            );
        }
        duplicates(ReferenceKind::Theme, system.themes.iter().map(|t| t.id.as_str()), &mut errors);
        duplicates(
            ReferenceKind::PropertyType,
            system.property_types.iter().map(|p| p.id.as_str()),
            &mut errors,
        );

        let defaults: Vec<String> = system
            .themes
            .iter()
            .filter(|t| t.is_default)
            .map(|t| t.id.clone())
            .collect();
        if defaults.len() > 1 {
            errors.push(ReferenceError::MultipleDefaultThemes { theme_ids: defaults });
        }

        for dimension in &system.dimensions {
            if let Some(default_mode) = &dimension.default_mode {
                if !dimension.has_mode(default_mode) {
                    errors.push(missing(ReferenceKind::Mode, default_mode, &dimension.id));
                }
            }
        }
        for dimension_id in &system.dimension_order {
            if system.dimension(dimension_id).is_none() {
                errors.push(missing(ReferenceKind::Dimension, dimension_id, &system.system_id));
            }
        }

        for collection in &system.token_collections {
            for type_id in &collection.resolved_value_type_ids {
                if !self.value_types.contains(type_id.as_str()) {
                    errors.push(missing(ReferenceKind::ResolvedValueType, type_id, &collection.id));
                }
            }
        }

        for property_type in &system.property_types {
            for type_id in &property_type.compatible_value_types {
                if !self.value_types.contains(type_id.as_str()) && catalog::standard_value_type(type_id).is_none() {
                    errors.push(missing(ReferenceKind::ResolvedValueType, type_id, &property_type.id));
                }
            }
        }

        for token in &system.tokens {
            if !self.value_types.contains(token.resolved_value_type_id.as_str()) {
                errors.push(missing(
                    ReferenceKind::ResolvedValueType,
                    &token.resolved_value_type_id,
                    &token.id,
                ));
            }
            if let Some(collection_id) = &token.token_collection_id {
                if !self.collections.contains(collection_id.as_str()) {
                    errors.push(missing(ReferenceKind::Collection, collection_id, &token.id));
                }
            }
            for taxonomy_ref in &token.taxonomies {
                match self.taxonomies.get(taxonomy_ref.taxonomy_id.as_str()) {
                    Some(terms) if !terms.contains(taxonomy_ref.term_id.as_str()) => {
                        errors.push(missing(ReferenceKind::TaxonomyTerm, &taxonomy_ref.term_id, &token.id));
                    }
                    Some(_) => {}
                    None => errors.push(missing(ReferenceKind::Taxonomy, &taxonomy_ref.taxonomy_id, &token.id)),
                }
            }
            for property_type_id in &token.property_types {
                if !self.property_types.contains(property_type_id.as_str()) {
                    errors.push(missing(ReferenceKind::PropertyType, property_type_id, &token.id));
                }
            }
            for platform_id in token.code_syntax.keys() {
                if !self.platforms.contains(platform_id.as_str()) {
                    errors.push(missing(ReferenceKind::Platform, platform_id, &token.id));
                }
            }
            self.check_entries(&token.id, &token.values_by_mode, &mut errors);
        }

        log::debug!(
            "reference check of system `{}` found {} error(s)",
            system.system_id,
            errors.len()
        );
        errors
    }

    /// Checks a theme override file against the core document.
    #[must_use]
    pub fn check_theme_override_file(&self, file: &ThemeOverrideFile) -> Vec<ReferenceError> {
        let mut errors = Vec::new();
        self.check_system_id(DocumentKind::ThemeOverrideFile, &file.system_id, &mut errors);
        if !self.themes.contains(file.theme_id.as_str()) {
            errors.push(missing(ReferenceKind::Theme, &file.theme_id, &file.theme_id));
        }
        duplicates(
            ReferenceKind::Token,
            file.token_overrides.iter().map(|o| o.token_id.as_str()),
            &mut errors,
        );
        for token_override in &file.token_overrides {
            match self.system.token(&token_override.token_id) {
                None => errors.push(missing(ReferenceKind::Token, &token_override.token_id, &file.theme_id)),
                Some(token) if !token.themeable => errors.push(ReferenceError::NotThemeable {
                    token_id: token.id.clone(),
                    theme_id: file.theme_id.clone(),
                }),
                Some(_) => {}
            }
            self.check_entries(&token_override.token_id, &token_override.values_by_mode, &mut errors);
        }
        errors
    }

    /// Checks a platform extension against the core document.
    #[must_use]
    pub fn check_platform_extension(&self, extension: &PlatformExtension) -> Vec<ReferenceError> {
        let mut errors = Vec::new();
        self.check_system_id(DocumentKind::PlatformExtension, &extension.system_id, &mut errors);
        if !self.platforms.contains(extension.platform_id.as_str()) {
            errors.push(missing(ReferenceKind::Platform, &extension.platform_id, &extension.platform_id));
        }
        duplicates(
            ReferenceKind::Token,
            extension.token_overrides.iter().map(|o| o.token_id.as_str()),
            &mut errors,
        );
        for token_override in &extension.token_overrides {
            if !self.tokens.contains(token_override.token_id.as_str()) {
                errors.push(missing(ReferenceKind::Token, &token_override.token_id, &extension.platform_id));
            }
            self.check_entries(&token_override.token_id, &token_override.values_by_mode, &mut errors);
        }
        errors
    }

    fn check_system_id(&self, document: DocumentKind, found: &str, errors: &mut Vec<ReferenceError>) {
        if found != self.system.system_id {
            errors.push(ReferenceError::SystemMismatch {
                document,
                expected: self.system.system_id.clone(),
                found: found.to_string(),
            });
        }
    }

    fn check_entries(&self, token_id: &str, entries: &[ModeValueEntry], errors: &mut Vec<ReferenceError>) {
        let mut seen_sets: Vec<Vec<&str>> = Vec::new();
        for entry in entries {
            let mut per_dimension: HashMap<&str, Vec<String>> = HashMap::new();
            for mode_id in &entry.mode_ids {
                match self.modes.get(mode_id.as_str()) {
                    Some(dimension_id) => per_dimension.entry(*dimension_id).or_default().push(mode_id.clone()),
                    None => errors.push(missing(ReferenceKind::Mode, mode_id, token_id)),
                }
            }
            let mut conflicts: Vec<(&str, Vec<String>)> = per_dimension
                .into_iter()
                .filter(|(_, modes)| {
                    let distinct: HashSet<&String> = modes.iter().collect();
                    distinct.len() > 1
                })
                .collect();
            conflicts.sort_by(|a, b| a.0.cmp(b.0));
            for (dimension_id, mode_ids) in conflicts {
                errors.push(ReferenceError::ModeConflict {
                    token_id: token_id.to_string(),
                    dimension_id: dimension_id.to_string(),
                    mode_ids,
                });
            }

            let set = entry.mode_set();
            if seen_sets.contains(&set) {
                errors.push(ReferenceError::DuplicateModeSet {
                    token_id: token_id.to_string(),
                    mode_ids: set.iter().map(ToString::to_string).collect(),
                });
            } else {
                seen_sets.push(set);
            }

            if let Some(target) = entry.value.alias_target() {
                if !self.tokens.contains(target) {
                    errors.push(missing(ReferenceKind::Token, target, token_id));
                }
            }
            for platform_override in &entry.platform_overrides {
                if !self.platforms.contains(platform_override.platform_id.as_str()) {
                    errors.push(missing(ReferenceKind::Platform, &platform_override.platform_id, token_id));
                }
            }
        }
    }
}

fn missing(kind: ReferenceKind, missing_id: &str, referencing_entity_id: &str) -> ReferenceError {
    ReferenceError::Missing {
        kind,
        missing_id: missing_id.to_string(),
        referencing_entity_id: referencing_entity_id.to_string(),
    }
}

/// One `Duplicate` error per id that occurs more than once.
fn duplicates<'i>(kind: ReferenceKind, ids: impl Iterator<Item = &'i str>, errors: &mut Vec<ReferenceError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            errors.push(ReferenceError::Duplicate {
                kind,
                id: id.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn system() -> TokenSystem {
        serde_json::from_value(json!({
            "systemId": "sys",
            "systemName": "Sys",
            "dimensions": [
                { "id": "colorScheme", "displayName": "Color scheme", "modes": [
                    { "id": "light", "displayName": "Light" },
                    { "id": "dark", "displayName": "Dark" }
                ]},
                { "id": "contrast", "displayName": "Contrast", "modes": [
                    { "id": "regular", "displayName": "Regular" },
                    { "id": "high", "displayName": "High" }
                ]}
            ],
            "platforms": [{ "id": "ios", "displayName": "iOS" }],
            "themes": [{ "id": "brand", "displayName": "Brand", "status": "active", "isDefault": true }],
            "resolvedValueTypes": [{ "id": "color", "displayName": "Color", "type": "COLOR" }],
            "tokens": [
                { "id": "base", "displayName": "Base", "resolvedValueTypeId": "color",
                  "valuesByMode": [{ "modeIds": [], "value": "#fff" }] },
                { "id": "fixed", "displayName": "Fixed", "resolvedValueTypeId": "color", "themeable": false,
                  "valuesByMode": [{ "modeIds": [], "value": "#000" }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_clean_system_has_no_errors() {
        let system = system();
        assert!(ReferenceChecker::new(&system).check_system().is_empty());
    }

    #[test]
    fn test_reports_every_broken_reference() {
        let mut system = system();
        system.tokens[0].resolved_value_type_id = "colour".into();
        system.tokens[0].values_by_mode = vec![
            ModeValueEntry::new(["light", "sepia"], crate::model::TokenValue::alias("nowhere")),
        ];
        let errors = ReferenceChecker::new(&system).check_system();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.contains(&missing(ReferenceKind::ResolvedValueType, "colour", "base")));
        assert!(errors.contains(&missing(ReferenceKind::Mode, "sepia", "base")));
        assert!(errors.contains(&missing(ReferenceKind::Token, "nowhere", "base")));
    }

    #[test]
    fn test_mode_conflict_and_duplicate_sets() {
        let mut system = system();
        system.tokens[0].values_by_mode = vec![
            ModeValueEntry::new(["light", "dark"], json!("#111").into()),
            ModeValueEntry::new(["regular", "light"], json!("#222").into()),
            ModeValueEntry::new(["light", "regular"], json!("#333").into()),
        ];
        let errors = ReferenceChecker::new(&system).check_system();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(matches!(&errors[0], ReferenceError::ModeConflict { dimension_id, .. } if dimension_id == "colorScheme"));
        assert!(matches!(&errors[1], ReferenceError::DuplicateModeSet { mode_ids, .. } if mode_ids == &["light", "regular"]));
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let mut system = system();
        let copy = system.tokens[0].clone();
        system.tokens.push(copy.clone());
        system.tokens.push(copy);
        let errors = ReferenceChecker::new(&system).check_system();
        assert_eq!(
            errors,
            vec![ReferenceError::Duplicate {
                kind: ReferenceKind::Token,
                id: "base".into()
            }]
        );
    }

    #[test]
    fn test_theme_file_references() {
        let system = system();
        let file: ThemeOverrideFile = serde_json::from_value(json!({
            "systemId": "other",
            "themeId": "brand",
            "figmaFileKey": "k1",
            "tokenOverrides": [
                { "tokenId": "fixed", "valuesByMode": [{ "modeIds": [], "value": "#123" }] },
                { "tokenId": "ghost", "valuesByMode": [{ "modeIds": [], "value": "#123" }] }
            ]
        }))
        .unwrap();
        let errors = ReferenceChecker::new(&system).check_theme_override_file(&file);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(matches!(errors[0], ReferenceError::SystemMismatch { .. }));
        assert!(matches!(&errors[1], ReferenceError::NotThemeable { token_id, .. } if token_id == "fixed"));
        assert!(errors.contains(&missing(ReferenceKind::Token, "ghost", "brand")));
    }

    #[test]
    fn test_platform_extension_references() {
        let system = system();
        let extension: PlatformExtension = serde_json::from_value(json!({
            "systemId": "sys",
            "platformId": "android",
            "tokenOverrides": [
                { "tokenId": "base", "valuesByMode": [{ "modeIds": ["dim"], "value": "#123" }] }
            ]
        }))
        .unwrap();
        let errors = ReferenceChecker::new(&system).check_platform_extension(&extension);
        assert_eq!(
            errors,
            vec![
                missing(ReferenceKind::Platform, "android", "android"),
                missing(ReferenceKind::Mode, "dim", "base"),
            ]
        );
    }
}
