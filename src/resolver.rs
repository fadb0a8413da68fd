//! Value resolution.
//!
//! A [`Resolver`] holds a validated token system together with whatever
//! platform extensions and theme override files are loaded, and answers
//! "what is this token's value here" queries. Each alias hop is layered on
//! its own: the core entry first, then the platform, then the theme. The
//! first hop whose layered value is a literal ends the walk, so an override
//! placed on an aliasing token beats anything on the tokens it points at.

use crate::alias::{self, Hop};
use crate::config::EngineConfig;
use crate::error::ResolutionError;
use crate::model::{
    ActiveModes, ModeValueEntry, PlatformExtension, ThemeOverrideFile, ThemeStatus, TokenSystem,
    TokenValue, ValidatedTokenSystem,
};
use crate::modes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Where a resolution happens: the active mode per dimension, and optionally
/// a platform and a theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionContext {
    pub active_modes_by_dimension: ActiveModes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
}

impl ResolutionContext {
    #[must_use]
    pub fn new(active_modes_by_dimension: ActiveModes) -> Self {
        ResolutionContext {
            active_modes_by_dimension,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, dimension_id: impl Into<String>, mode_id: impl Into<String>) -> Self {
        self.active_modes_by_dimension.insert(dimension_id.into(), mode_id.into());
        self
    }

    #[must_use]
    pub fn on_platform(mut self, platform_id: impl Into<String>) -> Self {
        self.platform_id = Some(platform_id.into());
        self
    }

    #[must_use]
    pub fn in_theme(mut self, theme_id: impl Into<String>) -> Self {
        self.theme_id = Some(theme_id.into());
        self
    }
}

/// Which layer supplied a hop's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Core,
    Platform,
    Theme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceHop {
    pub token_id: String,
    pub layer: Layer,
    /// Modes of the entry that supplied the value.
    pub mode_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: Value,
    /// One hop per token visited, the requested token first.
    pub provenance: Vec<ProvenanceHop>,
}

impl ResolvedValue {
    /// Token ids visited, in order.
    #[must_use]
    pub fn alias_chain(&self) -> Vec<&str> {
        self.provenance.iter().map(|h| h.token_id.as_str()).collect()
    }

    /// The hop that supplied the final literal.
    #[must_use]
    pub fn source(&self) -> Option<&ProvenanceHop> {
        self.provenance.last()
    }
}

pub struct Resolver<'a> {
    system: &'a ValidatedTokenSystem,
    platform_extensions: HashMap<&'a str, &'a PlatformExtension>,
    theme_files: HashMap<&'a str, &'a ThemeOverrideFile>,
    max_alias_depth: usize,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(system: &'a ValidatedTokenSystem) -> Self {
        Resolver {
            system,
            platform_extensions: HashMap::new(),
            theme_files: HashMap::new(),
            max_alias_depth: EngineConfig::default().max_alias_depth,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_alias_depth = config.max_alias_depth;
        self
    }

    /// Registers a platform extension. A later extension for the same
    /// platform replaces an earlier one.
    #[must_use]
    pub fn with_platform_extension(mut self, extension: &'a PlatformExtension) -> Self {
        self.platform_extensions
            .insert(extension.platform_id.as_str(), extension);
        self
    }

    #[must_use]
    pub fn with_theme_override_file(mut self, file: &'a ThemeOverrideFile) -> Self {
        self.theme_files.insert(file.theme_id.as_str(), file);
        self
    }

    #[must_use]
    pub fn system(&self) -> &ValidatedTokenSystem {
        self.system
    }

    /// Resolves a token to one literal under `context`.
    ///
    /// # Errors
    /// Fails on the first blocking condition: an unknown token, platform or
    /// theme, no applicable entry, an ambiguous match, or an alias cycle or
    /// overlong chain.
    pub fn resolve_value(&self, token_id: &str, context: &ResolutionContext) -> Result<ResolvedValue, ResolutionError> {
        self.check_context(context)?;
        log::debug!("resolving `{token_id}` with {context:?}");

        let resolution = alias::resolve_alias(token_id, self.max_alias_depth, |id| self.layered_hop(id, context))?;
        Ok(ResolvedValue {
            value: resolution.value,
            provenance: resolution.hops,
        })
    }

    /// Resolves a token with every dimension at its default mode and no
    /// platform or theme.
    ///
    /// # Errors
    /// See [`Resolver::resolve_value`].
    pub fn resolve_default(&self, token_id: &str) -> Result<ResolvedValue, ResolutionError> {
        self.resolve_value(token_id, &ResolutionContext::new(self.system.default_modes()))
    }

    /// A copy of the core system in which every alias is replaced by the
    /// literal it resolves to. Each entry is resolved under its own modes,
    /// with the remaining dimensions at their defaults. Overrides are not
    /// applied.
    ///
    /// # Errors
    /// Returns the first `ResolutionError` met while resolving an alias.
    pub fn flatten(&self) -> Result<TokenSystem, ResolutionError> {
        let mut flat: TokenSystem = (**self.system).clone();
        for token in &mut flat.tokens {
            for entry in &mut token.values_by_mode {
                let Some(target) = entry.value.alias_target() else {
                    continue;
                };
                let context = ResolutionContext::new(self.entry_modes(entry));
                let resolved = self.resolve_value(target, &context)?;
                entry.value = TokenValue::Literal(resolved.value);
            }
        }
        log::debug!("flattened {} token(s)", flat.tokens.len());
        Ok(flat)
    }

    fn entry_modes(&self, entry: &ModeValueEntry) -> ActiveModes {
        let named: ActiveModes = entry
            .mode_ids
            .iter()
            .filter_map(|mode_id| {
                self.system
                    .dimension_of_mode(mode_id)
                    .map(|d| (d.id.clone(), mode_id.clone()))
            })
            .collect();
        self.system.complete_modes(&named)
    }

    fn check_context(&self, context: &ResolutionContext) -> Result<(), ResolutionError> {
        if let Some(platform_id) = &context.platform_id {
            if self.system.platform(platform_id).is_none() && !self.platform_extensions.contains_key(platform_id.as_str()) {
                return Err(ResolutionError::UnknownPlatform {
                    platform_id: platform_id.clone(),
                });
            }
        }
        if let Some(theme_id) = &context.theme_id {
            match self.system.theme(theme_id) {
                Some(theme) if theme.status == ThemeStatus::Deprecated => {
                    log::warn!("resolving with deprecated theme `{theme_id}`");
                }
                Some(_) => {}
                None if self.theme_files.contains_key(theme_id.as_str()) => {}
                None => {
                    return Err(ResolutionError::UnknownTheme {
                        theme_id: theme_id.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    /// The value one token contributes under `context`, with all layers
    /// applied.
    fn layered_hop(&self, token_id: &str, context: &ResolutionContext) -> Result<Hop<ProvenanceHop>, ResolutionError> {
        let token = self
            .system
            .token(token_id)
            .ok_or_else(|| ResolutionError::UnknownToken {
                token_id: token_id.to_string(),
            })?;
        let active = &context.active_modes_by_dimension;

        let base = modes::try_select_entry(token_id, &token.values_by_mode, active)?;
        let mut layered: Option<(TokenValue, Layer, &ModeValueEntry)> = base.map(|e| (e.value.clone(), Layer::Core, e));

        if let Some(platform_id) = context.platform_id.as_deref() {
            if let Some(base) = base {
                if let Some(value) = base.platform_override(platform_id) {
                    layered = Some((TokenValue::Literal(value.clone()), Layer::Platform, base));
                }
            }
            let extension_entry = self
                .platform_extensions
                .get(platform_id)
                .and_then(|ext| ext.token_override(token_id))
                .map(|o| modes::try_select_entry(token_id, &o.values_by_mode, active))
                .transpose()?
                .flatten();
            if let Some(entry) = extension_entry {
                layered = Some((entry.value.clone(), Layer::Platform, entry));
            }
        }

        // Non-themeable tokens ignore theme files.
        if let Some(theme_id) = context.theme_id.as_deref().filter(|_| token.themeable) {
            let theme_entry = self
                .theme_files
                .get(theme_id)
                .and_then(|file| file.token_override(token_id))
                .map(|o| modes::try_select_entry(token_id, &o.values_by_mode, active))
                .transpose()?
                .flatten();
            if let Some(entry) = theme_entry {
                layered = Some((entry.value.clone(), Layer::Theme, entry));
            }
        }

        let (value, layer, entry) = layered.ok_or_else(|| ResolutionError::NotFound {
            token_id: token_id.to_string(),
            active_modes: modes::describe_modes(active),
        })?;
        let record = ProvenanceHop {
            token_id: token_id.to_string(),
            layer,
            mode_ids: entry.mode_ids.clone(),
        };
        log::trace!("`{token_id}` supplied by {layer:?} layer");

        Ok(match value {
            TokenValue::Alias(alias) => Hop::Alias {
                target: alias.token_id,
                record,
            },
            TokenValue::Literal(value) => Hop::Literal { value, record },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AliasError;
    use crate::model::{
        Dimension, Mode, ResolvedValueType, StandardValueType, Token, TokenOverride,
    };
    use serde_json::json;

    fn color_type() -> ResolvedValueType {
        ResolvedValueType {
            id: "color".into(),
            display_name: "Color".into(),
            value_type: Some(StandardValueType::Color),
            description: None,
            validation: None,
        }
    }

    fn dimension(id: &str, modes: &[&str]) -> Dimension {
        Dimension {
            id: id.into(),
            display_name: id.into(),
            description: None,
            modes: modes
                .iter()
                .map(|m| Mode {
                    id: (*m).into(),
                    display_name: (*m).into(),
                    description: None,
                })
                .collect(),
            default_mode: None,
        }
    }

    fn token(id: &str, entries: Vec<ModeValueEntry>) -> Token {
        Token {
            id: id.into(),
            display_name: id.into(),
            description: None,
            resolved_value_type_id: "color".into(),
            token_collection_id: None,
            values_by_mode: entries,
            code_syntax: Default::default(),
            taxonomies: Vec::new(),
            property_types: Vec::new(),
            private: false,
            themeable: true,
        }
    }

    fn literal(modes: &[&str], value: &str) -> ModeValueEntry {
        ModeValueEntry::new(modes.iter().copied(), TokenValue::Literal(json!(value)))
    }

    fn alias(modes: &[&str], target: &str) -> ModeValueEntry {
        ModeValueEntry::new(modes.iter().copied(), TokenValue::alias(target))
    }

    fn system(tokens: Vec<Token>) -> ValidatedTokenSystem {
        ValidatedTokenSystem::new(TokenSystem {
            system_id: "sys".into(),
            system_name: "System".into(),
            description: None,
            version: None,
            tokens,
            token_collections: Vec::new(),
            dimensions: vec![dimension("colorScheme", &["light", "dark"])],
            dimension_order: Vec::new(),
            platforms: Vec::new(),
            taxonomies: Vec::new(),
            resolved_value_types: vec![color_type()],
            themes: Vec::new(),
            property_types: Vec::new(),
        })
    }

    fn light() -> ResolutionContext {
        ResolutionContext::default().with_mode("colorScheme", "light")
    }

    fn theme_file(overrides: Vec<TokenOverride>) -> ThemeOverrideFile {
        ThemeOverrideFile {
            system_id: "sys".into(),
            theme_id: "brand".into(),
            figma_file_key: Some("brand-key".into()),
            token_overrides: overrides,
        }
    }

    #[test]
    fn test_alias_follows_to_target_value() {
        let sys = system(vec![
            token("accent", vec![alias(&["light"], "blue")]),
            token("blue", vec![literal(&["light"], "#274DEA"), literal(&["dark"], "#8FA6FF")]),
        ]);
        let resolved = Resolver::new(&sys).resolve_value("accent", &light()).unwrap();
        assert_eq!(resolved.value, json!("#274DEA"));
        assert_eq!(resolved.alias_chain(), vec!["accent", "blue"]);
        assert_eq!(resolved.source().map(|h| h.layer), Some(Layer::Core));
    }

    #[test]
    fn test_inline_platform_override() {
        let mut entry = literal(&[], "#000000");
        entry.platform_overrides.push(crate::model::PlatformOverride {
            platform_id: "ios".into(),
            value: json!("#111111"),
        });
        let sys = system(vec![token("ink", vec![entry])]);
        let ext = PlatformExtension {
            platform_id: "ios".into(),
            system_id: "sys".into(),
            figma_file_key: None,
            token_overrides: Vec::new(),
        };
        let resolver = Resolver::new(&sys).with_platform_extension(&ext);
        let resolved = resolver.resolve_value("ink", &light().on_platform("ios")).unwrap();
        assert_eq!(resolved.value, json!("#111111"));
        assert_eq!(resolved.provenance[0].layer, Layer::Platform);
    }

    #[test]
    fn test_theme_wins_over_platform_and_core() {
        let sys = system(vec![token("ink", vec![literal(&[], "#000000")])]);
        let ext = PlatformExtension {
            platform_id: "web".into(),
            system_id: "sys".into(),
            figma_file_key: None,
            token_overrides: vec![TokenOverride {
                token_id: "ink".into(),
                values_by_mode: vec![literal(&[], "#222222")],
            }],
        };
        let theme = theme_file(vec![TokenOverride {
            token_id: "ink".into(),
            values_by_mode: vec![literal(&["light"], "#333333")],
        }]);
        let resolver = Resolver::new(&sys)
            .with_platform_extension(&ext)
            .with_theme_override_file(&theme);

        let web = light().on_platform("web");
        assert_eq!(resolver.resolve_value("ink", &web).unwrap().value, json!("#222222"));

        let themed = web.clone().in_theme("brand");
        let resolved = resolver.resolve_value("ink", &themed).unwrap();
        assert_eq!(resolved.value, json!("#333333"));
        assert_eq!(resolved.provenance[0].layer, Layer::Theme);

        // The theme entry only covers light.
        let dark = ResolutionContext::default()
            .with_mode("colorScheme", "dark")
            .on_platform("web")
            .in_theme("brand");
        assert_eq!(resolver.resolve_value("ink", &dark).unwrap().value, json!("#222222"));
    }

    #[test]
    fn test_extension_beats_inline_platform_override() {
        let mut entry = literal(&[], "#000000");
        entry.platform_overrides.push(crate::model::PlatformOverride {
            platform_id: "ios".into(),
            value: json!("#111111"),
        });
        let sys = system(vec![token("ink", vec![entry])]);
        let ext = PlatformExtension {
            platform_id: "ios".into(),
            system_id: "sys".into(),
            figma_file_key: None,
            token_overrides: vec![TokenOverride {
                token_id: "ink".into(),
                values_by_mode: vec![literal(&["light"], "#222222")],
            }],
        };
        let resolver = Resolver::new(&sys).with_platform_extension(&ext);
        let resolved = resolver.resolve_value("ink", &light().on_platform("ios")).unwrap();
        assert_eq!(resolved.value, json!("#222222"));
        assert_eq!(resolved.provenance[0].layer, Layer::Platform);
        assert_eq!(resolved.provenance[0].mode_ids, vec!["light".to_string()]);
    }

    #[test]
    fn test_context_wire_names() {
        let context: ResolutionContext = serde_json::from_value(json!({
            "activeModesByDimension": { "colorScheme": "dark" },
            "platformId": "ios"
        }))
        .unwrap();
        assert_eq!(context, ResolutionContext::default().with_mode("colorScheme", "dark").on_platform("ios"));
        assert_eq!(
            serde_json::to_value(&context).unwrap(),
            json!({ "activeModesByDimension": { "colorScheme": "dark" }, "platformId": "ios" })
        );
    }

    #[test]
    fn test_unthemeable_token_ignores_theme_file() {
        let mut surface = token("surface", vec![literal(&[], "#FFFFFF")]);
        surface.themeable = false;
        let sys = system(vec![surface]);
        let theme = theme_file(vec![TokenOverride {
            token_id: "surface".into(),
            values_by_mode: vec![literal(&[], "#FF0000")],
        }]);
        let resolver = Resolver::new(&sys).with_theme_override_file(&theme);
        let resolved = resolver.resolve_value("surface", &light().in_theme("brand")).unwrap();
        assert_eq!(resolved.value, json!("#FFFFFF"));
        assert_eq!(resolved.provenance[0].layer, Layer::Core);
    }

    #[test]
    fn test_override_on_aliasing_token_beats_target_override() {
        let sys = system(vec![
            token("accent", vec![alias(&[], "blue")]),
            token("blue", vec![literal(&[], "#274DEA")]),
        ]);
        let both = theme_file(vec![
            TokenOverride {
                token_id: "accent".into(),
                values_by_mode: vec![literal(&[], "#FF0000")],
            },
            TokenOverride {
                token_id: "blue".into(),
                values_by_mode: vec![literal(&[], "#00FF00")],
            },
        ]);
        let resolver = Resolver::new(&sys).with_theme_override_file(&both);
        let resolved = resolver.resolve_value("accent", &light().in_theme("brand")).unwrap();
        assert_eq!(resolved.value, json!("#FF0000"));
        assert_eq!(resolved.alias_chain(), vec!["accent"]);

        let target_only = theme_file(vec![TokenOverride {
            token_id: "blue".into(),
            values_by_mode: vec![literal(&[], "#00FF00")],
        }]);
        let resolver = Resolver::new(&sys).with_theme_override_file(&target_only);
        let resolved = resolver.resolve_value("accent", &light().in_theme("brand")).unwrap();
        assert_eq!(resolved.value, json!("#00FF00"));
        assert_eq!(resolved.provenance[1].layer, Layer::Theme);
    }

    #[test]
    fn test_cycle_is_reported() {
        let sys = system(vec![
            token("a", vec![alias(&[], "b")]),
            token("b", vec![alias(&[], "a")]),
        ]);
        let err = Resolver::new(&sys).resolve_value("a", &light()).unwrap_err();
        assert!(matches!(err, ResolutionError::Alias(AliasError::Cycle { .. })));
    }

    #[test]
    fn test_configured_depth_limit() {
        let sys = system(vec![
            token("a", vec![alias(&[], "b")]),
            token("b", vec![alias(&[], "c")]),
            token("c", vec![literal(&[], "#FFFFFF")]),
        ]);
        let config = EngineConfig {
            max_alias_depth: 2,
            ..Default::default()
        };
        let err = Resolver::new(&sys)
            .with_config(&config)
            .resolve_value("a", &light())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Alias(AliasError::DepthExceeded { .. })));
    }

    #[test]
    fn test_unknown_context_ids() {
        let sys = system(vec![token("ink", vec![literal(&[], "#000000")])]);
        let resolver = Resolver::new(&sys);
        assert!(matches!(
            resolver.resolve_value("ink", &light().on_platform("tvos")),
            Err(ResolutionError::UnknownPlatform { .. })
        ));
        assert!(matches!(
            resolver.resolve_value("ink", &light().in_theme("nope")),
            Err(ResolutionError::UnknownTheme { .. })
        ));
        assert!(matches!(
            resolver.resolve_value("missing", &light()),
            Err(ResolutionError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_flatten_replaces_aliases() {
        let sys = system(vec![
            token("accent", vec![alias(&["light"], "blue"), alias(&["dark"], "blue")]),
            token("blue", vec![literal(&["light"], "#274DEA"), literal(&["dark"], "#8FA6FF")]),
        ]);
        let flat = Resolver::new(&sys).flatten().unwrap();
        let accent = flat.token("accent").unwrap();
        assert_eq!(accent.values_by_mode[0].value, TokenValue::Literal(json!("#274DEA")));
        assert_eq!(accent.values_by_mode[1].value, TokenValue::Literal(json!("#8FA6FF")));
        assert!(flat
            .tokens
            .iter()
            .flat_map(|t| &t.values_by_mode)
            .all(|e| e.value.alias_target().is_none()));
    }
}
