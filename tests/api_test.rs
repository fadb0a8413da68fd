use design_tokens_core::api::{to_json, to_yaml};
use design_tokens_core::error::SchemaError;
use design_tokens_core::model::{DocumentKind, TokenValue};
use design_tokens_core::{
    compatible_property_types, load_document, load_token_system, parse_document, validate_platform_extension,
    validate_theme_override_file, validate_token_system, EngineConfig, Resolver,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;

fn fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    load_document(path).unwrap()
}

#[test]
fn test_fixture_system_is_valid() {
    let system = validate_token_system(&fixture("token_system.json")).unwrap();
    assert_eq!(system.system_id, "system-acme");
    assert_eq!(system.tokens.len(), 4);
    assert!(system.token("token-9999").is_some());
}

#[test]
fn test_theme_file_validates_against_system() {
    let system = validate_token_system(&fixture("token_system.json")).unwrap();
    let theme = validate_theme_override_file(&fixture("theme_brand.json"), Some(&system)).unwrap();
    assert_eq!(theme.theme_id, "theme-brand");
    assert_eq!(theme.figma_file_key.as_deref(), Some("brand-key-001"));
}

#[test]
fn test_platform_extension_report() {
    let system = validate_token_system(&fixture("token_system.json")).unwrap();
    let report = validate_platform_extension(&fixture("platform_ios.json"), Some(&system));
    assert!(report.is_valid, "{:?}", report.errors);
    assert_eq!(
        report.extension.map(|e| e.platform_id),
        Some("platform-ios".to_string())
    );
}

#[test]
fn test_missing_figma_file_key_names_the_field() {
    let mut doc = fixture("theme_brand.json");
    doc.as_object_mut().unwrap().remove("figmaFileKey");

    let err = validate_theme_override_file(&doc, None).unwrap_err();
    assert_eq!(err.kind, DocumentKind::ThemeOverrideFile);
    assert_eq!(
        err.schema_errors(),
        vec![&SchemaError::MissingField {
            path: "$".into(),
            field: "figmaFileKey".into()
        }]
    );
}

#[test]
fn test_malformed_figma_file_key_is_a_format_error() {
    let mut doc = fixture("theme_brand.json");
    doc["figmaFileKey"] = json!("invalid@key#");

    let err = validate_theme_override_file(&doc, None).unwrap_err();
    let schema_errors = err.schema_errors();
    assert_eq!(schema_errors.len(), 1);
    assert!(matches!(
        schema_errors[0],
        SchemaError::InvalidFormat { path, value, .. } if path == "$.figmaFileKey" && value == "invalid@key#"
    ));
}

#[test]
fn test_platform_figma_file_key_required_by_config() {
    let mut doc = fixture("platform_ios.json");
    doc.as_object_mut().unwrap().remove("figmaFileKey");

    let report = validate_platform_extension(&doc, None);
    assert!(report.is_valid);

    let config = EngineConfig {
        require_platform_figma_file_key: true,
        ..Default::default()
    };
    let report = design_tokens_core::api::validate_platform_extension_with_config(&doc, None, &config);
    assert!(!report.is_valid);
    assert!(report.extension.is_none());
}

#[test]
fn test_compatible_property_types_for_dimension() {
    let system = validate_token_system(&fixture("token_system.json")).unwrap();
    let ids: Vec<String> = compatible_property_types(&system, "dimension")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["width-height", "border-width", "position", "ALL"]);
}

#[test]
fn test_flattened_system_validates() {
    let system = validate_token_system(&fixture("token_system.json")).unwrap();
    let flat = Resolver::new(&system).flatten().unwrap();
    assert!(flat
        .tokens
        .iter()
        .flat_map(|t| &t.values_by_mode)
        .all(|e| matches!(e.value, TokenValue::Literal(_))));

    let document = serde_json::to_value(&flat).unwrap();
    let revalidated = validate_token_system(&document).unwrap();
    let accent = revalidated.token("token-9999").unwrap();
    assert_eq!(accent.values_by_mode[0].value, TokenValue::Literal(json!("#274DEA")));
    assert_eq!(accent.values_by_mode[2].value, TokenValue::Literal(json!("#8FA6FF")));
}

#[test]
fn test_serialization_round_trip() {
    let original = fixture("token_system.json");
    let system = validate_token_system(&original).unwrap();

    let json_text = to_json(&system).unwrap();
    assert_eq!(parse_document(&json_text, "out.json").unwrap(), original);

    let yaml_text = to_yaml(&system).unwrap();
    assert_eq!(parse_document(&yaml_text, "out.yaml").unwrap(), original);
}

#[test]
fn test_load_token_system_from_disk() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    let yaml = serde_yaml::to_string(&fixture("token_system.json")).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let system = load_token_system(file.path()).unwrap();
    assert_eq!(system.system_name, "Acme Design System");
}

fn unruled_literals_system() -> Value {
    let literal_token = |id: &str, type_id: &str, value: Value| {
        json!({
            "id": id,
            "displayName": id,
            "resolvedValueTypeId": type_id,
            "valuesByMode": [{ "modeIds": [], "value": value }]
        })
    };
    json!({
        "systemId": "system-loose",
        "systemName": "Loose literals",
        "dimensions": [],
        "resolvedValueTypes": [
            { "id": "dimension", "displayName": "Dimension", "type": "DIMENSION" },
            { "id": "spacing", "displayName": "Spacing", "type": "SPACING" },
            { "id": "duration", "displayName": "Duration", "type": "DURATION" },
            { "id": "color", "displayName": "Color", "type": "COLOR" },
            { "id": "font-family", "displayName": "Font family", "type": "FONT_FAMILY" }
        ],
        "tokens": [
            literal_token("gutter", "dimension", json!("calc(100% - 8px)")),
            literal_token("inset", "spacing", json!("auto")),
            literal_token("radius", "dimension", json!({ "value": 16, "unit": "px" })),
            literal_token("motion", "duration", json!("var(--motion-fast)")),
            literal_token("white", "color", json!(16777215)),
            literal_token("body-font", "font-family", json!(["Inter", "sans-serif"]))
        ]
    })
}

#[test]
fn test_literals_without_validation_rules_are_accepted() {
    let system = validate_token_system(&unruled_literals_system()).unwrap();
    let gutter = system.token("gutter").unwrap();
    assert_eq!(
        gutter.values_by_mode[0].value,
        TokenValue::Literal(json!("calc(100% - 8px)"))
    );
}

#[test]
fn test_strict_literal_categories_reject_unruled_literals() {
    let config = EngineConfig {
        strict_literal_categories: true,
        ..Default::default()
    };
    let err = design_tokens_core::api::validate_token_system_with_config(&unruled_literals_system(), &config)
        .unwrap_err();
    let type_errors = err.type_errors();
    let rejected: Vec<&str> = type_errors.iter().map(|e| e.token_id()).collect();
    assert_eq!(rejected, vec!["gutter", "inset", "radius", "motion", "white", "body-font"]);
}
