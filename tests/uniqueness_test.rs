use design_tokens_core::error::KeyOccurrence;
use design_tokens_core::model::{DocumentKind, PlatformExtension, ThemeOverrideFile};
use design_tokens_core::{load_document, validate_figma_file_key_uniqueness_across_all};
use std::path::PathBuf;

fn fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    serde_json::from_value(load_document(path).unwrap()).unwrap()
}

#[test]
fn test_fixture_keys_are_unique() {
    let ios: PlatformExtension = fixture("platform_ios.json");
    let brand: ThemeOverrideFile = fixture("theme_brand.json");
    let report = validate_figma_file_key_uniqueness_across_all(&[ios], &[brand]);
    assert!(report.is_valid);
    assert!(report.errors.is_empty());
}

#[test]
fn test_shared_key_yields_one_error_naming_both() {
    let mut ios: PlatformExtension = fixture("platform_ios.json");
    let mut brand: ThemeOverrideFile = fixture("theme_brand.json");
    ios.figma_file_key = Some("dup-key".into());
    brand.figma_file_key = Some("dup-key".into());

    let report = validate_figma_file_key_uniqueness_across_all(&[ios.clone()], &[brand.clone()]);
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].key, "dup-key");
    assert_eq!(
        report.errors[0].occurrences,
        vec![
            KeyOccurrence {
                kind: DocumentKind::PlatformExtension,
                id: "platform-ios".into()
            },
            KeyOccurrence {
                kind: DocumentKind::ThemeOverrideFile,
                id: "theme-brand".into()
            },
        ]
    );

    brand.figma_file_key = Some("brand-key-002".into());
    let report = validate_figma_file_key_uniqueness_across_all(&[ios], &[brand]);
    assert!(report.is_valid);
}

#[test]
fn test_duplicate_between_two_themes() {
    let brand: ThemeOverrideFile = fixture("theme_brand.json");
    let mut copy = brand.clone();
    copy.theme_id = "theme-legacy".into();

    let report = validate_figma_file_key_uniqueness_across_all(&[], &[brand, copy]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].to_string(),
        "figmaFileKey `brand-key-001` is used by theme override file `theme-brand`, theme override file `theme-legacy`"
    );
}
