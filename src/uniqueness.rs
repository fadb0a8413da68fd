//! figmaFileKey uniqueness across every override document of one system.

use crate::error::{DuplicateKeyError, KeyOccurrence};
use crate::model::{DocumentKind, PlatformExtension, ThemeOverrideFile};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// A document without a figmaFileKey while all its siblings of the same
/// kind have one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingKeyWarning {
    pub kind: DocumentKind,
    pub id: String,
}

impl Display for MissingKeyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} `{}` has no figmaFileKey although the other {} documents do",
            self.kind, self.id, self.kind
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniquenessReport {
    pub is_valid: bool,
    /// One error per duplicated key, ordered by key.
    pub errors: Vec<DuplicateKeyError>,
    pub warnings: Vec<MissingKeyWarning>,
}

#[must_use]
pub fn check_uniqueness(platform_extensions: &[PlatformExtension], theme_files: &[ThemeOverrideFile]) -> UniquenessReport {
    let platform_docs: Vec<(&str, Option<&str>)> = platform_extensions
        .iter()
        .map(|e| (e.platform_id.as_str(), e.figma_file_key.as_deref()))
        .collect();
    let theme_docs: Vec<(&str, Option<&str>)> = theme_files
        .iter()
        .map(|t| (t.theme_id.as_str(), t.figma_file_key.as_deref()))
        .collect();

    let mut by_key: BTreeMap<&str, Vec<KeyOccurrence>> = BTreeMap::new();
    for (kind, docs) in [
        (DocumentKind::PlatformExtension, &platform_docs),
        (DocumentKind::ThemeOverrideFile, &theme_docs),
    ] {
        for (id, key) in docs {
            if let Some(key) = key {
                by_key.entry(*key).or_default().push(KeyOccurrence {
                    kind,
                    id: (*id).to_string(),
                });
            }
        }
    }

    let errors: Vec<DuplicateKeyError> = by_key
        .into_iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .map(|(key, occurrences)| DuplicateKeyError {
            key: key.to_string(),
            occurrences,
        })
        .collect();

    let mut warnings = Vec::new();
    warnings.extend(lone_missing_key(DocumentKind::PlatformExtension, &platform_docs));
    warnings.extend(lone_missing_key(DocumentKind::ThemeOverrideFile, &theme_docs));
    for warning in &warnings {
        log::warn!("{warning}");
    }

    log::debug!(
        "figmaFileKey uniqueness: {} duplicated key(s), {} warning(s)",
        errors.len(),
        warnings.len()
    );
    UniquenessReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn lone_missing_key(kind: DocumentKind, docs: &[(&str, Option<&str>)]) -> Option<MissingKeyWarning> {
    let mut missing = docs.iter().filter(|(_, key)| key.is_none());
    let (id, _) = missing.next()?;
    if missing.next().is_some() || docs.len() < 2 {
        return None;
    }
    Some(MissingKeyWarning {
        kind,
        id: (*id).to_string(),
    })
}
