//! Mode-combination matching.
//!
//! An entry matches when every mode it names is active. An entry with no
//! modes always matches, at the lowest specificity. The matching entry with
//! the most modes wins; a tie at the top is ambiguous.

use crate::error::ResolutionError;
use crate::model::{ActiveModes, ModeValueEntry, Token};
use std::collections::HashSet;

/// Whether `entry` applies under `active`.
#[must_use]
pub fn matches(entry: &ModeValueEntry, active: &ActiveModes) -> bool {
    entry
        .mode_ids
        .iter()
        .all(|mode_id| active.values().any(|active_id| active_id == mode_id))
}

/// Number of distinct modes an entry names.
#[must_use]
pub fn specificity(entry: &ModeValueEntry) -> usize {
    entry.mode_ids.iter().collect::<HashSet<_>>().len()
}

/// The most specific entry of `entries` matching `active`, or `None` when
/// nothing matches.
///
/// # Errors
/// Returns `AmbiguousMatch` when several matching entries share the highest
/// specificity.
pub fn try_select_entry<'e>(
    token_id: &str,
    entries: &'e [ModeValueEntry],
    active: &ActiveModes,
) -> Result<Option<&'e ModeValueEntry>, ResolutionError> {
    let mut best: Vec<&'e ModeValueEntry> = Vec::new();
    let mut best_specificity = 0;
    for entry in entries.iter().filter(|e| matches(e, active)) {
        let current = specificity(entry);
        if best.is_empty() || current > best_specificity {
            best.clear();
            best.push(entry);
            best_specificity = current;
        } else if current == best_specificity {
            best.push(entry);
        }
    }

    match best.as_slice() {
        [] => {
            log::trace!("no entry of `{token_id}` matches {active:?}");
            Ok(None)
        }
        [entry] => {
            log::trace!("`{token_id}` matched modes {:?}", entry.mode_ids);
            Ok(Some(*entry))
        }
        tied => Err(ResolutionError::AmbiguousMatch {
            token_id: token_id.to_string(),
            candidates: tied
                .iter()
                .map(|e| format!("[{}]", e.mode_ids.join(", ")))
                .collect(),
        }),
    }
}

/// The most specific entry of `entries` matching `active`.
///
/// # Errors
/// Returns `NotFound` when nothing matches and `AmbiguousMatch` on a tie.
pub fn select_entry<'e>(
    token_id: &str,
    entries: &'e [ModeValueEntry],
    active: &ActiveModes,
) -> Result<&'e ModeValueEntry, ResolutionError> {
    try_select_entry(token_id, entries, active)?.ok_or_else(|| ResolutionError::NotFound {
        token_id: token_id.to_string(),
        active_modes: describe_modes(active),
    })
}

/// [`select_entry`] over a token's own values.
///
/// # Errors
/// See [`select_entry`].
pub fn select_token_entry<'t>(token: &'t Token, active: &ActiveModes) -> Result<&'t ModeValueEntry, ResolutionError> {
    select_entry(&token.id, &token.values_by_mode, active)
}

pub(crate) fn describe_modes(active: &ActiveModes) -> Vec<String> {
    active
        .iter()
        .map(|(dimension, mode)| format!("{dimension}={mode}"))
        .collect()
}
