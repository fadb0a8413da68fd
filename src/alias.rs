//! Alias graph walking.
//!
//! Follows token-to-token aliases until a literal is reached. The ids seen
//! so far are threaded through every hop, so a cycle is reported as soon as
//! a token is revisited, and chains longer than the configured maximum stop
//! with `DepthExceeded`.

use crate::error::{AliasError, ResolutionError};
use serde_json::Value;

/// What one token contributes to the walk, plus a caller-defined record of
/// where that contribution came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Hop<R> {
    Literal { value: Value, record: R },
    Alias { target: String, record: R },
}

/// A terminal literal and the path that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasResolution<R> {
    pub value: Value,
    /// Token ids in traversal order, starting with the requested token.
    pub chain: Vec<String>,
    /// One record per entry of `chain`.
    pub hops: Vec<R>,
}

/// Resolves `token_id` to a literal, asking `step` what each visited token
/// holds.
///
/// # Errors
/// Returns `AliasError::Cycle` when a token is revisited,
/// `AliasError::DepthExceeded` when the chain grows past `max_depth` tokens,
/// and any error `step` returns.
pub fn resolve_alias<R, F>(token_id: &str, max_depth: usize, mut step: F) -> Result<AliasResolution<R>, ResolutionError>
where
    F: FnMut(&str) -> Result<Hop<R>, ResolutionError>,
{
    let mut chain = Vec::new();
    let mut hops = Vec::new();
    let value = walk(token_id, max_depth, &mut step, &mut chain, &mut hops)?;
    Ok(AliasResolution { value, chain, hops })
}

fn walk<R, F>(
    token_id: &str,
    max_depth: usize,
    step: &mut F,
    visited: &mut Vec<String>,
    hops: &mut Vec<R>,
) -> Result<Value, ResolutionError>
where
    F: FnMut(&str) -> Result<Hop<R>, ResolutionError>,
{
    if visited.iter().any(|id| id == token_id) {
        let mut chain = visited.clone();
        chain.push(token_id.to_string());
        log::debug!("alias cycle: {}", chain.join(" -> "));
        return Err(AliasError::Cycle { chain }.into());
    }
    if visited.len() >= max_depth {
        let mut chain = visited.clone();
        chain.push(token_id.to_string());
        return Err(AliasError::DepthExceeded { chain, max_depth }.into());
    }
    visited.push(token_id.to_string());

    match step(token_id)? {
        Hop::Literal { value, record } => {
            hops.push(record);
            Ok(value)
        }
        Hop::Alias { target, record } => {
            log::trace!("alias hop {token_id} -> {target}");
            hops.push(record);
            walk(&target, max_depth, step, visited, hops)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn graph(edges: &[(&str, Option<&str>)]) -> HashMap<String, Option<String>> {
        edges
            .iter()
            .map(|(from, to)| (from.to_string(), to.map(ToString::to_string)))
            .collect()
    }

    fn run(graph: &HashMap<String, Option<String>>, start: &str, max_depth: usize) -> Result<AliasResolution<()>, ResolutionError> {
        resolve_alias(start, max_depth, |id| match graph.get(id) {
            Some(Some(target)) => Ok(Hop::Alias {
                target: target.clone(),
                record: (),
            }),
            Some(None) => Ok(Hop::Literal {
                value: json!(format!("value-of-{id}")),
                record: (),
            }),
            None => Err(ResolutionError::UnknownToken {
                token_id: id.to_string(),
            }),
        })
    }

    #[test]
    fn test_chain_is_recorded_in_order() {
        let g = graph(&[("a", Some("b")), ("b", Some("c")), ("c", None)]);
        let resolved = run(&g, "a", 8).unwrap();
        assert_eq!(resolved.value, json!("value-of-c"));
        assert_eq!(resolved.chain, vec!["a", "b", "c"]);
        assert_eq!(resolved.hops.len(), 3);
    }

    #[test]
    fn test_two_token_cycle() {
        let g = graph(&[("a", Some("b")), ("b", Some("a"))]);
        let err = run(&g, "a", 8).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::Alias(AliasError::Cycle {
                chain: vec!["a".into(), "b".into(), "a".into()]
            })
        );
    }

    #[test]
    fn test_self_alias_is_a_cycle() {
        let g = graph(&[("a", Some("a"))]);
        assert!(matches!(
            run(&g, "a", 8),
            Err(ResolutionError::Alias(AliasError::Cycle { .. }))
        ));
    }

    #[test]
    fn test_depth_is_bounded() {
        let g = graph(&[("a", Some("b")), ("b", Some("c")), ("c", Some("d")), ("d", None)]);
        assert!(run(&g, "a", 4).is_ok());
        let err = run(&g, "a", 3).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::Alias(AliasError::DepthExceeded { max_depth: 3, ref chain }) if chain.len() == 4
        ));
    }

    #[test]
    fn test_step_errors_propagate() {
        let g = graph(&[("a", Some("missing"))]);
        assert!(matches!(run(&g, "a", 8), Err(ResolutionError::UnknownToken { .. })));
    }
}
