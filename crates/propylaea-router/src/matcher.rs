//! The precedence-based route matcher.
//!
//! Matching resolves an incoming (method, path) pair to exactly one
//! published [`ApiDefinition`] under a strict precedence policy, first
//! category with at least one match wins:
//!
//! 1. **Exact literal** match on the path.
//! 2. **Anchored regex** match.
//! 3. **Ant-style wildcard** match.
//!
//! Regex ranks above ant because regex definitions are assumed more
//! intentional and must not be shadowed by a broader wildcard registered
//! later. More than one match within a category is a [`Conflict`]: ambiguous
//! routing is a configuration defect, never broken arbitrarily by priority
//! or insertion order.
//!
//! [`Conflict`]: propylaea_core::ErrorKind::Conflict

use crate::pattern;
use http::Method;
use propylaea_core::{ApiDefinition, GatewayError, GatewayResult, PathPattern};
use std::sync::Arc;

/// Resolves a (method, path) pair against the method's candidate
/// definitions.
///
/// `candidates` must already be partitioned by method (see
/// [`ApiRegistry`](crate::ApiRegistry)), keeping the lookup proportional to
/// the method's definitions rather than the whole registry.
pub fn match_route(
    candidates: &[Arc<ApiDefinition>],
    method: &Method,
    path: &str,
) -> GatewayResult<Arc<ApiDefinition>> {
    let exact: Vec<&Arc<ApiDefinition>> = candidates
        .iter()
        .filter(|d| matches!(d.pattern(), PathPattern::Literal(p) if p == path))
        .collect();
    if let Some(found) = pick("exact", &exact, method, path)? {
        return Ok(found);
    }

    let regex: Vec<&Arc<ApiDefinition>> = candidates
        .iter()
        .filter(|d| {
            matches!(d.pattern(), PathPattern::Regex(_)) && pattern::matches(d.pattern(), path)
        })
        .collect();
    if let Some(found) = pick("regex", &regex, method, path)? {
        return Ok(found);
    }

    let ant: Vec<&Arc<ApiDefinition>> = candidates
        .iter()
        .filter(|d| {
            matches!(d.pattern(), PathPattern::Ant(_)) && pattern::matches(d.pattern(), path)
        })
        .collect();
    if let Some(found) = pick("ant", &ant, method, path)? {
        return Ok(found);
    }

    Err(GatewayError::not_found(format!(
        "no API matched {method} {path}"
    )))
}

/// Returns the single match of a category, a conflict for more, nothing for
/// none.
fn pick(
    category: &str,
    matched: &[&Arc<ApiDefinition>],
    method: &Method,
    path: &str,
) -> GatewayResult<Option<Arc<ApiDefinition>>> {
    match matched {
        [] => Ok(None),
        [single] => Ok(Some(Arc::clone(single))),
        many => {
            let names: Vec<&str> = many.iter().map(|d| d.name()).collect();
            tracing::error!(
                category,
                %method,
                path,
                definitions = ?names,
                "ambiguous route match"
            );
            Err(GatewayError::conflict(format!(
                "{} definitions matched {method} {path} in the {category} category: {}",
                many.len(),
                names.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propylaea_core::{ErrorKind, HttpEndpoint};

    fn definition(name: &str, method: Method, pattern: PathPattern) -> Arc<ApiDefinition> {
        Arc::new(
            ApiDefinition::new(
                name,
                method.clone(),
                pattern,
                vec![HttpEndpoint::new("main", "svc", method, "/backend")],
            )
            .unwrap(),
        )
    }

    fn get(name: &str, pattern: PathPattern) -> Arc<ApiDefinition> {
        definition(name, Method::GET, pattern)
    }

    #[test]
    fn test_exact_wins_over_overlapping_patterns() {
        let candidates = vec![
            get("literal", PathPattern::literal("/user/1")),
            get("regex", PathPattern::regex("/user/\\d+").unwrap()),
            get("ant", PathPattern::ant("/user/*").unwrap()),
        ];
        let found = match_route(&candidates, &Method::GET, "/user/1").unwrap();
        assert_eq!(found.name(), "literal");
    }

    #[test]
    fn test_duplicate_literals_conflict() {
        let candidates = vec![
            get("a", PathPattern::literal("/devices")),
            get("b", PathPattern::literal("/devices")),
        ];
        let err = match_route(&candidates, &Method::GET, "/devices").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_regex_before_ant() {
        let candidates = vec![
            get("userAnt", PathPattern::ant("/user/*").unwrap()),
            get("get_user", PathPattern::regex("/user/\\d+").unwrap()),
        ];
        let found = match_route(&candidates, &Method::GET, "/user/1").unwrap();
        assert_eq!(found.name(), "get_user");
    }

    #[test]
    fn test_ant_fallback_when_regex_misses() {
        let candidates = vec![
            get("userAnt", PathPattern::ant("/user/*").unwrap()),
            get("get_user", PathPattern::regex("/user/\\d+").unwrap()),
        ];
        let found = match_route(&candidates, &Method::GET, "/user/abc").unwrap();
        assert_eq!(found.name(), "userAnt");
    }

    #[test]
    fn test_two_ant_matches_conflict() {
        let candidates = vec![
            get("a", PathPattern::ant("/user/*").unwrap()),
            get("b", PathPattern::ant("/*/abc").unwrap()),
        ];
        let err = match_route(&candidates, &Method::GET, "/user/abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_two_regex_matches_conflict() {
        let candidates = vec![
            get("a", PathPattern::regex("/user/\\d+").unwrap()),
            get("b", PathPattern::regex("/user/.+").unwrap()),
        ];
        let err = match_route(&candidates, &Method::GET, "/user/1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_single_ant_match_wins() {
        let candidates = vec![get("userAnt", PathPattern::ant("/user/*").unwrap())];
        let found = match_route(&candidates, &Method::GET, "/user/anything").unwrap();
        assert_eq!(found.name(), "userAnt");
    }

    #[test]
    fn test_empty_candidates_not_found() {
        let err = match_route(&[], &Method::GET, "/users").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_no_category_matches_not_found() {
        let candidates = vec![get("a", PathPattern::literal("/devices"))];
        let err = match_route(&candidates, &Method::GET, "/users").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
