//! Path pattern evaluation.
//!
//! Literal patterns compare byte-for-byte (case-sensitive). Regex patterns
//! are pre-anchored at compile time and match the full path. Ant-style
//! patterns are evaluated segment by segment, short-circuiting on the first
//! mismatch: `*` consumes exactly one segment, a trailing `**` consumes the
//! rest.

use propylaea_core::{AntPattern, AntSegment, PathPattern};

/// Returns true if the pattern matches the given request path.
#[must_use]
pub fn matches(pattern: &PathPattern, path: &str) -> bool {
    match pattern {
        PathPattern::Literal(literal) => literal == path,
        PathPattern::Regex(re) => re.regex().is_match(path),
        PathPattern::Ant(ant) => ant_matches(ant, path),
    }
}

/// Evaluates an ant-style pattern against a path.
#[must_use]
pub fn ant_matches(pattern: &AntPattern, path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    for expected in pattern.segments() {
        match expected {
            // A trailing `**` swallows whatever remains, including nothing.
            AntSegment::DoubleStar => return true,
            AntSegment::Star => {
                if segments.next().is_none() {
                    return false;
                }
            }
            AntSegment::Literal(literal) => match segments.next() {
                Some(actual) if actual == literal => {}
                _ => return false,
            },
        }
    }

    segments.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ant(raw: &str) -> AntPattern {
        AntPattern::parse(raw).unwrap()
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let pattern = PathPattern::literal("/Devices");
        assert!(matches(&pattern, "/Devices"));
        assert!(!matches(&pattern, "/devices"));
    }

    #[test]
    fn test_star_matches_exactly_one_segment() {
        let pattern = ant("/user/*");
        assert!(ant_matches(&pattern, "/user/1"));
        assert!(ant_matches(&pattern, "/user/abc"));
        assert!(!ant_matches(&pattern, "/user"));
        assert!(!ant_matches(&pattern, "/user/1/posts"));
    }

    #[test]
    fn test_double_star_matches_trailing_segments() {
        let pattern = ant("/files/**");
        assert!(ant_matches(&pattern, "/files"));
        assert!(ant_matches(&pattern, "/files/a"));
        assert!(ant_matches(&pattern, "/files/a/b/c"));
        assert!(!ant_matches(&pattern, "/other/a"));
    }

    #[test]
    fn test_star_in_the_middle() {
        let pattern = ant("/orgs/*/users");
        assert!(ant_matches(&pattern, "/orgs/acme/users"));
        assert!(!ant_matches(&pattern, "/orgs/acme/teams"));
        assert!(!ant_matches(&pattern, "/orgs/acme/users/1"));
    }

    #[test]
    fn test_first_segment_mismatch_short_circuits() {
        let pattern = ant("/user/*/posts/*");
        assert!(!ant_matches(&pattern, "/account/1/posts/2"));
    }

    #[test]
    fn test_regex_matches_full_path() {
        let pattern = PathPattern::regex("/user/\\d+").unwrap();
        assert!(matches(&pattern, "/user/1"));
        assert!(!matches(&pattern, "/user/abc"));
        assert!(!matches(&pattern, "/user/1/extra"));
    }
}
