//! Exclusion pattern matching over group/artifact globs.

use std::collections::BTreeSet;

use regex::Regex;

use pomsolve_model::coordinate::GroupArtifact;

/// True when `group_id:artifact_id` matches the exclusion pattern pair.
///
/// `*` is the only wildcard and maps to `.*`; matching is against the full
/// literal strings as declared. A pattern that fails to compile is ignored,
/// so it can never exclude anything.
pub fn matches(pattern: &GroupArtifact, group_id: &str, artifact_id: &str) -> bool {
    match (compile(&pattern.group_id), compile(&pattern.artifact_id)) {
        (Some(group), Some(artifact)) => group.is_match(group_id) && artifact.is_match(artifact_id),
        _ => false,
    }
}

/// True when any pattern in the set excludes the dependency.
pub fn excluded_by_any(
    patterns: &BTreeSet<GroupArtifact>,
    group_id: &str,
    artifact_id: &str,
) -> bool {
    patterns.iter().any(|p| matches(p, group_id, artifact_id))
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^{}$", pattern.replace('*', ".*"))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(group: &str, artifact: &str) -> GroupArtifact {
        GroupArtifact::new(group, artifact)
    }

    #[test]
    fn exact_match() {
        assert!(matches(
            &pattern("commons-logging", "commons-logging"),
            "commons-logging",
            "commons-logging"
        ));
        assert!(!matches(
            &pattern("commons-logging", "commons-logging"),
            "commons-logging",
            "other"
        ));
    }

    #[test]
    fn wildcard_artifact() {
        let p = pattern("org.slf4j", "*");
        assert!(matches(&p, "org.slf4j", "slf4j-api"));
        assert!(matches(&p, "org.slf4j", "jul-to-slf4j"));
        assert!(!matches(&p, "org.slf4j.ext", "slf4j-api"));
    }

    #[test]
    fn wildcard_infix() {
        let p = pattern("org.*", "*-api");
        assert!(matches(&p, "org.example", "stable-api"));
        assert!(!matches(&p, "com.example", "stable-api"));
        assert!(!matches(&p, "org.example", "api-client"));
    }

    #[test]
    fn malformed_pattern_never_excludes() {
        let p = pattern("org.(unclosed", "*");
        assert!(!matches(&p, "org.(unclosed", "anything"));
    }

    #[test]
    fn any_of_set() {
        let patterns: BTreeSet<GroupArtifact> =
            [pattern("junit", "junit"), pattern("org.slf4j", "*")].into();
        assert!(excluded_by_any(&patterns, "junit", "junit"));
        assert!(excluded_by_any(&patterns, "org.slf4j", "slf4j-api"));
        assert!(!excluded_by_any(&patterns, "com.google.guava", "guava"));
    }
}
