//! Maven repository URL layout.

use pomsolve_model::raw::RawRepository;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// The implicit super-POM repository that terminates every repository
/// chain, mirroring Maven's built-in `central` definition (releases only).
pub fn super_pom_repository() -> RawRepository {
    RawRepository {
        id: Some("central".to_string()),
        url: MAVEN_CENTRAL_URL.to_string(),
        releases: Some(true),
        snapshots: Some(false),
    }
}

/// Standard repository-layout path for a coordinate:
/// `org.example:lib:1.0` becomes `org/example/lib/1.0`.
pub fn coordinate_path(group_id: &str, artifact_id: &str, version: &str) -> String {
    format!("{}/{artifact_id}/{version}", group_id.replace('.', "/"))
}

/// Full URL to a file within a repository.
pub fn file_url(base: &str, group_id: &str, artifact_id: &str, version: &str, filename: &str) -> String {
    format!(
        "{}/{}/{filename}",
        base.trim_end_matches('/'),
        coordinate_path(group_id, artifact_id, version)
    )
}

/// URL to the POM for a coordinate.
pub fn pom_url(base: &str, group_id: &str, artifact_id: &str, version: &str) -> String {
    let filename = format!("{artifact_id}-{version}.pom");
    file_url(base, group_id, artifact_id, version, &filename)
}

/// URL to an artifact payload for a coordinate.
pub fn artifact_url(
    base: &str,
    group_id: &str,
    artifact_id: &str,
    version: &str,
    classifier: Option<&str>,
    extension: &str,
) -> String {
    let filename = match classifier {
        Some(c) => format!("{artifact_id}-{version}-{c}.{extension}"),
        None => format!("{artifact_id}-{version}.{extension}"),
    };
    file_url(base, group_id, artifact_id, version, &filename)
}

/// URL to the artifact-level `maven-metadata.xml` (version listing).
pub fn metadata_url(base: &str, group_id: &str, artifact_id: &str) -> String {
    format!(
        "{}/{}/{artifact_id}/maven-metadata.xml",
        base.trim_end_matches('/'),
        group_id.replace('.', "/")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_path_replaces_dots() {
        assert_eq!(
            coordinate_path("org.apache.commons", "commons-lang3", "3.12.0"),
            "org/apache/commons/commons-lang3/3.12.0"
        );
    }

    #[test]
    fn pom_url_layout() {
        assert_eq!(
            pom_url(MAVEN_CENTRAL_URL, "org.apache.commons", "commons-lang3", "3.12.0"),
            "https://repo.maven.apache.org/maven2/org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.pom"
        );
    }

    #[test]
    fn artifact_url_with_classifier() {
        let url = artifact_url("https://repo.example.com/maven/", "com.example", "lib", "1.0", Some("sources"), "jar");
        assert_eq!(
            url,
            "https://repo.example.com/maven/com/example/lib/1.0/lib-1.0-sources.jar"
        );
    }

    #[test]
    fn metadata_url_layout() {
        assert_eq!(
            metadata_url(MAVEN_CENTRAL_URL, "junit", "junit"),
            "https://repo.maven.apache.org/maven2/junit/junit/maven-metadata.xml"
        );
    }

    #[test]
    fn super_pom_repository_is_releases_only() {
        let repo = super_pom_repository();
        assert!(repo.releases_enabled());
        assert!(!repo.snapshots_enabled());
    }
}
