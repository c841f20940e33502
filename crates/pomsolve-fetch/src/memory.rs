//! In-memory downloader for tests and offline resolution.

use std::collections::HashMap;

use pomsolve_model::coordinate::{Gav, GroupArtifact};
use pomsolve_model::parse::parse_pom;
use pomsolve_model::raw::{RawPom, RawRepository};
use pomsolve_util::errors::PomResult;

use crate::downloader::Downloader;

/// A downloader serving POMs, artifact bytes, and version listings from
/// in-memory maps. Repository lists are ignored.
#[derive(Debug, Default)]
pub struct MemoryDownloader {
    poms: HashMap<Gav, RawPom>,
    versions: HashMap<GroupArtifact, Vec<String>>,
    artifacts: HashMap<Gav, Vec<u8>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a POM under its own coordinates. POMs without a complete
    /// group/artifact/version are skipped with a warning.
    pub fn with_pom(mut self, pom: RawPom) -> Self {
        match (&pom.group_id, &pom.artifact_id, &pom.version) {
            (Some(g), Some(a), Some(v)) => {
                self.poms.insert(Gav::new(g, a, v), pom);
            }
            _ => tracing::warn!(
                "ignoring fixture POM without complete coordinates: {}",
                pom.coordinate_label()
            ),
        }
        self
    }

    /// Parse `xml` and register it, indexed under `gav` regardless of the
    /// coordinates the document declares (parent-less child POMs have none).
    pub fn with_pom_xml(mut self, gav: &str, xml: &str) -> PomResult<Self> {
        let pom = parse_pom(xml)?;
        let gav = Gav::parse(gav).ok_or_else(|| {
            pomsolve_util::errors::PomError::Generic {
                message: format!("invalid fixture coordinates: {gav}"),
            }
        })?;
        self.poms.insert(gav, pom);
        Ok(self)
    }

    pub fn with_versions(mut self, group_id: &str, artifact_id: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            GroupArtifact::new(group_id, artifact_id),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_artifact(mut self, gav: &str, bytes: &[u8]) -> Self {
        if let Some(gav) = Gav::parse(gav) {
            self.artifacts.insert(gav, bytes.to_vec());
        }
        self
    }
}

impl Downloader for MemoryDownloader {
    fn download_pom(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        _classifier: Option<&str>,
        _relative_path: Option<&str>,
        _originator: Option<&RawPom>,
        _repositories: &[RawRepository],
    ) -> PomResult<Option<RawPom>> {
        Ok(self
            .poms
            .get(&Gav::new(group_id, artifact_id, version))
            .cloned())
    }

    fn download_artifact(
        &self,
        coordinate: &GroupArtifact,
        version: &str,
        _classifier: Option<&str>,
        _repositories: &[RawRepository],
    ) -> PomResult<Option<Vec<u8>>> {
        Ok(self
            .artifacts
            .get(&Gav::new(&coordinate.group_id, &coordinate.artifact_id, version))
            .cloned())
    }

    fn find_versions(
        &self,
        coordinate: &GroupArtifact,
        _repositories: &[RawRepository],
    ) -> PomResult<Vec<String>> {
        Ok(self.versions.get(coordinate).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_registered_poms() {
        let downloader = MemoryDownloader::new()
            .with_pom_xml(
                "org.example:lib:1.0",
                r#"<project>
                    <groupId>org.example</groupId>
                    <artifactId>lib</artifactId>
                    <version>1.0</version>
                </project>"#,
            )
            .unwrap();

        let pom = downloader
            .download_pom("org.example", "lib", "1.0", None, None, None, &[])
            .unwrap()
            .unwrap();
        assert_eq!(pom.artifact_id.as_deref(), Some("lib"));

        assert!(downloader
            .download_pom("org.example", "lib", "2.0", None, None, None, &[])
            .unwrap()
            .is_none());
    }

    #[test]
    fn serves_versions_and_artifacts() {
        let downloader = MemoryDownloader::new()
            .with_versions("org.example", "lib", &["1.0", "1.1"])
            .with_artifact("org.example:lib:1.0", b"jar bytes");

        let ga = GroupArtifact::new("org.example", "lib");
        assert_eq!(downloader.find_versions(&ga, &[]).unwrap(), vec!["1.0", "1.1"]);
        assert_eq!(
            downloader.download_artifact(&ga, "1.0", None, &[]).unwrap(),
            Some(b"jar bytes".to_vec())
        );
    }
}
