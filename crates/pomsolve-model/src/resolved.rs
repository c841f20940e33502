//! The resolved POM model: inheritance applied, every dependency pinned to
//! the version chosen by conflict resolution.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::coordinate::{Gav, GroupArtifact};
use crate::scope::Scope;

/// A fully resolved POM.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPom {
    pub source: Option<PathBuf>,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub snapshot_version: Option<String>,
    pub parent: Option<Arc<ResolvedPom>>,
    pub dependencies: Vec<ResolvedDependency>,
    pub dependency_management: Vec<ManagedDependency>,
    pub licenses: Vec<License>,
    pub repositories: Vec<Repository>,
    pub properties: BTreeMap<String, String>,
}

impl ResolvedPom {
    pub fn gav(&self) -> Gav {
        Gav::new(&self.group_id, &self.artifact_id, &self.version)
    }

    /// Property lookup on this POM only; ancestors are the caller's concern.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Version pinned for `group:artifact` by this POM's dependency
    /// management or any ancestor's, nearest first.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        for managed in &self.dependency_management {
            for entry in managed.entries() {
                if entry.group_id == group_id && entry.artifact_id == artifact_id {
                    return Some(entry.version);
                }
            }
        }
        self.parent
            .as_ref()
            .and_then(|p| p.managed_version(group_id, artifact_id))
    }
}

/// An edge in the resolved graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDependency {
    pub scope: Scope,
    pub classifier: Option<String>,
    pub optional: bool,
    pub pom: Arc<ResolvedPom>,
    /// The version string as originally declared, before conflict
    /// resolution and property expansion.
    pub requested_version: Option<String>,
    pub exclusions: Vec<GroupArtifact>,
}

impl ResolvedDependency {
    pub fn group_id(&self) -> &str {
        &self.pom.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.pom.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.pom.version
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact::new(&self.pom.group_id, &self.pom.artifact_id)
    }
}

/// A dependencyManagement entry: declared inline or imported from a BOM.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedDependency {
    Defined {
        group_id: String,
        artifact_id: String,
        version: String,
        /// The version string as declared, possibly a property reference.
        requested_version: String,
        scope: Option<Scope>,
        classifier: Option<String>,
        exclusions: Vec<GroupArtifact>,
    },
    Imported {
        group_id: String,
        artifact_id: String,
        version: String,
        requested_version: String,
        /// The fully resolved BOM.
        pom: Arc<ResolvedPom>,
    },
}

/// One managed coordinate pin, as seen by version lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedEntry<'a> {
    pub group_id: &'a str,
    pub artifact_id: &'a str,
    pub version: &'a str,
}

impl ManagedDependency {
    /// The coordinate pins this entry contributes. A defined entry is its
    /// own pin; an imported BOM contributes its managed entries transitively.
    pub fn entries(&self) -> Vec<ManagedEntry<'_>> {
        match self {
            ManagedDependency::Defined {
                group_id,
                artifact_id,
                version,
                ..
            } => vec![ManagedEntry {
                group_id,
                artifact_id,
                version,
            }],
            ManagedDependency::Imported { pom, .. } => pom
                .dependency_management
                .iter()
                .flat_map(|m| m.entries())
                .collect(),
        }
    }

    /// Properties contributed by this entry; only imported BOMs carry any.
    pub fn properties(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ManagedDependency::Defined { .. } => None,
            ManagedDependency::Imported { pom, .. } => Some(&pom.properties),
        }
    }
}

/// Canonical license families, mapped from free-form POM license names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum License {
    Apache2,
    Bsd,
    Cddl,
    CreativeCommons,
    Eclipse,
    Gpl,
    Lgpl,
    Mit,
    Mozilla,
    PublicDomain,
    Unknown,
}

impl License {
    /// Best-effort canonicalization; anything unrecognized is `Unknown`.
    pub fn from_name(name: Option<&str>) -> License {
        let Some(name) = name else {
            return License::Unknown;
        };
        let lower = name.to_lowercase();
        if lower.contains("apache") {
            License::Apache2
        } else if lower.contains("lgpl") || lower.contains("lesser general public") {
            License::Lgpl
        } else if lower.contains("gpl") || lower.contains("general public license") {
            License::Gpl
        } else if lower.contains("bsd") {
            License::Bsd
        } else if lower.contains("cddl") || lower.contains("common development") {
            License::Cddl
        } else if lower.contains("creative commons") || lower.contains("cc0") {
            License::CreativeCommons
        } else if lower.contains("eclipse") || lower.contains("epl") {
            License::Eclipse
        } else if lower.contains("mit") {
            License::Mit
        } else if lower.contains("mozilla") || lower.contains("mpl") {
            License::Mozilla
        } else if lower.contains("public domain") || lower.contains("unlicense") {
            License::PublicDomain
        } else {
            License::Unknown
        }
    }
}

/// A resolved repository with a validated URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub url: Url,
    pub releases: bool,
    pub snapshots: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_pom(group: &str, artifact: &str, version: &str) -> ResolvedPom {
        ResolvedPom {
            source: None,
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            version: version.to_string(),
            snapshot_version: None,
            parent: None,
            dependencies: Vec::new(),
            dependency_management: Vec::new(),
            licenses: Vec::new(),
            repositories: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    fn defined(group: &str, artifact: &str, version: &str) -> ManagedDependency {
        ManagedDependency::Defined {
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            version: version.to_string(),
            requested_version: version.to_string(),
            scope: None,
            classifier: None,
            exclusions: Vec::new(),
        }
    }

    #[test]
    fn managed_version_from_own_entries() {
        let mut pom = empty_pom("org.example", "app", "1.0");
        pom.dependency_management.push(defined("com.dep", "lib", "3.1"));
        assert_eq!(pom.managed_version("com.dep", "lib"), Some("3.1"));
        assert_eq!(pom.managed_version("com.dep", "other"), None);
    }

    #[test]
    fn managed_version_falls_back_to_parent() {
        let mut parent = empty_pom("org.example", "parent", "1.0");
        parent.dependency_management.push(defined("com.dep", "lib", "2.0"));
        let mut child = empty_pom("org.example", "child", "1.0");
        child.parent = Some(Arc::new(parent));
        assert_eq!(child.managed_version("com.dep", "lib"), Some("2.0"));
    }

    #[test]
    fn imported_bom_entries_are_transitive() {
        let mut bom = empty_pom("org.example", "bom", "1.0");
        bom.dependency_management.push(defined("com.dep", "a", "1.1"));
        bom.dependency_management.push(defined("com.dep", "b", "2.2"));
        let imported = ManagedDependency::Imported {
            group_id: "org.example".to_string(),
            artifact_id: "bom".to_string(),
            version: "1.0".to_string(),
            requested_version: "1.0".to_string(),
            pom: Arc::new(bom),
        };
        let entries = imported.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].version, "2.2");
    }

    #[test]
    fn only_imported_entries_contribute_properties() {
        let mut bom = empty_pom("org.example", "bom", "1.0");
        bom.properties.insert("x.version".to_string(), "9".to_string());
        let imported = ManagedDependency::Imported {
            group_id: "org.example".to_string(),
            artifact_id: "bom".to_string(),
            version: "1.0".to_string(),
            requested_version: "1.0".to_string(),
            pom: Arc::new(bom),
        };
        assert!(imported.properties().unwrap().contains_key("x.version"));
        assert!(defined("g", "a", "1").properties().is_none());
    }

    #[test]
    fn license_canonicalization() {
        assert_eq!(
            License::from_name(Some("The Apache Software License, Version 2.0")),
            License::Apache2
        );
        assert_eq!(License::from_name(Some("MIT License")), License::Mit);
        assert_eq!(
            License::from_name(Some("GNU Lesser General Public License")),
            License::Lgpl
        );
        assert_eq!(License::from_name(Some("Something Custom")), License::Unknown);
        assert_eq!(License::from_name(None), License::Unknown);
    }
}
