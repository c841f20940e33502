//! The raw POM model: fields exactly as declared in the XML, with `${…}`
//! placeholders intact and inheritance not yet applied. Profile activation
//! is resolved here, so the resolver only ever sees active sections.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::coordinate::Gav;

/// An unresolved POM, the parser's output and the resolver's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawPom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    /// Dated snapshot version, when this POM was served for a `-SNAPSHOT`.
    pub snapshot_version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<RawParent>,
    pub dependencies: Vec<RawDependency>,
    pub dependency_management: Vec<RawDependency>,
    pub repositories: Vec<RawRepository>,
    pub licenses: Vec<RawLicense>,
    pub properties: BTreeMap<String, String>,
    pub profiles: Vec<RawProfile>,
    /// Where this POM came from, for diagnostics.
    pub source: Option<PathBuf>,
}

impl RawPom {
    /// Coordinates for error messages; unset fields render as `?`.
    pub fn coordinate_label(&self) -> String {
        format!(
            "{}:{}:{}",
            self.group_id.as_deref().unwrap_or("?"),
            self.artifact_id.as_deref().unwrap_or("?"),
            self.version.as_deref().unwrap_or("?"),
        )
    }

    /// Source location for error messages.
    pub fn source_label(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<in-memory>".to_string())
    }

    fn active_profiles<'a>(&'a self, active: &'a [String]) -> impl Iterator<Item = &'a RawProfile> {
        self.profiles.iter().filter(|p| p.is_active(active))
    }

    /// Declared dependencies plus those contributed by active profiles.
    pub fn active_dependencies<'a>(&'a self, active: &'a [String]) -> Vec<&'a RawDependency> {
        self.dependencies
            .iter()
            .chain(self.active_profiles(active).flat_map(|p| p.dependencies.iter()))
            .collect()
    }

    /// Managed dependencies plus those contributed by active profiles.
    pub fn active_dependency_management<'a>(
        &'a self,
        active: &'a [String],
    ) -> Vec<&'a RawDependency> {
        self.dependency_management
            .iter()
            .chain(
                self.active_profiles(active)
                    .flat_map(|p| p.dependency_management.iter()),
            )
            .collect()
    }

    /// Declared properties, overridden by active profiles in order.
    pub fn active_properties(&self, active: &[String]) -> BTreeMap<String, String> {
        let mut properties = self.properties.clone();
        for profile in self.active_profiles(active) {
            for (key, value) in &profile.properties {
                properties.insert(key.clone(), value.clone());
            }
        }
        properties
    }

    /// Declared repositories plus those contributed by active profiles.
    pub fn active_repositories(&self, active: &[String]) -> Vec<RawRepository> {
        self.repositories
            .iter()
            .chain(self.active_profiles(active).flat_map(|p| p.repositories.iter()))
            .cloned()
            .collect()
    }
}

/// Reference to a parent POM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawParent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

impl RawParent {
    pub fn gav(&self) -> Gav {
        Gav::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

/// A dependency declaration. Coordinate and version strings may still
/// contain `${…}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub type_: Option<String>,
    pub classifier: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<RawExclusion>,
}

/// An exclusion pattern pair; `*` is a wildcard on either side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawExclusion {
    pub group_id: String,
    pub artifact_id: String,
}

/// A repository declaration. `None` policies mean enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawRepository {
    pub id: Option<String>,
    pub url: String,
    pub releases: Option<bool>,
    pub snapshots: Option<bool>,
}

impl RawRepository {
    pub fn releases_enabled(&self) -> bool {
        self.releases.unwrap_or(true)
    }

    pub fn snapshots_enabled(&self) -> bool {
        self.snapshots.unwrap_or(true)
    }
}

/// A license declaration, free-form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawLicense {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// A profile: sections that only apply when the profile is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawProfile {
    pub id: Option<String>,
    pub active_by_default: bool,
    pub dependencies: Vec<RawDependency>,
    pub dependency_management: Vec<RawDependency>,
    pub properties: BTreeMap<String, String>,
    pub repositories: Vec<RawRepository>,
}

impl RawProfile {
    pub fn is_active(&self, active: &[String]) -> bool {
        self.active_by_default
            || self
                .id
                .as_deref()
                .is_some_and(|id| active.iter().any(|a| a == id))
    }
}
