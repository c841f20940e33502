//! `${…}` property evaluation against a partially resolved POM.
//!
//! Well-known `project.*`/`pom.*` placeholders are answered from the POM
//! itself (with parent fallthrough where Maven allows it) before the
//! general lookup chain runs: active POM properties, properties carried by
//! imported BOMs, the ancestor chain, and finally the process environment.
//! A key that matches nowhere stays a literal `${…}` string.

use std::collections::BTreeMap;
use std::sync::Arc;

use pomsolve_model::raw::RawPom;
use pomsolve_model::resolved::{ManagedDependency, ResolvedPom};

/// Evaluation passes before a version gives up on reaching a fixed point.
const MAX_VERSION_STEPS: usize = 3;

/// The property-visible parts of a partial model.
pub struct PropertyContext<'a> {
    pub raw: &'a RawPom,
    pub active_properties: &'a BTreeMap<String, String>,
    pub dependency_management: &'a [ManagedDependency],
    pub parent: Option<&'a Arc<ResolvedPom>>,
}

impl PropertyContext<'_> {
    /// Evaluate a groupId. `project.groupId` falls through to the parent
    /// when the POM does not declare one.
    pub fn group_id(&self, g: Option<&str>) -> Option<String> {
        let g = g?;
        match g {
            "${project.groupId}" | "${pom.groupId}" => self
                .raw
                .group_id
                .clone()
                .or_else(|| self.parent.map(|p| p.group_id.clone())),
            "${project.parent.groupId}" => self.parent.map(|p| p.group_id.clone()),
            _ => Some(self.value(g)),
        }
    }

    /// Evaluate an artifactId. `project.artifactId` never inherits from the
    /// parent.
    pub fn artifact_id(&self, a: Option<&str>) -> Option<String> {
        let a = a?;
        match a {
            "${project.artifactId}" | "${pom.artifactId}" => self.raw.artifact_id.clone(),
            "${project.parent.artifactId}" => self.parent.map(|p| p.artifact_id.clone()),
            _ => Some(self.value(a)),
        }
    }

    /// Evaluate a version string to a fixed point, so a property that
    /// resolves to another placeholder gets another pass.
    pub fn version(&self, v: Option<&str>) -> Option<String> {
        let mut version = v.map(str::to_string);
        let mut last: Option<String> = None;
        for _ in 0..MAX_VERSION_STEPS {
            let Some(current) = version.clone() else { break };
            if last.as_deref() == Some(current.as_str()) {
                break;
            }
            last = Some(current.clone());
            version = match current.as_str() {
                "${project.version}" | "${pom.version}" => self
                    .raw
                    .version
                    .clone()
                    .or_else(|| self.parent.map(|p| p.version.clone())),
                "${project.parent.version}" => self.parent.map(|p| p.version.clone()),
                other => Some(self.value(other)),
            };
        }
        version
    }

    /// Evaluate a scope string.
    pub fn scope(&self, s: Option<&str>) -> Option<String> {
        s.map(|s| self.value(s))
    }

    /// General lookup for a whole-string `${key}` placeholder. Anything
    /// else, including a key that matches nowhere, is returned as-is.
    fn value(&self, v: &str) -> String {
        if !(v.starts_with("${") && v.ends_with('}')) {
            return v.to_string();
        }
        let key = &v[2..v.len() - 1];

        if let Some(value) = self.active_properties.get(key) {
            return value.clone();
        }

        for managed in self.dependency_management {
            if let Some(value) = managed.properties().and_then(|p| p.get(key)) {
                return value.clone();
            }
        }

        let mut ancestor = self.parent;
        while let Some(pom) = ancestor {
            if let Some(value) = pom.property(key) {
                return value.to_string();
            }
            ancestor = pom.parent.as_ref();
        }

        if let Ok(value) = std::env::var(key) {
            return value;
        }

        v.to_string()
    }
}
