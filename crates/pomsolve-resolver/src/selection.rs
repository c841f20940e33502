//! Scope-ordered version selection implementing nearest-wins.
//!
//! The table records, per scope, which version of each coordinate was seen
//! nearest to the root. Lookups consult every equal-or-broader scope first
//! so a subtree with no chance of winning conflict resolution is never
//! resolved at its own version.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use pomsolve_fetch::downloader::Downloader;
use pomsolve_model::coordinate::GroupArtifact;
use pomsolve_model::raw::RawRepository;
use pomsolve_model::scope::Scope;
use pomsolve_model::version;
use pomsolve_util::errors::{PomError, PomResult};

/// A version request for one coordinate, linked to the nearest request seen
/// at an equal-or-broader scope, when there is one.
#[derive(Debug)]
pub struct RequestedVersion {
    pub group_artifact: GroupArtifact,
    nearer: Option<Arc<RequestedVersion>>,
    version: String,
}

impl RequestedVersion {
    pub fn new(
        group_artifact: GroupArtifact,
        nearer: Option<Arc<RequestedVersion>>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_artifact,
            nearer,
            version: version.into(),
        }
    }

    /// The concrete version this request resolves to: the nearest ancestor
    /// selection when one exists, otherwise range resolution against
    /// repository metadata, otherwise the declared version.
    pub fn resolve(
        &self,
        downloader: &dyn Downloader,
        repositories: &[RawRepository],
    ) -> PomResult<String> {
        if let Some(nearer) = &self.nearer {
            return nearer.resolve(downloader, repositories);
        }
        if version::is_range(&self.version) {
            let available = downloader.find_versions(&self.group_artifact, repositories)?;
            return version::select_from(&self.version, &available).ok_or_else(|| {
                PomError::Parse {
                    message: format!(
                        "No version of {} satisfies the range {}",
                        self.group_artifact, self.version
                    ),
                }
                .into()
            });
        }
        Ok(self.version.clone())
    }
}

/// The per-resolver selection state: `Scope → (coordinate → request)`,
/// ordered by scope so a head-map query walks broader scopes first.
pub struct VersionTable {
    table: BTreeMap<Scope, HashMap<GroupArtifact, Arc<RequestedVersion>>>,
}

impl VersionTable {
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        for scope in Scope::ALL {
            table.insert(scope, HashMap::new());
        }
        Self { table }
    }

    /// The conflict-resolution answer for `coordinate` requested at `scope`
    /// with `version`: the entry already pinned at this scope, or a fresh
    /// request linked to the nearest equal-or-broader pin.
    pub fn select(
        &self,
        scope: Option<Scope>,
        coordinate: &GroupArtifact,
        version: &str,
    ) -> Arc<RequestedVersion> {
        let Some(scope) = scope else {
            return Arc::new(RequestedVersion::new(coordinate.clone(), None, version));
        };

        let nearer = self
            .table
            .range(..=scope)
            .find_map(|(_, in_scope)| in_scope.get(coordinate).cloned());

        self.table[&scope]
            .get(coordinate)
            .cloned()
            .unwrap_or_else(|| Arc::new(RequestedVersion::new(coordinate.clone(), nearer, version)))
    }

    /// Record a selection. Only the breadth-first worker writes, and never
    /// for a dependency whose transitive scope was pruned.
    pub fn insert(
        &mut self,
        scope: Scope,
        coordinate: GroupArtifact,
        request: Arc<RequestedVersion>,
    ) {
        if let Some(in_scope) = self.table.get_mut(&scope) {
            in_scope.insert(coordinate, request);
        }
    }
}

impl Default for VersionTable {
    fn default() -> Self {
        Self::new()
    }
}
