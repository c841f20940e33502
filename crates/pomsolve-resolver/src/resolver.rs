//! The resolver: a breadth-first worker that turns raw POMs into partial
//! models, and a depth-first assembler that produces the final resolved
//! models. One `Resolver` owns the work queue, the memo tables, and the
//! version-selection table for a single `resolve` call; parents and
//! imported BOMs resolve through nested resolvers with fresh state that
//! share the downloader.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use pomsolve_fetch::downloader::Downloader;
use pomsolve_fetch::metrics;
use pomsolve_fetch::repository::super_pom_repository;
use pomsolve_model::coordinate::{Gav, GroupArtifact};
use pomsolve_model::raw::{RawPom, RawRepository};
use pomsolve_model::resolved::{
    License, ManagedDependency, Repository, ResolvedDependency, ResolvedPom,
};
use pomsolve_model::scope::Scope;
use pomsolve_model::settings::MavenSettings;
use pomsolve_util::errors::{into_parse, PomError, PomResult};
use pomsolve_util::placeholder;

use crate::exclusion;
use crate::properties::PropertyContext;
use crate::selection::VersionTable;

/// Observer invoked with every error the resolver encounters, whether or
/// not the error is then suppressed.
pub type ErrorHandler = Arc<dyn Fn(&miette::Report) + Send + Sync>;

/// Knobs for a resolution run.
#[derive(Clone, Default)]
pub struct ResolveOptions {
    /// Profile ids considered active in every POM encountered.
    pub active_profiles: Vec<String>,
    /// Follow optional dependencies instead of pruning them.
    pub resolve_optional: bool,
    /// Convert per-dependency failures into pruned branches instead of
    /// failing the whole resolution.
    pub continue_on_error: bool,
    /// Mirrors, credentials, and extra repositories.
    pub settings: Option<MavenSettings>,
    pub on_error: Option<ErrorHandler>,
}

/// Identity of one node in the breadth-first traversal.
///
/// Two tasks are the same node when scope, raw POM, exclusions, optional
/// flag, classifier, and requested version all match; the repository list
/// and the parent-sighting set ride along but do not participate in
/// identity.
#[derive(Debug)]
pub struct ResolutionTask {
    scope: Scope,
    raw: Arc<RawPom>,
    exclusions: BTreeSet<GroupArtifact>,
    optional: bool,
    classifier: Option<String>,
    requested_version: Option<String>,
    /// Fixed at enqueue time; repository merging happens only there.
    repositories: Vec<RawRepository>,
    /// Parent GAVs seen on the way here, in sighting order.
    seen_parents: Vec<Gav>,
}

impl PartialEq for ResolutionTask {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope
            && self.raw == other.raw
            && self.exclusions == other.exclusions
            && self.optional == other.optional
            && self.classifier == other.classifier
            && self.requested_version == other.requested_version
    }
}

impl Eq for ResolutionTask {}

impl Hash for ResolutionTask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scope.hash(state);
        self.raw.hash(state);
        self.exclusions.hash(state);
        self.optional.hash(state);
        self.classifier.hash(state);
        self.requested_version.hash(state);
    }
}

/// Key of the `resolved` memo. Fields mirror the raw POM and may be unset
/// when a POM inherits them from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PartialTreeKey {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

impl PartialTreeKey {
    fn of(raw: &RawPom) -> Self {
        Self {
            group_id: raw.group_id.clone(),
            artifact_id: raw.artifact_id.clone(),
            version: raw.version.clone(),
        }
    }
}

/// Per-task output of the breadth-first pass.
#[derive(Clone)]
struct PartialModel {
    source: Option<PathBuf>,
    parent: Option<Arc<ResolvedPom>>,
    dependency_management: Vec<ManagedDependency>,
    dependency_tasks: Vec<Arc<ResolutionTask>>,
    licenses: Vec<License>,
    repositories: Vec<RawRepository>,
    properties: BTreeMap<String, String>,
}

impl PartialModel {
    fn new(task: &ResolutionTask) -> Self {
        Self {
            source: task.raw.source.clone(),
            parent: None,
            dependency_management: Vec::new(),
            dependency_tasks: Vec::new(),
            licenses: Vec::new(),
            repositories: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

/// Transitive POM resolver.
pub struct Resolver {
    downloader: Arc<dyn Downloader>,
    options: ResolveOptions,
    /// Set on nested resolvers created for parents and imported BOMs.
    for_parent: bool,
    version_selection: VersionTable,
    work_queue: VecDeque<Arc<ResolutionTask>>,
    partial_results: HashMap<Arc<ResolutionTask>, PartialModel>,
    /// `None` entries record coordinates that were computed as not
    /// resolvable; absence means not computed yet. Both states are final.
    resolved: HashMap<PartialTreeKey, Option<Arc<ResolvedPom>>>,
}

impl Resolver {
    pub fn new(downloader: Arc<dyn Downloader>, options: ResolveOptions) -> Self {
        Self::nested(downloader, options, false)
    }

    fn nested(downloader: Arc<dyn Downloader>, options: ResolveOptions, for_parent: bool) -> Self {
        Self {
            downloader,
            options,
            for_parent,
            version_selection: VersionTable::new(),
            work_queue: VecDeque::new(),
            partial_results: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    /// Resolve a raw POM into its transitive dependency model.
    ///
    /// The root repository list comes from the settings' active
    /// repositories plus the implicit super-POM repository; every POM
    /// further down prepends its own declared repositories.
    pub fn resolve(&mut self, raw: RawPom) -> PomResult<Arc<ResolvedPom>> {
        let group = raw.group_id.clone().unwrap_or_default();
        let artifact = raw.artifact_id.clone().unwrap_or_default();
        let timer = metrics::RESOLVE_DURATION
            .with_label_values(&[group.as_str(), artifact.as_str()])
            .start_timer();

        let mut repositories = self
            .options
            .settings
            .as_ref()
            .map(|s| s.active_repositories(&self.options.active_profiles))
            .unwrap_or_default();
        repositories.push(super_pom_repository());

        let version = raw.version.clone();
        let result = self.resolve_with(Arc::new(raw), Scope::None, version, repositories, Vec::new());
        timer.observe_duration();

        match result? {
            Some(pom) => Ok(pom),
            None => Err(PomError::Parse {
                message: "Unable to resolve the root POM".to_string(),
            }
            .into()),
        }
    }

    fn resolve_with(
        &mut self,
        raw: Arc<RawPom>,
        scope: Scope,
        requested_version: Option<String>,
        repositories: Vec<RawRepository>,
        seen_parents: Vec<Gav>,
    ) -> PomResult<Option<Arc<ResolvedPom>>> {
        let root = Arc::new(ResolutionTask {
            scope,
            raw,
            exclusions: BTreeSet::new(),
            optional: false,
            classifier: None,
            requested_version,
            repositories,
            seen_parents,
        });

        self.work_queue.push_back(root.clone());
        while let Some(task) = self.work_queue.pop_front() {
            self.process_task(&task)?;
        }

        let mut stack = Vec::new();
        self.assemble(&root, &mut stack)
    }

    /// Run one fallible stage. Every error reaches `on_error`; under
    /// `continue_on_error` it then becomes `None`, otherwise it rethrows as
    /// a parse-class error.
    fn guard<T>(&self, result: PomResult<T>) -> PomResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                if let Some(on_error) = &self.options.on_error {
                    on_error(&err);
                }
                if self.options.continue_on_error {
                    Ok(None)
                } else {
                    Err(into_parse(err))
                }
            }
        }
    }

    fn process_task(&mut self, task: &Arc<ResolutionTask>) -> PomResult<()> {
        if self.partial_results.contains_key(task.as_ref()) {
            return Ok(()); // this subtree was already resolved
        }

        let mut partial = PartialModel::new(task);
        self.process_properties(task, &mut partial);
        self.process_repositories(task, &mut partial)?;
        self.process_parent(task, &mut partial)?;
        self.process_dependency_management(task, &mut partial)?;
        self.process_licenses(task, &mut partial);
        self.process_dependencies(task, &mut partial)?;

        self.partial_results.insert(task.clone(), partial);
        Ok(())
    }

    fn process_properties(&self, task: &ResolutionTask, partial: &mut PartialModel) {
        partial.properties = task.raw.active_properties(&self.options.active_profiles);
    }

    /// Declared repositories, with placeholders substituted and URLs
    /// validated, followed by the list inherited from the enqueuing task.
    /// Children see exactly this list.
    fn process_repositories(
        &self,
        task: &ResolutionTask,
        partial: &mut PartialModel,
    ) -> PomResult<()> {
        let mut declared = task.raw.active_repositories(&self.options.active_profiles);
        if let Some(settings) = &self.options.settings {
            declared = settings.apply_mirrors(declared);
        }

        let mut repositories = Vec::new();
        for repo in declared {
            let validated = (|| -> PomResult<RawRepository> {
                let mut url = repo.url.trim().to_string();
                if url.contains("${") {
                    url = placeholder::replace_placeholders(&url, |key| {
                        partial.properties.get(key).cloned()
                    });
                }
                Url::parse(&url).map_err(|e| PomError::Parse {
                    message: format!("Malformed repository URL '{url}': {e}"),
                })?;
                Ok(RawRepository { url, ..repo.clone() })
            })();
            if let Some(repo) = self.guard(validated)? {
                repositories.push(repo);
            }
        }

        repositories.extend(task.repositories.iter().cloned());
        partial.repositories = repositories;
        Ok(())
    }

    fn process_parent(
        &mut self,
        task: &Arc<ResolutionTask>,
        partial: &mut PartialModel,
    ) -> PomResult<()> {
        let Some(raw_parent) = task.raw.parent.clone() else {
            return Ok(());
        };

        // Detect A -> B -> A parent chains and cut them off with a clearer
        // error than unbounded recursion.
        let gav = raw_parent.gav();
        if task.seen_parents.contains(&gav) {
            let chain = task
                .seen_parents
                .iter()
                .map(Gav::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            self.guard::<()>(Err(PomError::Parse {
                message: format!(
                    "Cycle in parent POMs detected: {gav} is its own parent by way of these POMs:\n{chain}"
                ),
            }
            .into()))?;
            return Ok(());
        }
        let mut sightings = task.seen_parents.clone();
        sightings.push(gav);

        let downloaded = self.guard(self.downloader.download_pom(
            &raw_parent.group_id,
            &raw_parent.artifact_id,
            &raw_parent.version,
            None,
            raw_parent.relative_path.as_deref(),
            Some(&task.raw),
            &partial.repositories,
        ))?;
        let raw_parent_pom = match downloaded {
            Some(Some(pom)) => pom,
            _ => return Ok(()),
        };

        let parent_key = PartialTreeKey {
            group_id: Some(raw_parent.group_id.clone()),
            artifact_id: Some(raw_parent.artifact_id.clone()),
            version: Some(raw_parent.version.clone()),
        };
        let parent = match self.resolved.get(&parent_key) {
            Some(memo) => memo.clone(),
            None => {
                let mut nested =
                    Resolver::nested(self.downloader.clone(), self.options.clone(), true);
                let result = self.guard(nested.resolve_with(
                    Arc::new(raw_parent_pom),
                    Scope::Compile,
                    Some(raw_parent.version.clone()),
                    partial.repositories.clone(),
                    sightings,
                ))?;
                let parent = result.flatten();
                self.resolved.insert(parent_key, parent.clone());
                parent
            }
        };
        partial.parent = parent;
        Ok(())
    }

    fn process_dependency_management(
        &mut self,
        task: &Arc<ResolutionTask>,
        partial: &mut PartialModel,
    ) -> PomResult<()> {
        let mut managed_dependencies = Vec::new();

        for dep in task
            .raw
            .active_dependency_management(&self.options.active_profiles)
        {
            if dep.version.is_none() {
                self.guard::<()>(Err(PomError::Parse {
                    message: format!(
                        "Problem with dependencyManagement section of {}: unable to determine version of managed dependency {}:{}",
                        task.raw.coordinate_label(),
                        dep.group_id,
                        dep.artifact_id
                    ),
                }
                .into()))?;
                continue;
            }

            let (group_id, artifact_id, version) = {
                // the section under construction is not consulted while
                // evaluating its own entries
                let ctx = PropertyContext {
                    raw: &task.raw,
                    active_properties: &partial.properties,
                    dependency_management: &[],
                    parent: partial.parent.as_ref(),
                };
                (
                    ctx.group_id(Some(&dep.group_id)),
                    ctx.artifact_id(Some(&dep.artifact_id)),
                    ctx.version(dep.version.as_deref()),
                )
            };
            let (Some(group_id), Some(artifact_id), Some(version)) =
                (group_id, artifact_id, version)
            else {
                self.guard::<()>(Err(PomError::Parse {
                    message: format!(
                        "Problem with dependencyManagement section of {}: unable to determine groupId, artifactId, or version of managed dependency {}:{}",
                        task.raw.coordinate_label(),
                        dep.group_id,
                        dep.artifact_id
                    ),
                }
                .into()))?;
                continue;
            };

            if dep.type_.as_deref() == Some("pom") && dep.scope.as_deref() == Some("import") {
                let imported = (|| -> PomResult<Option<ManagedDependency>> {
                    let Some(bom) = self.downloader.download_pom(
                        &group_id,
                        &artifact_id,
                        &version,
                        None,
                        None,
                        Some(&task.raw),
                        &partial.repositories,
                    )?
                    else {
                        return Ok(None);
                    };
                    let mut nested =
                        Resolver::nested(self.downloader.clone(), self.options.clone(), true);
                    let resolved = nested.resolve_with(
                        Arc::new(bom),
                        Scope::Compile,
                        dep.version.clone(),
                        partial.repositories.clone(),
                        Vec::new(),
                    )?;
                    Ok(resolved.map(|pom| ManagedDependency::Imported {
                        group_id: group_id.clone(),
                        artifact_id: artifact_id.clone(),
                        version: version.clone(),
                        requested_version: dep.version.clone().unwrap_or_default(),
                        pom,
                    }))
                })();
                if let Some(Some(imported)) = self.guard(imported)? {
                    managed_dependencies.push(imported);
                }
            } else {
                managed_dependencies.push(ManagedDependency::Defined {
                    group_id,
                    artifact_id,
                    version,
                    requested_version: dep.version.clone().unwrap_or_default(),
                    scope: dep.scope.as_deref().map(|s| Scope::from_name(Some(s))),
                    classifier: dep.classifier.clone(),
                    exclusions: dep
                        .exclusions
                        .iter()
                        .map(|e| GroupArtifact::new(&e.group_id, &e.artifact_id))
                        .collect(),
                });
            }
        }

        partial.dependency_management = managed_dependencies;
        Ok(())
    }

    fn process_licenses(&self, task: &ResolutionTask, partial: &mut PartialModel) {
        partial.licenses = task
            .raw
            .licenses
            .iter()
            .map(|license| License::from_name(license.name.as_deref()))
            .collect();
    }

    fn process_dependencies(
        &mut self,
        task: &Arc<ResolutionTask>,
        partial: &mut PartialModel,
    ) -> PomResult<()> {
        // Parent dependencies become part of the subtree rooted here, so
        // they participate in conflict resolution further down the tree.
        if let Some(parent) = partial.parent.clone() {
            for dependency in &parent.dependencies {
                let coordinate = dependency.group_artifact();
                let request = self.version_selection.select(
                    Some(dependency.scope),
                    &coordinate,
                    dependency.version(),
                );
                self.version_selection
                    .insert(dependency.scope, coordinate, request);
            }
        }

        let mut dependency_tasks = Vec::new();
        {
            let ctx = PropertyContext {
                raw: &task.raw,
                active_properties: &partial.properties,
                dependency_management: &partial.dependency_management,
                parent: partial.parent.as_ref(),
            };

            for dep in task.raw.active_dependencies(&self.options.active_profiles) {
                // test-jars and other packagings are not resolved
                if !matches!(dep.type_.as_deref(), None | Some("jar")) {
                    continue;
                }
                if dep.optional && !self.options.resolve_optional {
                    continue;
                }

                let group_id = ctx.group_id(Some(&dep.group_id));
                let artifact_id = ctx.artifact_id(Some(&dep.artifact_id));
                let (group_id, artifact_id) = match (group_id, artifact_id) {
                    (Some(g), Some(a)) => (g, a),
                    _ => {
                        self.guard::<()>(Err(PomError::Parse {
                            message: format!(
                                "Problem resolving dependency of {}: unable to determine groupId or artifactId of {}:{}",
                                task.raw.coordinate_label(),
                                dep.group_id,
                                dep.artifact_id
                            ),
                        }
                        .into()))?;
                        continue;
                    }
                };

                // path-accumulated exclusions match the literal declared strings
                if exclusion::excluded_by_any(&task.exclusions, &dep.group_id, &dep.artifact_id) {
                    continue;
                }

                // Up to three passes so a managed version that indirects
                // through a property stabilizes before it is used.
                let mut version: Option<String> = None;
                for _ in 0..3 {
                    let last = version.clone();
                    let mut next = last.as_deref().and_then(|l| ctx.version(Some(l)));
                    if next.is_none() {
                        next = partial
                            .dependency_management
                            .iter()
                            .flat_map(|m| m.entries())
                            .find(|entry| {
                                ctx.group_id(Some(entry.group_id)).as_deref()
                                    == Some(group_id.as_str())
                                    && ctx.artifact_id(Some(entry.artifact_id)).as_deref()
                                        == Some(artifact_id.as_str())
                            })
                            .map(|entry| entry.version.to_string());
                    }
                    if next.is_none() {
                        next = partial
                            .parent
                            .as_ref()
                            .and_then(|p| p.managed_version(&group_id, &artifact_id))
                            .map(str::to_string);
                    }
                    version = next;
                    if version == last {
                        break;
                    }
                }
                // dependencyManagement takes precedence over the declared version
                if version.is_none() {
                    version = dep.version.as_deref().and_then(|v| ctx.version(Some(v)));
                }
                let Some(version) = version else {
                    self.guard::<()>(Err(PomError::Parse {
                        message: format!(
                            "Failed to determine version for {group_id}:{artifact_id}. Initial value was {:?}. Including POM is at {}",
                            dep.version,
                            task.raw.source_label()
                        ),
                    }
                    .into()))?;
                    continue;
                };

                let requested_scope = Scope::from_name(ctx.scope(dep.scope.as_deref()).as_deref());
                // a pruned dependency never pins versions for siblings
                let Some(effective_scope) = requested_scope.transitive_of(task.scope) else {
                    continue;
                };

                let coordinate = GroupArtifact::new(&group_id, &artifact_id);
                let request =
                    self.version_selection
                        .select(Some(effective_scope), &coordinate, &version);
                self.version_selection
                    .insert(effective_scope, coordinate.clone(), request.clone());

                let version = match self.guard(
                    request.resolve(self.downloader.as_ref(), &partial.repositories),
                )? {
                    Some(version) => version,
                    None => continue,
                };
                if version.contains("${") {
                    self.guard::<()>(Err(PomError::Parse {
                        message: format!(
                            "Unresolved property in version {version} of {coordinate}. Including POM is at {}",
                            task.raw.source_label()
                        ),
                    }
                    .into()))?;
                    continue;
                }

                let downloaded = match self.guard(self.downloader.download_pom(
                    &group_id,
                    &artifact_id,
                    &version,
                    dep.classifier.as_deref(),
                    None,
                    Some(&task.raw),
                    &partial.repositories,
                ))? {
                    Some(Some(pom)) => pom,
                    Some(None) => {
                        self.guard::<()>(Err(PomError::Parse {
                            message: format!(
                                "Unable to download {group_id}:{artifact_id}:{version}. Including POM is at {}",
                                task.raw.source_label()
                            ),
                        }
                        .into()))?;
                        continue;
                    }
                    None => continue,
                };

                let mut exclusions = task.exclusions.clone();
                exclusions.extend(
                    dep.exclusions
                        .iter()
                        .map(|e| GroupArtifact::new(&e.group_id, &e.artifact_id)),
                );

                // the child keeps the requested scope so its own subtree
                // applies transitive rules starting from it
                let child = Arc::new(ResolutionTask {
                    scope: requested_scope,
                    raw: Arc::new(downloaded),
                    exclusions,
                    optional: dep.optional,
                    classifier: dep.classifier.clone(),
                    requested_version: dep.version.clone(),
                    repositories: partial.repositories.clone(),
                    seen_parents: Vec::new(),
                });

                if !self.partial_results.contains_key(child.as_ref()) {
                    self.work_queue.push_back(child.clone());
                }
                dependency_tasks.push(child);
            }
        }
        partial.dependency_tasks = dependency_tasks;
        Ok(())
    }

    fn assemble(
        &mut self,
        task: &Arc<ResolutionTask>,
        stack: &mut Vec<Arc<ResolutionTask>>,
    ) -> PomResult<Option<Arc<ResolvedPom>>> {
        if stack.contains(task) {
            return Ok(None); // cut assembly cycles
        }

        let key = PartialTreeKey::of(&task.raw);
        if let Some(memo) = self.resolved.get(&key) {
            return Ok(memo.clone());
        }

        stack.push(task.clone());
        let result = self.assemble_parts(task, stack);
        stack.pop();

        let result = result?;
        self.resolved.insert(key, result.clone());
        Ok(result)
    }

    fn assemble_parts(
        &mut self,
        task: &Arc<ResolutionTask>,
        stack: &mut Vec<Arc<ResolutionTask>>,
    ) -> PomResult<Option<Arc<ResolvedPom>>> {
        let Some(partial) = self.partial_results.get(task.as_ref()).cloned() else {
            // never processed: remembered as not resolvable
            return Ok(None);
        };

        let mut dependencies = Vec::new();
        for dep_task in &partial.dependency_tasks {
            let optional = dep_task.optional || stack.iter().any(|t| t.optional);
            let Some(resolved) = self.assemble(dep_task, stack)? else {
                continue;
            };
            if !self.for_parent {
                debug!(
                    "{:indent$}{}{}",
                    "",
                    resolved.gav(),
                    if optional { " (optional)" } else { "" },
                    indent = stack.len().saturating_sub(1)
                );
            }
            dependencies.push(ResolvedDependency {
                scope: dep_task.scope,
                classifier: dep_task.classifier.clone(),
                optional,
                pom: resolved,
                requested_version: dep_task.requested_version.clone(),
                exclusions: dep_task.exclusions.iter().cloned().collect(),
            });
        }

        // Splice in dependencies inherited from the parent chain, each under
        // the version conflict resolution picked for this subtree. A losing
        // declaration is replaced when the winning POM assembles, and kept
        // as declared otherwise.
        let mut ancestor = partial.parent.clone();
        while let Some(current) = ancestor {
            for ancestor_dep in &current.dependencies {
                let scope = ancestor_dep.scope;
                let coordinate = ancestor_dep.group_artifact();
                let declared = ancestor_dep.version().to_string();

                let request = self
                    .version_selection
                    .select(Some(scope), &coordinate, &declared);
                let conflict_resolved = match self.guard(
                    request.resolve(self.downloader.as_ref(), &task.repositories),
                )? {
                    Some(version) => version,
                    None => {
                        dependencies.push(ancestor_dep.clone());
                        continue;
                    }
                };

                if conflict_resolved == declared {
                    dependencies.push(ancestor_dep.clone());
                    continue;
                }

                let downloaded = self.guard(self.downloader.download_pom(
                    &coordinate.group_id,
                    &coordinate.artifact_id,
                    &conflict_resolved,
                    ancestor_dep.classifier.as_deref(),
                    None,
                    None,
                    &task.repositories,
                ))?;
                let replacement = match downloaded {
                    Some(Some(raw)) => {
                        let conflict_task = Arc::new(ResolutionTask {
                            scope,
                            raw: Arc::new(raw),
                            exclusions: ancestor_dep.exclusions.iter().cloned().collect(),
                            optional: ancestor_dep.optional,
                            classifier: ancestor_dep.classifier.clone(),
                            requested_version: ancestor_dep.requested_version.clone(),
                            repositories: task.repositories.clone(),
                            seen_parents: Vec::new(),
                        });
                        self.assemble(&conflict_task, stack)?
                    }
                    _ => None,
                };
                match replacement {
                    Some(pom) => dependencies.push(ResolvedDependency {
                        scope,
                        classifier: ancestor_dep.classifier.clone(),
                        optional: ancestor_dep.optional,
                        pom,
                        requested_version: ancestor_dep.requested_version.clone(),
                        exclusions: ancestor_dep.exclusions.clone(),
                    }),
                    None => dependencies.push(ancestor_dep.clone()),
                }
            }
            ancestor = current.parent.clone();
        }

        let Some(artifact_id) = task.raw.artifact_id.clone() else {
            self.guard::<()>(Err(PomError::Parse {
                message: format!("POM at {} declares no artifactId", task.raw.source_label()),
            }
            .into()))?;
            return Ok(None);
        };
        let group_id = task
            .raw
            .group_id
            .clone()
            .or_else(|| partial.parent.as_ref().map(|p| p.group_id.clone()));
        let Some(group_id) = group_id else {
            self.guard::<()>(Err(PomError::Parse {
                message: format!(
                    "Unable to determine groupId of {artifact_id}; POM is at {}",
                    task.raw.source_label()
                ),
            }
            .into()))?;
            return Ok(None);
        };
        let version = task
            .raw
            .version
            .clone()
            .or_else(|| partial.parent.as_ref().map(|p| p.version.clone()));
        let Some(version) = version else {
            self.guard::<()>(Err(PomError::Parse {
                message: format!(
                    "Unable to determine version of {group_id}:{artifact_id}; POM is at {}",
                    task.raw.source_label()
                ),
            }
            .into()))?;
            return Ok(None);
        };

        let mut repositories = Vec::new();
        for repo in &partial.repositories {
            if let Some(repository) = self.guard(finalize_repository(repo))? {
                repositories.push(repository);
            }
        }

        Ok(Some(Arc::new(ResolvedPom {
            source: partial.source.clone(),
            group_id,
            artifact_id,
            version,
            snapshot_version: task.raw.snapshot_version.clone(),
            parent: partial.parent.clone(),
            dependencies,
            dependency_management: partial.dependency_management.clone(),
            licenses: partial.licenses.clone(),
            repositories,
            properties: partial.properties.clone(),
        })))
    }
}

fn finalize_repository(raw: &RawRepository) -> PomResult<Repository> {
    let url = Url::parse(&raw.url).map_err(|e| PomError::Parse {
        message: format!("Malformed repository URL '{}': {e}", raw.url),
    })?;
    Ok(Repository {
        url,
        releases: raw.releases_enabled(),
        snapshots: raw.snapshots_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomsolve_fetch::memory::MemoryDownloader;

    #[test]
    fn guard_rethrows_as_parse_error() {
        let resolver = Resolver::new(
            Arc::new(MemoryDownloader::new()),
            ResolveOptions::default(),
        );
        let err = resolver
            .guard::<()>(Err(PomError::Network {
                message: "boom".to_string(),
            }
            .into()))
            .unwrap_err();
        assert!(err.to_string().starts_with("POM parse error:"));
    }

    #[test]
    fn guard_swallows_and_reports_when_continuing() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let resolver = Resolver::new(
            Arc::new(MemoryDownloader::new()),
            ResolveOptions {
                continue_on_error: true,
                on_error: Some(Arc::new(move |err| {
                    sink.lock().unwrap().push(err.to_string());
                })),
                ..Default::default()
            },
        );
        let outcome = resolver
            .guard::<()>(Err(PomError::Network {
                message: "boom".to_string(),
            }
            .into()))
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn task_identity_ignores_repositories_and_sightings() {
        let raw = Arc::new(RawPom {
            group_id: Some("org.example".to_string()),
            artifact_id: Some("lib".to_string()),
            version: Some("1.0".to_string()),
            ..Default::default()
        });
        let task = |repositories: Vec<RawRepository>, seen_parents: Vec<Gav>| ResolutionTask {
            scope: Scope::Compile,
            raw: raw.clone(),
            exclusions: BTreeSet::new(),
            optional: false,
            classifier: None,
            requested_version: Some("1.0".to_string()),
            repositories,
            seen_parents,
        };
        assert_eq!(
            task(Vec::new(), Vec::new()),
            task(
                vec![super_pom_repository()],
                vec![Gav::new("org.example", "parent", "1.0")],
            )
        );
    }
}
