//! Graph view over a resolved POM, for tree rendering and path queries.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use pomsolve_model::resolved::ResolvedPom;
use pomsolve_model::scope::Scope;

/// A node in the graph projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphNode {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl GraphNode {
    /// `group:artifact` identifier (without version).
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Edge label: the scope and optionality of the dependency declaration.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub scope: Scope,
    pub optional: bool,
}

/// A dependency graph projected from a [`ResolvedPom`], keyed by
/// `group:artifact`.
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    pub fn from_pom(pom: &ResolvedPom) -> Self {
        let mut graph = DependencyGraph {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: NodeIndex::end(),
        };
        graph.root = graph.add_node(GraphNode {
            group_id: pom.group_id.clone(),
            artifact_id: pom.artifact_id.clone(),
            version: pom.version.clone(),
        });
        graph.add_subtree(graph.root, pom);
        graph
    }

    fn add_subtree(&mut self, from: NodeIndex, pom: &ResolvedPom) {
        for dependency in &pom.dependencies {
            let node = GraphNode {
                group_id: dependency.group_id().to_string(),
                artifact_id: dependency.artifact_id().to_string(),
                version: dependency.version().to_string(),
            };
            let known = self.index.contains_key(&node.key());
            let to = self.add_node(node);
            self.add_edge(
                from,
                to,
                GraphEdge {
                    scope: dependency.scope,
                    optional: dependency.optional,
                },
            );
            if !known {
                self.add_subtree(to, &dependency.pom);
            }
        }
    }

    fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: GraphEdge) {
        if from != to && !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Look up a node by `group:artifact`, or by bare artifact name.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        if let Some(&idx) = self.index.get(key) {
            return Some(idx);
        }
        self.index
            .iter()
            .find(|(full, _)| full.split(':').nth(1) == Some(key))
            .map(|(_, &idx)| idx)
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &GraphEdge)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the tree, grouping the root's dependencies by scope.
    pub fn print_tree(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", self.graph[self.root]));

        let mut by_scope: Vec<(Scope, Vec<(NodeIndex, &GraphEdge)>)> = Vec::new();
        for (idx, edge) in self.dependencies_of(self.root) {
            match by_scope.iter_mut().find(|(s, _)| *s == edge.scope) {
                Some((_, list)) => list.push((idx, edge)),
                None => by_scope.push((edge.scope, vec![(idx, edge)])),
            }
        }
        by_scope.sort_by_key(|(scope, _)| *scope);
        let show_headers = by_scope.len() > 1;

        let mut visited = HashSet::new();
        visited.insert(self.root);

        let sections = by_scope.len();
        for (section, (scope, deps)) in by_scope.into_iter().enumerate() {
            if show_headers {
                output.push_str(&format!("[{scope}]\n"));
            }
            let last_section = section == sections - 1;
            let count = deps.len();
            for (i, (idx, _)) in deps.into_iter().enumerate() {
                let is_last = i == count - 1 && last_section;
                self.print_subtree(&mut output, idx, "", is_last, &mut visited);
            }
        }
        output
    }

    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, _)) in deps.into_iter().enumerate() {
            self.print_subtree(output, child, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }

    /// The path from the root to a dependency, or `None` when unreachable.
    pub fn find_path(&self, key: &str) -> Option<Vec<&GraphNode>> {
        let target = self.find(key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        self.dfs_path(self.root, target, &mut path, &mut visited)
            .then(|| path.iter().map(|&idx| &self.graph[idx]).collect())
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}
