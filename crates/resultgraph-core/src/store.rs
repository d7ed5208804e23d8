//! Graph Store: indexed, read-only lookups over one result-set snapshot.
//!
//! A [`ResultSet`] owns one [`GraphStore`] plus the list of results. The store
//! exposes no mutation API after construction; ranking, compression and
//! rendering build fresh owned values from it.
//!
//! Inline paths found in the payload (in `results[].paths` and in
//! `edges[].support`) are lifted into the path arena on load, so every later
//! traversal only ever follows ids.

use crate::error::{EngineError, EngineResult};
use crate::model::{
    Edge, EdgeId, Node, NodeId, Path, PathId, PathRef, ResultRecord, Status,
};
use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path as FsPath;

// ============================================================================
// Graph Store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: AHashMap<NodeId, Node>,
    edges: AHashMap<EdgeId, Edge>,
    paths: AHashMap<PathId, Path>,
}

impl GraphStore {
    /// Build a store from loose parts.
    ///
    /// Inline support paths on edges are lifted into the path arena. Paths
    /// with an invalid subgraph are dropped with a warning.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
        paths: impl IntoIterator<Item = Path>,
    ) -> Self {
        let mut store = Self::default();
        for node in nodes {
            store.nodes.insert(node.id.clone(), node);
        }
        for path in paths {
            store.register_path(path);
        }
        for mut edge in edges {
            edge.support = std::mem::take(&mut edge.support)
                .into_iter()
                .map(|r| store.lift(r))
                .collect();
            store.edges.insert(edge.id.clone(), edge);
        }
        store
    }

    /// Register `path` unless its id is already taken or its shape is invalid.
    fn register_path(&mut self, path: Path) {
        if let Err(err) = path.validate() {
            tracing::warn!(path_id = %path.id, error = %err, "dropping malformed path");
            return;
        }
        if self.paths.contains_key(&path.id) {
            tracing::debug!(path_id = %path.id, "duplicate path id; keeping first");
            return;
        }
        self.paths.insert(path.id.clone(), path);
    }

    /// Replace an inline reference by an id reference, registering the path.
    fn lift(&mut self, path_ref: PathRef) -> PathRef {
        match path_ref {
            PathRef::Id(id) => PathRef::Id(id),
            PathRef::Inline(path) => {
                let id = path.id.clone();
                self.register_path(*path);
                PathRef::Id(id)
            }
        }
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Resolve several edge ids, skipping (and logging) the ones that are missing.
    pub fn get_edges<I, S>(&self, ids: I) -> Vec<&Edge>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for id in ids {
            let id = id.as_ref();
            match self.edges.get(id) {
                Some(edge) => out.push(edge),
                None => tracing::warn!(edge_id = %id, "edge missing from result set; skipping"),
            }
        }
        out
    }

    pub fn get_path(&self, id: &str) -> Option<&Path> {
        self.paths.get(id)
    }

    /// Resolve a reference: inline paths resolve to themselves.
    pub fn resolve_path<'a>(&'a self, path_ref: &'a PathRef) -> Option<&'a Path> {
        match path_ref {
            PathRef::Id(id) => self.paths.get(id),
            PathRef::Inline(path) => Some(path),
        }
    }

    /// Display name of a node, falling back to its id when unknown.
    pub fn node_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.nodes.get(id).map(Node::display_name).unwrap_or(id)
    }

    /// `Some(true)` for an edge with support, `None` for an unknown edge.
    pub fn edge_is_inferred(&self, id: &str) -> Option<bool> {
        self.edges.get(id).map(Edge::is_inferred)
    }

    /// Whether any edge of `path` (in any slot) is inferred.
    pub fn path_has_inferred_edge(&self, path: &Path) -> bool {
        path.all_edge_ids()
            .into_iter()
            .any(|id| self.edge_is_inferred(id).unwrap_or(false))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}

// ============================================================================
// Result Set (one snapshot)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    status: Status,
    #[serde(default)]
    data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    edges: BTreeMap<EdgeId, Edge>,
    #[serde(default)]
    paths: BTreeMap<PathId, Path>,
    #[serde(default)]
    results: Option<Vec<ResultRecord>>,
}

/// Ids may be omitted inside the id-keyed maps; the key is authoritative then.
fn keyed<T>(map: BTreeMap<String, T>, id_of: impl Fn(&mut T) -> &mut String) -> Vec<T> {
    map.into_iter()
        .map(|(key, mut item)| {
            let id = id_of(&mut item);
            if id.is_empty() {
                *id = key;
            }
            item
        })
        .collect()
}

/// One query's result snapshot. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    store: GraphStore,
    results: Vec<ResultRecord>,
    status: Status,
}

impl ResultSet {
    pub fn from_parts(store: GraphStore, results: Vec<ResultRecord>, status: Status) -> Self {
        let mut set = Self {
            store,
            results: Vec::with_capacity(results.len()),
            status,
        };
        for mut result in results {
            result.paths = std::mem::take(&mut result.paths)
                .into_iter()
                .map(|r| set.store.lift(r))
                .collect();
            set.results.push(result);
        }
        set
    }

    /// Parse a backend payload (`{status, data: {nodes, edges, paths, results}}`).
    ///
    /// A payload with `status: "error"` or without `data.results` yields
    /// [`EngineError::NoUsableResults`].
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let raw: RawPayload = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_json_slice(bytes: &[u8]) -> EngineResult<Self> {
        let raw: RawPayload = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    pub fn from_json_file(path: impl AsRef<FsPath>) -> EngineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    fn from_raw(raw: RawPayload) -> EngineResult<Self> {
        let no_results = || EngineError::NoUsableResults {
            status: raw.status.as_str().to_string(),
        };
        if raw.status == Status::Error {
            return Err(no_results());
        }
        let Some(data) = raw.data else {
            return Err(no_results());
        };
        let Some(results) = data.results else {
            return Err(no_results());
        };

        let store = GraphStore::from_parts(
            keyed(data.nodes, |n| &mut n.id),
            keyed(data.edges, |e| &mut e.id),
            keyed(data.paths, |p| &mut p.id),
        );
        tracing::debug!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            paths = store.path_count(),
            results = results.len(),
            status = raw.status.as_str(),
            "loaded result set"
        );
        Ok(Self::from_parts(store, results, raw.status))
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn result(&self, id: &str) -> Option<&ResultRecord> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }
}
