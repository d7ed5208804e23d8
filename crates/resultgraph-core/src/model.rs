//! Result-set data model.
//!
//! Everything here is plain owned data. Cross references (edge → node,
//! path → edge, edge → support path) are ids into the [`GraphStore`] arena,
//! never embedded owners, so cyclic support data is representable without
//! any reference cycles.
//!
//! [`GraphStore`]: crate::store::GraphStore

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type NodeId = String;
pub type EdgeId = String;
pub type PathId = String;
pub type ResultId = String;

// ============================================================================
// Tags
// ============================================================================

/// A facet annotation attached to a path, edge or result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tag id → tag.
pub type TagMap = BTreeMap<String, Tag>;

// ============================================================================
// Nodes and edges
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    /// First entry is the canonical display name.
    #[serde(default)]
    pub names: Vec<String>,
    /// First entry is the primary biolink category.
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub curies: BTreeSet<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub provenance: Option<String>,
}

impl Node {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            names: vec![name.to_string()],
            ..Self::default()
        }
    }

    pub fn with_type(mut self, category: &str) -> Self {
        self.types.push(category.to_string());
        self
    }

    /// Canonical display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.id)
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: EdgeId,
    pub subject: NodeId,
    pub object: NodeId,
    #[serde(default)]
    pub predicate: String,
    #[serde(default)]
    pub aras: BTreeSet<String>,
    #[serde(default)]
    pub provenance: Vec<String>,
    /// Knowledge-source key → publication ids.
    #[serde(default)]
    pub publications: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub tags: TagMap,
    /// Empty for a direct edge; the paths that justify an inferred edge otherwise.
    #[serde(default)]
    pub support: Vec<PathRef>,
    #[serde(default)]
    pub knowledge_level: Option<String>,
    #[serde(default)]
    pub trials: Vec<String>,
}

impl Edge {
    pub fn new(id: &str, subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            id: id.to_string(),
            subject: subject.to_string(),
            object: object.to_string(),
            predicate: predicate.to_string(),
            ..Self::default()
        }
    }

    /// An edge is inferred (indirect) exactly when it carries support paths.
    pub fn is_inferred(&self) -> bool {
        !self.support.is_empty()
    }

    pub fn support_ids(&self) -> impl Iterator<Item = &str> {
        self.support.iter().map(PathRef::id)
    }

    pub fn with_support(mut self, path_ids: &[&str]) -> Self {
        self.support
            .extend(path_ids.iter().map(|id| PathRef::Id(id.to_string())));
        self
    }

    pub fn with_tag(mut self, tag_id: &str, name: &str) -> Self {
        self.tags.insert(tag_id.to_string(), Tag::new(name, tag_id));
        self
    }

    pub fn with_publications(mut self, source: &str, ids: &[&str]) -> Self {
        self.publications
            .entry(source.to_string())
            .or_default()
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }
}

// ============================================================================
// Paths
// ============================================================================

/// A reference to a path: either an id into the store or an inline path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathRef {
    Id(PathId),
    Inline(Box<Path>),
}

impl PathRef {
    pub fn id(&self) -> &str {
        match self {
            PathRef::Id(id) => id,
            PathRef::Inline(path) => &path.id,
        }
    }
}

impl From<&str> for PathRef {
    fn from(id: &str) -> Self {
        PathRef::Id(id.to_string())
    }
}

impl From<Path> for PathRef {
    fn from(path: Path) -> Self {
        PathRef::Inline(Box::new(path))
    }
}

/// One position of a compressed subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressedSlot {
    Node(NodeId),
    /// Distinct edge ids filling this slot, in first-seen order.
    Edges(Vec<EdgeId>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub id: PathId,
    /// node, edge, node, ..., node
    pub subgraph: Vec<String>,
    #[serde(default)]
    pub tags: TagMap,
    #[serde(default)]
    pub aras: BTreeSet<String>,
    #[serde(
        default,
        rename = "compressedSubgraph",
        skip_serializing_if = "Option::is_none"
    )]
    pub compressed_subgraph: Option<Vec<CompressedSlot>>,
    #[serde(
        default,
        rename = "compressedIDs",
        skip_serializing_if = "Option::is_none"
    )]
    pub compressed_ids: Option<BTreeSet<PathId>>,
    /// Transient UI selection flag.
    #[serde(default)]
    pub highlighted: bool,
}

impl Path {
    pub fn new(id: &str, subgraph: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            subgraph: subgraph.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag_id: &str, name: &str) -> Self {
        self.tags.insert(tag_id.to_string(), Tag::new(name, tag_id));
        self
    }

    /// Subgraphs must alternate node/edge and start and end on a node.
    pub fn validate(&self) -> EngineResult<()> {
        let len = self.subgraph.len();
        if len % 2 == 0 {
            return Err(EngineError::InvalidSubgraph {
                path_id: self.id.clone(),
                len,
            });
        }
        if let Some(compressed) = &self.compressed_subgraph {
            if compressed.len() != len {
                return Err(EngineError::InvalidSubgraph {
                    path_id: self.id.clone(),
                    len: compressed.len(),
                });
            }
        }
        Ok(())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.subgraph.iter().step_by(2).map(String::as_str)
    }

    /// Number of edge positions in the subgraph.
    pub fn edge_slot_count(&self) -> usize {
        self.subgraph.len() / 2
    }

    /// Edge ids filling the `slot`-th edge position.
    ///
    /// After compression a slot can hold several edges; otherwise it holds the
    /// single subgraph entry.
    pub fn slot_edges(&self, slot: usize) -> Vec<&str> {
        let index = slot * 2 + 1;
        if let Some(CompressedSlot::Edges(edges)) = self
            .compressed_subgraph
            .as_ref()
            .and_then(|c| c.get(index))
        {
            return edges.iter().map(String::as_str).collect();
        }
        self.subgraph
            .get(index)
            .map(|id| vec![id.as_str()])
            .unwrap_or_default()
    }

    /// Every edge id across all slots, slot by slot.
    pub fn all_edge_ids(&self) -> Vec<&str> {
        (0..self.edge_slot_count())
            .flat_map(|slot| self.slot_edges(slot))
            .collect()
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed_subgraph.is_some()
    }

    /// Original path ids this path stands for.
    pub fn member_ids(&self) -> BTreeSet<PathId> {
        match &self.compressed_ids {
            Some(ids) => ids.clone(),
            None => BTreeSet::from([self.id.clone()]),
        }
    }
}

// ============================================================================
// Results and scores
// ============================================================================

/// Raw score vector supplied by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub novelty: f64,
    #[serde(default, alias = "clinical_evidence")]
    pub clinical: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub main: f64,
    pub secondary: f64,
}

/// Pathfinder results carry a bare number instead of `{main, secondary}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultScore {
    Weighted(Score),
    Plain(f64),
}

impl ResultScore {
    /// `(primary, secondary)` ordering key.
    pub fn sort_key(&self) -> (f64, f64) {
        match self {
            ResultScore::Weighted(score) => (score.main, score.secondary),
            ResultScore::Plain(value) => (*value, 0.0),
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, ResultScore::Plain(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    #[serde(default)]
    pub subject: NodeId,
    #[serde(default)]
    pub object: NodeId,
    #[serde(default)]
    pub drug_name: String,
    #[serde(default)]
    pub paths: Vec<PathRef>,
    #[serde(default)]
    pub scores: Option<ScoreComponents>,
    #[serde(default)]
    pub score: Option<ResultScore>,
    #[serde(default, rename = "evidenceCount")]
    pub evidence_count: usize,
    #[serde(default, rename = "pathCount")]
    pub path_count: usize,
    #[serde(default)]
    pub tags: TagMap,
}

impl ResultRecord {
    pub fn new(id: &str, drug_name: &str, paths: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            drug_name: drug_name.to_string(),
            paths: paths.iter().map(|p| PathRef::from(*p)).collect(),
            ..Self::default()
        }
    }
}

/// Lifecycle of the backend query that produced a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Complete,
    Error,
    /// Also what an unrecognized status string reads as.
    #[default]
    #[serde(other)]
    Running,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Complete => "complete",
            Status::Error => "error",
        }
    }
}
