//! Graph Renderer Transform.
//!
//! Flattens every path reachable from a result (top-level paths plus the
//! support closure) into one `{nodes, edges}` graph for layout. Each edge is
//! back-linked onto its endpoints so renderers can style leaves and hubs
//! without another pass.
//!
//! Output formats:
//! - JSON (serde) for custom frontends
//! - Graphviz DOT via [`render_dot`]

use crate::config::RenderOptions;
use crate::model::{EdgeId, NodeId, Path};
use crate::store::GraphStore;
use crate::support::walk_support;
use ahash::{AHashMap, AHashSet};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Leaf,
    Intermediate,
    Hub,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub in_edges: Vec<EdgeId>,
    pub out_edges: Vec<EdgeId>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree: usize,
    pub role: NodeRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
    pub inferred: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn hubs(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Hub)
    }
}

/// Build the render graph for `paths` and everything supporting them.
///
/// Nodes and edges appear in first-seen order. An edge whose endpoint is not
/// in the store is dropped with a warning.
pub fn build_render_graph(store: &GraphStore, paths: &[Path], options: &RenderOptions) -> RenderGraph {
    let walk = walk_support(store, paths);
    let initial: AHashSet<&str> = paths.iter().map(|p| p.id.as_str()).collect();
    let reachable = paths.iter().chain(
        walk.order
            .iter()
            .filter(|id| !initial.contains(id.as_str()))
            .filter_map(|id| store.get_path(id)),
    );

    let mut graph = RenderGraph::default();
    let mut node_index: AHashMap<NodeId, usize> = AHashMap::new();
    let mut edge_seen: AHashSet<EdgeId> = AHashSet::new();

    for path in reachable {
        for node_id in path.node_ids() {
            add_node(store, &mut graph, &mut node_index, node_id);
        }
        for edge in store.get_edges(path.all_edge_ids()) {
            if edge_seen.contains(&edge.id) {
                continue;
            }
            if store.get_node(&edge.subject).is_none() && !node_index.contains_key(&edge.subject)
                || store.get_node(&edge.object).is_none() && !node_index.contains_key(&edge.object)
            {
                tracing::warn!(edge_id = %edge.id, "edge endpoint missing from result set; not rendering");
                continue;
            }
            edge_seen.insert(edge.id.clone());
            let source = add_node(store, &mut graph, &mut node_index, &edge.subject);
            let target = add_node(store, &mut graph, &mut node_index, &edge.object);
            graph.nodes[source].out_edges.push(edge.id.clone());
            graph.nodes[target].in_edges.push(edge.id.clone());
            graph.edges.push(RenderEdge {
                id: edge.id.clone(),
                source: edge.subject.clone(),
                target: edge.object.clone(),
                label: edge.predicate.clone(),
                inferred: edge.is_inferred(),
            });
        }
    }

    for node in &mut graph.nodes {
        node.in_degree = node.in_edges.len();
        node.out_degree = node.out_edges.len();
        node.degree = node.in_degree + node.out_degree;
        node.role = if node.degree <= 1 {
            NodeRole::Leaf
        } else if node.degree >= options.hub_degree {
            NodeRole::Hub
        } else {
            NodeRole::Intermediate
        };
    }

    tracing::debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "built render graph");
    graph
}

fn add_node(
    store: &GraphStore,
    graph: &mut RenderGraph,
    index: &mut AHashMap<NodeId, usize>,
    id: &str,
) -> usize {
    if let Some(&i) = index.get(id) {
        return i;
    }
    let node = store.get_node(id);
    if node.is_none() {
        tracing::warn!(node_id = %id, "node missing from result set; rendering bare id");
    }
    graph.nodes.push(RenderNode {
        id: id.to_string(),
        label: store.node_name(id).to_string(),
        category: node.and_then(|n| n.primary_type()).map(str::to_string),
        in_edges: Vec::new(),
        out_edges: Vec::new(),
        in_degree: 0,
        out_degree: 0,
        degree: 0,
        role: NodeRole::Leaf,
    });
    index.insert(id.to_string(), graph.nodes.len() - 1);
    graph.nodes.len() - 1
}

/// Graphviz DOT: hubs bold, inferred edges dashed.
pub fn render_dot(graph: &RenderGraph) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    let mut out = String::new();
    out.push_str("digraph result {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");
    out.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    for node in &graph.nodes {
        let style = match node.role {
            NodeRole::Hub => ", style=bold",
            NodeRole::Leaf => ", style=rounded",
            NodeRole::Intermediate => "",
        };
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\"{}];\n",
            dot_escape(&node.id),
            dot_escape(&node.label),
            style
        ));
    }
    out.push('\n');
    for edge in &graph.edges {
        let style = if edge.inferred { ", style=dashed" } else { "" };
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"{}];\n",
            dot_escape(&edge.source),
            dot_escape(&edge.target),
            dot_escape(&edge.label),
            style
        ));
    }
    out.push_str("}\n");
    out
}
