//! Path Compressor.
//!
//! Paths that visit the same node sequence with the same direct/inferred
//! shape are one answer shape; they only differ in which edge instances fill
//! each slot. Compression folds them into the first path seen for the shape:
//!
//! ```text
//!   p1: n1 -e1-> n2          (e1 direct)
//!   p2: n1 -e2-> n2          (e2 direct)
//!   ---------------------------------------
//!   p1: n1 -{e1,e2}-> n2     compressedIDs = {p1, p2}
//! ```

use crate::model::{CompressedSlot, NodeId, Path, PathId, PathRef};
use crate::rank::PathFilterState;
use crate::store::GraphStore;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Signatures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureToken {
    Node(NodeId),
    Direct,
    Indirect,
}

/// Node ids as-is, each edge replaced by its directness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSignature(Vec<SignatureToken>);

impl PathSignature {
    pub fn tokens(&self) -> &[SignatureToken] {
        &self.0
    }
}

impl fmt::Display for PathSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match token {
                SignatureToken::Node(id) => f.write_str(id)?,
                SignatureToken::Direct => f.write_str("direct")?,
                SignatureToken::Indirect => f.write_str("indirect")?,
            }
        }
        Ok(())
    }
}

/// Signature of `path`. The base edge of each slot decides its directness;
/// an edge missing from the store counts as direct.
pub fn path_signature(path: &Path, store: &GraphStore) -> PathSignature {
    let tokens = path
        .subgraph
        .iter()
        .enumerate()
        .map(|(i, id)| {
            if i % 2 == 0 {
                return SignatureToken::Node(id.clone());
            }
            match store.edge_is_inferred(id) {
                Some(true) => SignatureToken::Indirect,
                Some(false) => SignatureToken::Direct,
                None => {
                    tracing::warn!(path_id = %path.id, edge_id = %id, "edge missing while signing path");
                    SignatureToken::Direct
                }
            }
        })
        .collect();
    PathSignature(tokens)
}

// ============================================================================
// Compressor
// ============================================================================

pub struct PathCompressor<'a> {
    store: &'a GraphStore,
}

impl<'a> PathCompressor<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Compress a result's path references.
    ///
    /// References that do not resolve are skipped with a warning; the rest
    /// are still compressed.
    pub fn compress(&self, refs: &[PathRef]) -> Vec<Path> {
        let paths = refs.iter().filter_map(|r| match self.store.resolve_path(r) {
            Some(path) => Some(path.clone()),
            None => {
                tracing::warn!(path_id = %r.id(), "path missing from result set; skipping");
                None
            }
        });
        self.compress_paths(paths)
    }

    /// Compress owned paths. Input order decides which path becomes the base.
    pub fn compress_paths(&self, paths: impl IntoIterator<Item = Path>) -> Vec<Path> {
        let mut out: Vec<Path> = Vec::new();
        let mut by_signature: AHashMap<PathSignature, usize> = AHashMap::new();
        let mut seen: AHashSet<PathId> = AHashSet::new();

        for path in paths {
            if !seen.insert(path.id.clone()) {
                tracing::debug!(path_id = %path.id, "path listed twice; ignoring repeat");
                continue;
            }
            let signature = path_signature(&path, self.store);
            match by_signature.get(&signature) {
                Some(&index) => merge_into(&mut out[index], &path),
                None => {
                    by_signature.insert(signature, out.len());
                    out.push(path);
                }
            }
        }
        out
    }
}

fn materialize(subgraph: &[String]) -> Vec<CompressedSlot> {
    subgraph
        .iter()
        .enumerate()
        .map(|(i, id)| {
            if i % 2 == 0 {
                CompressedSlot::Node(id.clone())
            } else {
                CompressedSlot::Edges(vec![id.clone()])
            }
        })
        .collect()
}

/// Fold `incoming` into `base`. Tags from `incoming` win on conflict.
fn merge_into(base: &mut Path, incoming: &Path) {
    let slots = base
        .compressed_subgraph
        .get_or_insert_with(|| materialize(&base.subgraph));
    for slot in 0..incoming.edge_slot_count() {
        let Some(CompressedSlot::Edges(edges)) = slots.get_mut(slot * 2 + 1) else {
            continue;
        };
        for edge_id in incoming.slot_edges(slot) {
            if !edges.iter().any(|e| e == edge_id) {
                edges.push(edge_id.to_string());
            }
        }
    }

    for (tag_id, tag) in &incoming.tags {
        base.tags.insert(tag_id.clone(), tag.clone());
    }
    base.aras.extend(incoming.aras.iter().cloned());
    base.compressed_ids
        .get_or_insert_with(|| BTreeSet::from([base.id.clone()]))
        .extend(incoming.member_ids());
    base.highlighted |= incoming.highlighted;
}

// ============================================================================
// Ordering
// ============================================================================

/// Kept paths first; with a selection, highlighted paths next. Stable.
///
/// A path is highlighted when any of the original paths it stands for is in
/// `selection`.
pub fn order_paths(
    paths: &mut [Path],
    filter_state: &PathFilterState,
    selection: Option<&BTreeSet<PathId>>,
) {
    if let Some(selection) = selection {
        for path in paths.iter_mut() {
            path.highlighted |= path.member_ids().iter().any(|id| selection.contains(id));
        }
    }
    let use_highlight = selection.is_some();
    paths.sort_by_key(|p| (!filter_state.is_kept(&p.id), use_highlight && !p.highlighted));
}

/// Purely direct paths before paths with any inferred edge. Stable.
pub fn sort_direct_first(paths: &mut [Path], store: &GraphStore) {
    paths.sort_by_cached_key(|p| store.path_has_inferred_edge(p));
}
