//! Support Traversal.
//!
//! Walks edges → support paths → their edges → ... with an explicit stack
//! and a visited set keyed by path id. A path is expanded at most once, so
//! self-referential or mutually-supporting paths terminate.

use crate::model::{Path, PathId};
use crate::store::GraphStore;
use ahash::AHashSet;
use std::collections::BTreeSet;

/// Result of one traversal.
#[derive(Debug, Clone, Default)]
pub struct SupportWalk {
    /// Every support path id reached, including initial paths reached again
    /// through support.
    pub support_ids: BTreeSet<PathId>,
    /// Initial paths followed by every support path that resolved, in the
    /// order they were expanded.
    pub order: Vec<PathId>,
}

/// Walk the support closure of `initial`.
///
/// Initial paths need not live in the store (compressed paths usually do
/// not); discovered support paths are resolved through it, and ids that do
/// not resolve are recorded but not expanded.
pub fn walk_support<'p>(
    store: &GraphStore,
    initial: impl IntoIterator<Item = &'p Path>,
) -> SupportWalk {
    let mut walk = SupportWalk::default();
    let mut visited: AHashSet<PathId> = AHashSet::new();
    let mut stack: Vec<PathId> = Vec::new();

    for path in initial {
        if visited.insert(path.id.clone()) {
            walk.order.push(path.id.clone());
            expand(store, path, &mut walk, &mut visited, &mut stack);
        }
    }

    while let Some(path_id) = stack.pop() {
        let Some(path) = store.get_path(&path_id) else {
            tracing::warn!(path_id = %path_id, "support path missing from result set; skipping");
            continue;
        };
        walk.order.push(path_id);
        expand(store, path, &mut walk, &mut visited, &mut stack);
    }
    walk
}

fn expand(
    store: &GraphStore,
    path: &Path,
    walk: &mut SupportWalk,
    visited: &mut AHashSet<PathId>,
    stack: &mut Vec<PathId>,
) {
    for edge in store.get_edges(path.all_edge_ids()) {
        for support_id in edge.support_ids() {
            walk.support_ids.insert(support_id.to_string());
            if visited.insert(support_id.to_string()) {
                stack.push(support_id.to_string());
            } else {
                tracing::trace!(path_id = %support_id, "support path already visited");
            }
        }
    }
}

/// All support path ids reachable from `initial`.
pub fn get_all_support_path_ids<'p>(
    store: &GraphStore,
    initial: impl IntoIterator<Item = &'p Path>,
) -> BTreeSet<PathId> {
    walk_support(store, initial).support_ids
}

/// Paths a set of top-level paths contributes once support is counted:
/// the top-level paths plus every distinct support path below them.
pub fn effective_path_count<'p>(
    store: &GraphStore,
    paths: impl IntoIterator<Item = &'p Path>,
) -> usize {
    walk_support(store, paths).order.len()
}
