//! Path Ranking Engine.
//!
//! Each path (and, recursively, every support path under its inferred
//! edges) gets a signed rank for the active filters:
//!
//! - `rank > 0`: excluded. Exclusions are `heavy_weight` (plus any filter
//!   `excludeWeight`), which dominates every inclusion bonus.
//! - `rank <= 0`: kept; more negative sorts first.
//!
//! A pass over a rank tree works bottom to top:
//!
//! ```text
//!   top-level path
//!     ├─ negated path-tag filter matches?        → exclude, stop
//!     ├─ per edge slot
//!     │    ├─ inferred: rank every support path;
//!     │    │      all excluded        → slot excludes
//!     │    │      some preferred (<0) → slot prefers
//!     │    │      otherwise           → neutral
//!     │    └─ direct: negated evidence match → exclude
//!     │               evidence match         → include
//!     ├─ any slot excludes                        → exclude
//!     ├─ all slots neutral, positive evidence on  → exclude
//!     └─ path-tag inclusion: OR within a family, AND across families
//! ```
//!
//! Support paths run the same edge logic but skip both path-tag steps.
//! Every pass recomputes from scratch; nothing carries over between passes.

use crate::config::RankingPolicy;
use crate::filter::{Filter, PartitionedFilters};
use crate::model::{Edge, EdgeId, Path, PathId};
use crate::store::GraphStore;
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Rank Trees
// ============================================================================

/// A path's rank plus the ranks of the support paths under its edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRank {
    pub rank: f64,
    pub path: Path,
    /// Inferred edge this support path hangs off; `None` at the top level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_edge: Option<EdgeId>,
    pub support: Vec<PathRank>,
}

impl PathRank {
    pub fn is_excluded(&self) -> bool {
        self.rank > 0.0
    }

    pub fn path_id(&self) -> &str {
        &self.path.id
    }

    fn leaf(path: Path, via_edge: Option<EdgeId>) -> Self {
        Self {
            rank: 0.0,
            path,
            via_edge,
            support: Vec::new(),
        }
    }
}

/// Build the rank tree for `path`, all ranks zero.
///
/// A support path already on the current branch is not descended into again,
/// and branches stop at `policy.max_support_depth`. A support path shared by
/// several parents is expanded under the first one only; later occurrences
/// are leaves.
pub fn make_path_rank(store: &GraphStore, policy: &RankingPolicy, path: &Path) -> PathRank {
    let mut branch = vec![path.id.clone()];
    let mut expanded: AHashSet<PathId> = AHashSet::new();
    expanded.insert(path.id.clone());
    build_rank(store, policy, path.clone(), None, &mut branch, &mut expanded)
}

fn build_rank(
    store: &GraphStore,
    policy: &RankingPolicy,
    path: Path,
    via_edge: Option<EdgeId>,
    branch: &mut Vec<PathId>,
    expanded: &mut AHashSet<PathId>,
) -> PathRank {
    let mut support = Vec::new();
    if branch.len() > policy.max_support_depth {
        tracing::warn!(path_id = %path.id, depth = branch.len(), "support tree too deep; truncating");
    } else {
        for edge in store.get_edges(path.all_edge_ids()) {
            for support_ref in &edge.support {
                let support_id = support_ref.id();
                if branch.iter().any(|id| id == support_id) {
                    tracing::debug!(path_id = %support_id, edge_id = %edge.id, "support cycle; not descending");
                    continue;
                }
                let Some(support_path) = store.resolve_path(support_ref) else {
                    tracing::warn!(path_id = %support_id, edge_id = %edge.id, "support path missing; skipping");
                    continue;
                };
                let via = Some(edge.id.clone());
                if !expanded.insert(support_id.to_string()) {
                    support.push(PathRank::leaf(support_path.clone(), via));
                    continue;
                }
                branch.push(support_id.to_string());
                let child = build_rank(store, policy, support_path.clone(), via, branch, expanded);
                branch.pop();
                support.push(child);
            }
        }
    }
    PathRank {
        rank: 0.0,
        path,
        via_edge,
        support,
    }
}

/// Sort by rank ascending, each node's support list first. Stable.
pub fn sort_path_ranks(ranks: &mut [PathRank]) {
    for rank in ranks.iter_mut() {
        sort_path_ranks(&mut rank.support);
    }
    ranks.sort_by(|a, b| a.rank.total_cmp(&b.rank));
}

// ============================================================================
// Filter State
// ============================================================================

/// Per top-level path: `true` when the path is kept by the current filters.
/// Paths never ranked count as kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathFilterState(BTreeMap<PathId, bool>);

impl PathFilterState {
    pub fn from_ranks(ranks: &[PathRank]) -> Self {
        Self(
            ranks
                .iter()
                .map(|r| (r.path.id.clone(), !r.is_excluded()))
                .collect(),
        )
    }

    pub fn is_kept(&self, path_id: &str) -> bool {
        self.0.get(path_id).copied().unwrap_or(true)
    }

    pub fn set(&mut self, path_id: &str, kept: bool) {
        self.0.insert(path_id.to_string(), kept);
    }

    pub fn kept_count(&self) -> usize {
        self.0.values().filter(|kept| **kept).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, kept)| (id.as_str(), *kept))
    }
}

// ============================================================================
// Ranking Pass
// ============================================================================

/// Contribution of one edge slot.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SlotSignal {
    Exclude,
    Prefer(f64),
    Neutral,
}

/// Support path ranks computed so far in one pass.
type SupportRanks = AHashMap<PathId, f64>;

pub struct PathRanker<'a> {
    store: &'a GraphStore,
    policy: &'a RankingPolicy,
    filters: PartitionedFilters<'a>,
}

impl<'a> PathRanker<'a> {
    pub fn new(store: &'a GraphStore, policy: &'a RankingPolicy, filters: &'a [Filter]) -> Self {
        Self {
            store,
            policy,
            filters: PartitionedFilters::new(filters),
        }
    }

    /// Rank every top-level tree in `ranks`.
    ///
    /// Ranks come from the store, not from the tree shape: each support path
    /// is ranked once per pass and the result reused wherever it appears.
    pub fn update_path_ranks(&self, ranks: &mut [PathRank]) {
        let mut memo = SupportRanks::new();
        for rank in ranks.iter_mut() {
            let mut branch = vec![rank.path.id.clone()];
            rank.rank = self.path_rank(&rank.path, false, &mut memo, &mut branch);
            self.fill_support(&mut rank.support, &mut memo, &mut branch);
        }
    }

    fn fill_support(&self, support: &mut [PathRank], memo: &mut SupportRanks, branch: &mut Vec<PathId>) {
        for child in support.iter_mut() {
            child.rank = self.support_rank(&child.path, memo, branch);
            branch.push(child.path.id.clone());
            self.fill_support(&mut child.support, memo, branch);
            branch.pop();
        }
    }

    fn support_rank(&self, path: &Path, memo: &mut SupportRanks, branch: &mut Vec<PathId>) -> f64 {
        if let Some(rank) = memo.get(&path.id) {
            return *rank;
        }
        branch.push(path.id.clone());
        let rank = self.path_rank(path, true, memo, branch);
        branch.pop();
        memo.insert(path.id.clone(), rank);
        rank
    }

    fn path_rank(
        &self,
        path: &Path,
        is_support: bool,
        memo: &mut SupportRanks,
        branch: &mut Vec<PathId>,
    ) -> f64 {
        if !is_support {
            let negated = self
                .filters
                .other
                .iter()
                .copied()
                .find(|f| f.negated && f.matches_tags(&path.tags));
            if let Some(filter) = negated {
                return self.policy.exclusion_rank(Some(filter));
            }
        }

        let mut all_neutral = true;
        let mut total = 0.0;
        for slot in 0..path.edge_slot_count() {
            match self.rank_slot(path, slot, memo, branch) {
                SlotSignal::Exclude => return self.policy.exclusion_rank(None),
                SlotSignal::Prefer(weight) => {
                    all_neutral = false;
                    total += weight;
                }
                SlotSignal::Neutral => {}
            }
        }

        if all_neutral && self.filters.has_positive_evidence() {
            return self.policy.exclusion_rank(None);
        }
        if is_support {
            return total;
        }
        self.apply_inclusion(path, total)
    }

    /// Path-tag inclusion: OR inside a group, AND across groups.
    fn apply_inclusion(&self, path: &Path, rank: f64) -> f64 {
        let groups = self.filters.positive_other_groups();
        let mut matched = 0usize;
        for filters in groups.values() {
            let hits = filters
                .iter()
                .filter(|f| f.matches_tags(&path.tags))
                .count();
            if hits == 0 {
                return self.policy.exclusion_rank(None);
            }
            matched += hits;
        }
        rank - self.policy.light_weight * matched as f64
    }

    fn rank_slot(
        &self,
        path: &Path,
        slot: usize,
        memo: &mut SupportRanks,
        branch: &mut Vec<PathId>,
    ) -> SlotSignal {
        let edges = self.store.get_edges(path.slot_edges(slot));
        if edges.is_empty() {
            return SlotSignal::Neutral;
        }

        let inferred: Vec<&Edge> = edges.iter().copied().filter(|e| e.is_inferred()).collect();
        if !inferred.is_empty() {
            return self.rank_inferred_slot(&inferred, memo, branch);
        }

        // Direct slot: the most permissive member edge decides.
        let mut best = SlotSignal::Exclude;
        for edge in &edges {
            let signal = self.edge_signal(edge);
            match signal {
                SlotSignal::Prefer(_) => return signal,
                SlotSignal::Neutral => best = SlotSignal::Neutral,
                SlotSignal::Exclude => {}
            }
        }
        best
    }

    /// Same cut-offs as [`make_path_rank`]: no support below the depth
    /// limit, none that is already on the branch.
    fn rank_inferred_slot(
        &self,
        inferred: &[&Edge],
        memo: &mut SupportRanks,
        branch: &mut Vec<PathId>,
    ) -> SlotSignal {
        if branch.len() > self.policy.max_support_depth {
            return SlotSignal::Neutral;
        }

        let mut total = 0usize;
        let mut survived = 0usize;
        let mut preferred = 0usize;
        for edge in inferred {
            for support_ref in &edge.support {
                let support_id = support_ref.id();
                if branch.iter().any(|id| id == support_id) {
                    continue;
                }
                let Some(support_path) = self.store.resolve_path(support_ref) else {
                    continue;
                };
                let rank = self.support_rank(support_path, memo, branch);
                total += 1;
                if rank <= 0.0 {
                    survived += 1;
                    if rank < 0.0 {
                        preferred += 1;
                    }
                }
            }
        }

        if total == 0 {
            return SlotSignal::Neutral;
        }
        if survived == 0 {
            return SlotSignal::Exclude;
        }
        if preferred > 0 {
            let share = preferred as f64 / total as f64;
            return SlotSignal::Prefer(-self.policy.heavy_weight * share);
        }
        SlotSignal::Neutral
    }

    /// Evidence signal of a direct edge. Negated matches win over inclusions.
    fn edge_signal(&self, edge: &Edge) -> SlotSignal {
        let evidence = &self.filters.evidence;
        if evidence.iter().any(|f| f.negated && f.matches_edge(edge)) {
            return SlotSignal::Exclude;
        }
        if evidence.iter().any(|f| !f.negated && f.matches_edge(edge)) {
            return SlotSignal::Prefer(-self.policy.light_weight);
        }
        SlotSignal::Neutral
    }
}

/// Rank every tree in `ranks` against `filters`.
pub fn update_path_ranks(
    store: &GraphStore,
    policy: &RankingPolicy,
    filters: &[Filter],
    ranks: &mut [PathRank],
) {
    PathRanker::new(store, policy, filters).update_path_ranks(ranks);
}

/// Build, rank and sort rank trees for a list of (usually compressed) paths.
pub fn rank_paths(
    store: &GraphStore,
    policy: &RankingPolicy,
    filters: &[Filter],
    paths: &[Path],
) -> Vec<PathRank> {
    let mut ranks: Vec<PathRank> = paths
        .iter()
        .map(|p| make_path_rank(store, policy, p))
        .collect();
    update_path_ranks(store, policy, filters, &mut ranks);
    sort_path_ranks(&mut ranks);
    ranks
}
