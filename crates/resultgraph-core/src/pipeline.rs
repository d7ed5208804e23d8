//! The view pipeline: one snapshot plus UI state in, one sorted view out.
//!
//! ```text
//!   ResultSet ─┬─ per result: compress → rank → order paths → rescore → counts
//!              └─ result-level filters → sort → ResultView
//! ```
//!
//! [`ViewPipeline::run`] is a pure function of its inputs. Every filter, sort
//! or weight change re-runs it from scratch; nothing is patched in place.

use crate::compress::{order_paths, sort_direct_first, PathCompressor};
use crate::config::{EngineConfig, ScoreWeights};
use crate::error::{EngineError, EngineResult};
use crate::evidence::{aggregate_evidence, EvidenceBundle};
use crate::filter::{Filter, FilterFamily, PartitionedFilters, UserSaves};
use crate::model::{Path, PathId, ResultRecord, ResultScore, Status};
use crate::rank::{rank_paths, PathFilterState, PathRank};
use crate::render::{build_render_graph, RenderGraph};
use crate::score::rescore;
use crate::sort::{detect_mode, sort_results, SortKey, SortMode, Sortable};
use crate::store::{GraphStore, ResultSet};
use crate::support::effective_path_count;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Inputs and Outputs
// ============================================================================

/// UI state a view is computed for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    pub filters: Vec<Filter>,
    pub sort: SortKey,
    pub weights: ScoreWeights,
    pub user_saves: UserSaves,
    /// Selected original path ids; `None` disables highlighting.
    pub selection: Option<BTreeSet<PathId>>,
}

impl ViewRequest {
    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_user_saves(mut self, saves: UserSaves) -> Self {
        self.user_saves = saves;
        self
    }

    pub fn with_selection(mut self, selection: impl IntoIterator<Item = PathId>) -> Self {
        self.selection = Some(selection.into_iter().collect());
        self
    }
}

/// One result after ranking, with its working path set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// The result with `score`, `evidenceCount` and `pathCount` recomputed.
    pub result: ResultRecord,
    /// Compressed paths, kept first.
    pub paths: Vec<Path>,
    /// Rank trees, sorted by rank.
    pub ranks: Vec<PathRank>,
    #[serde(rename = "pathFilterState")]
    pub path_filter_state: PathFilterState,
}

impl RankedResult {
    pub fn id(&self) -> &str {
        &self.result.id
    }

    pub fn kept_paths(&self) -> impl Iterator<Item = &Path> {
        self.paths
            .iter()
            .filter(|p| self.path_filter_state.is_kept(&p.id))
    }

    pub fn has_kept_path(&self) -> bool {
        self.kept_paths().next().is_some()
    }

    pub fn rank_of(&self, path_id: &str) -> Option<f64> {
        self.ranks
            .iter()
            .find(|r| r.path_id() == path_id)
            .map(|r| r.rank)
    }
}

impl Sortable for RankedResult {
    fn sort_name(&self) -> Option<&str> {
        self.result.sort_name()
    }

    fn sort_evidence(&self) -> usize {
        self.result.evidence_count
    }

    fn sort_paths(&self) -> usize {
        self.result.path_count
    }

    fn sort_score(&self) -> Option<ResultScore> {
        self.result.score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// Kept results in display order.
    pub results: Vec<RankedResult>,
    /// Results removed by the active filters.
    pub hidden: usize,
    pub status: Status,
    pub sort: SortKey,
    pub mode: SortMode,
}

impl ResultView {
    pub fn total(&self) -> usize {
        self.results.len() + self.hidden
    }

    pub fn get(&self, result_id: &str) -> Option<&RankedResult> {
        self.results.iter().find(|r| r.id() == result_id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.results.iter().map(RankedResult::id).collect()
    }

    /// One display page; an out-of-range page is empty.
    pub fn page(&self, page: usize, per_page: usize) -> &[RankedResult] {
        let start = page.saturating_mul(per_page).min(self.results.len());
        let end = start.saturating_add(per_page).min(self.results.len());
        &self.results[start..end]
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ViewPipeline {
    config: EngineConfig,
}

impl ViewPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self, set: &ResultSet, request: &ViewRequest) -> EngineResult<ResultView> {
        if set.status() == Status::Error {
            return Err(EngineError::NoUsableResults {
                status: set.status().as_str().to_string(),
            });
        }

        let partitioned = PartitionedFilters::new(&request.filters);
        let mut kept = Vec::with_capacity(set.results().len());
        let mut hidden = 0usize;
        for result in set.results() {
            let ranked = self.rank_result(set.store(), result, request);
            // Without path-level filters there is nothing a pathless result could fail.
            let paths_pass = ranked.has_kept_path()
                || (ranked.paths.is_empty() && !partitioned.has_path_level());
            if paths_pass
                && passes_result_filters(&ranked.result, &partitioned.result_level, &request.user_saves)
            {
                kept.push(ranked);
            } else {
                hidden += 1;
            }
        }

        let mode = detect_mode(kept.iter());
        sort_results(&mut kept, request.sort, mode);
        tracing::debug!(
            kept = kept.len(),
            hidden,
            filters = request.filters.len(),
            sort = %request.sort,
            "computed result view"
        );
        Ok(ResultView {
            results: kept,
            hidden,
            status: set.status(),
            sort: request.sort,
            mode,
        })
    }

    /// Compress, rank and re-count a single result.
    pub fn rank_result(&self, store: &GraphStore, result: &ResultRecord, request: &ViewRequest) -> RankedResult {
        let mut paths = PathCompressor::new(store).compress(&result.paths);
        sort_direct_first(&mut paths, store);

        let ranks = rank_paths(store, &self.config.ranking, &request.filters, &paths);
        let path_filter_state = PathFilterState::from_ranks(&ranks);
        order_paths(&mut paths, &path_filter_state, request.selection.as_ref());

        let mut record = result.clone();
        rescore(&mut record, &request.weights);
        let kept: Vec<Path> = paths
            .iter()
            .filter(|p| path_filter_state.is_kept(&p.id))
            .cloned()
            .collect();
        record.evidence_count = aggregate_evidence(store, &kept).publication_count();
        record.path_count = effective_path_count(store, &kept);

        RankedResult {
            result: record,
            paths,
            ranks,
            path_filter_state,
        }
    }

    /// Evidence bundle for every compressed path of a result, ignoring filters.
    pub fn evidence_for(&self, set: &ResultSet, result_id: &str) -> Option<EvidenceBundle> {
        let result = set.result(result_id)?;
        let paths = PathCompressor::new(set.store()).compress(&result.paths);
        Some(aggregate_evidence(set.store(), &paths))
    }

    /// Render graph for every path reachable from a result.
    pub fn render_for(&self, set: &ResultSet, result_id: &str) -> Option<RenderGraph> {
        let result = set.result(result_id)?;
        let paths = PathCompressor::new(set.store()).compress(&result.paths);
        Some(build_render_graph(set.store(), &paths, &self.config.render))
    }
}

fn passes_result_filters(result: &ResultRecord, filters: &[&Filter], saves: &UserSaves) -> bool {
    filters.iter().all(|filter| {
        let matched = match filter.family() {
            FilterFamily::UserSave => saves.matches(filter, &result.id),
            _ => filter.matches_text(&result.drug_name),
        };
        matched != filter.negated
    })
}

/// Copies of every result with `evidenceCount` and `pathCount` filled in as
/// they are with no filters active.
pub fn annotate_counts(set: &ResultSet) -> Vec<ResultRecord> {
    let store = set.store();
    set.results()
        .iter()
        .map(|result| {
            let mut record = result.clone();
            let paths = PathCompressor::new(store).compress(&result.paths);
            record.evidence_count = aggregate_evidence(store, &paths).publication_count();
            record.path_count = effective_path_count(store, &paths);
            record
        })
        .collect()
}
