//! Result Graph Engine
//!
//! Turns one knowledge-graph answer snapshot (nodes, edges, and paths whose
//! inferred edges are justified by further *support* paths) into a ranked,
//! filtered, deduplicated and scored list of answers.
//!
//! Components, leaf first:
//! 1. **Graph Store** (`store`): id-keyed arena over one snapshot
//! 2. **Path Compressor** (`compress`): folds paths sharing a node/directness signature
//! 3. **Support Traversal** (`support`): cycle-safe walk of the support closure
//! 4. **Path Ranking Engine** (`rank`): filter-driven signed ranks, recursively through support trees
//! 5. **Evidence Aggregator** (`evidence`): publications and sources per result
//! 6. **Scoring & Sort** (`score`, `sort`): weighted scores and column comparators
//! 7. **Graph Renderer Transform** (`render`): flat node/edge graph for layout
//!
//! [`ViewPipeline`] strings them together for a whole snapshot.
//!
//! ## Data flow
//!
//! ```text
//!   payload JSON ──► ResultSet (GraphStore + results)
//!                        │
//!                        ▼  per result
//!        compress ─► rank ─► order paths ─► rescore ─► counts
//!                        │
//!                        ▼
//!        result-level filters ─► sort ─► ResultView
//!
//!   on demand: evidence_for(result) / render_for(result)
//! ```
//!
//! Nothing in the engine mutates a loaded snapshot; every derived structure
//! is a fresh owned value and every operation is a function of
//! `(ResultSet, filters, sort key, weights, user saves)`.

pub mod compress;
pub mod config;
pub mod error;
pub mod evidence;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod score;
pub mod sort;
pub mod store;
pub mod support;

pub use compress::{order_paths, path_signature, sort_direct_first, PathCompressor, PathSignature};
pub use config::{EngineConfig, RankingPolicy, RenderOptions, ScoreWeights};
pub use error::{EngineError, EngineResult};
pub use evidence::{
    aggregate_evidence, classify_publication, EvidenceAggregator, EvidenceBundle, PublicationKind,
    PublicationRecord, SourceRecord,
};
pub use filter::{family, Filter, FilterFamily, PartitionedFilters, UserSaves};
pub use model::{
    CompressedSlot, Edge, EdgeId, Node, NodeId, Path, PathId, PathRef, ResultId, ResultRecord,
    ResultScore, Score, ScoreComponents, Status, Tag, TagMap,
};
pub use pipeline::{annotate_counts, RankedResult, ResultView, ViewPipeline, ViewRequest};
pub use rank::{
    make_path_rank, rank_paths, sort_path_ranks, update_path_ranks, PathFilterState, PathRank,
    PathRanker,
};
pub use render::{build_render_graph, render_dot, NodeRole, RenderEdge, RenderGraph, RenderNode};
pub use score::{generate_score, rescore, rescore_results};
pub use sort::{
    compare, compare_numbers_with_fallback, compare_pathfinder_names, compare_with_fallback,
    detect_mode, sort_results, SortColumn, SortDirection, SortKey, SortMode, Sortable,
};
pub use store::{GraphStore, ResultSet};
pub use support::{effective_path_count, get_all_support_path_ids, walk_support, SupportWalk};
