//! Result Graph CLI
//!
//! Inspect a saved result payload the way the results page would show it:
//! - `results`: the ranked, filtered answer table
//! - `paths`: one answer's compressed paths with ranks and support trees
//! - `evidence`: one answer's publications and knowledge sources
//! - `graph`: one answer's render graph as JSON or Graphviz DOT

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use resultgraph_core::{
    render_dot, EngineConfig, Filter, GraphStore, Path, PathRank, ResultScore, ResultSet,
    ResultView, ScoreWeights, SortKey, UserSaves, ViewPipeline, ViewRequest,
};
use resultgraph_session::{ResultSession, Snapshot};
use std::path::{Path as FsPath, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resultgraph")]
#[command(author, version, about = "Rank, filter and inspect knowledge-graph answer sets")]
struct Cli {
    /// Engine config JSON (ranking weights, score weights, render options)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked answer table
    Results {
        /// Result payload JSON (`{status, data: {nodes, edges, paths, results}}`)
        payload: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        /// Sort key, e.g. `scoreHighLow`, `nameLowHigh`, `evidenceHighLow`
        #[arg(long, default_value = "scoreHighLow")]
        sort: String,
        /// Weight novelty over confidence and clinical evidence
        #[arg(long)]
        novelty_boost: bool,
        /// Mark a result as bookmarked (for `sv:bookmarked` filters)
        #[arg(long = "bookmark")]
        bookmarks: Vec<String>,
        /// Show at most this many results
        #[arg(long)]
        limit: Option<usize>,
        /// Print the full view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compressed paths of one answer, with ranks and support trees
    Paths {
        payload: PathBuf,
        result_id: String,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Publications and knowledge sources behind one answer
    Evidence { payload: PathBuf, result_id: String },

    /// Render graph of one answer
    Graph {
        payload: PathBuf,
        result_id: String,
        #[arg(long, value_enum, default_value_t = GraphFormat::Json)]
        format: GraphFormat,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Keep only matches of this tag id (repeatable)
    #[arg(long = "filter")]
    include: Vec<String>,
    /// Drop matches of this tag id (repeatable)
    #[arg(long)]
    exclude: Vec<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Vec<Filter> {
        self.include
            .iter()
            .map(|id| Filter::include(id))
            .chain(self.exclude.iter().map(|id| Filter::exclude(id)))
            .collect()
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphFormat {
    Json,
    Dot,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Results {
            payload,
            filters,
            sort,
            novelty_boost,
            bookmarks,
            limit,
            json,
        } => cmd_results(
            config,
            &payload,
            &filters,
            &sort,
            novelty_boost,
            &bookmarks,
            limit,
            json,
        ),
        Commands::Paths {
            payload,
            result_id,
            filters,
        } => cmd_paths(config, &payload, &result_id, &filters),
        Commands::Evidence { payload, result_id } => cmd_evidence(config, &payload, &result_id),
        Commands::Graph {
            payload,
            result_id,
            format,
        } => cmd_graph(config, &payload, &result_id, format),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_session(config: EngineConfig, payload: &FsPath) -> Result<ResultSession> {
    let snapshot = Snapshot::from_json_file(payload)
        .with_context(|| format!("loading result payload {}", payload.display()))?;
    tracing::debug!(
        payload = %payload.display(),
        snapshot = %snapshot.id,
        results = snapshot.set.results().len(),
        "loaded payload"
    );
    let session = ResultSession::new(config);
    session.offer(snapshot);
    Ok(session)
}

// ============================================================================
// Commands
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_results(
    config: EngineConfig,
    payload: &FsPath,
    filters: &FilterArgs,
    sort: &str,
    novelty_boost: bool,
    bookmarks: &[String],
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let sort: SortKey = sort.parse()?;
    let weights = if novelty_boost {
        ScoreWeights::novelty_boost()
    } else {
        config.weights
    };
    let saves = bookmarks
        .iter()
        .fold(UserSaves::default(), |saves, id| saves.bookmark(id));
    let request = ViewRequest::default()
        .with_filters(filters.to_filters())
        .with_sort(sort)
        .with_weights(weights)
        .with_user_saves(saves);

    let session = load_session(config, payload)?;
    let view = session.set_request(request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    print_table(&view, limit.unwrap_or(view.results.len()));
    Ok(())
}

fn print_table(view: &ResultView, limit: usize) {
    println!(
        "{} {} shown, {} hidden ({}, sorted by {})",
        "results".green().bold(),
        view.results.len(),
        view.hidden,
        view.status.as_str(),
        view.sort.to_string().bold()
    );
    println!(
        "{:>4}  {:<32} {:>8} {:>9} {:>6}",
        "#", "name", "score", "evidence", "paths"
    );
    for (i, ranked) in view.page(0, limit).iter().enumerate() {
        let result = &ranked.result;
        println!(
            "{:>4}  {:<32} {:>8} {:>9} {:>6}",
            i + 1,
            result.drug_name.bold(),
            format_score(result.score),
            result.evidence_count,
            result.path_count
        );
    }
}

fn format_score(score: Option<ResultScore>) -> String {
    match score {
        Some(ResultScore::Weighted(score)) => format!("{:.3}", score.main),
        Some(ResultScore::Plain(value)) => format!("{value:.3}"),
        None => "-".to_string(),
    }
}

fn cmd_paths(config: EngineConfig, payload: &FsPath, result_id: &str, filters: &FilterArgs) -> Result<()> {
    let set = ResultSet::from_json_file(payload)
        .with_context(|| format!("loading result payload {}", payload.display()))?;
    let result = set
        .result(result_id)
        .ok_or_else(|| anyhow!("unknown result `{result_id}`"))?;

    let request = ViewRequest::default()
        .with_weights(config.weights)
        .with_filters(filters.to_filters());
    let pipeline = ViewPipeline::new(config);
    let ranked = pipeline.rank_result(set.store(), result, &request);

    println!(
        "{} {} ({}): {} paths, {} kept",
        "paths".green().bold(),
        result.drug_name.bold(),
        result.id,
        ranked.paths.len(),
        ranked.path_filter_state.kept_count()
    );
    for rank in &ranked.ranks {
        print_rank(set.store(), rank, 1);
    }
    Ok(())
}

fn print_rank(store: &GraphStore, rank: &PathRank, depth: usize) {
    let marker = if rank.is_excluded() {
        "excluded".red()
    } else {
        "kept".green()
    };
    let via = rank
        .via_edge
        .as_deref()
        .map(|edge| format!(" via {edge}"))
        .unwrap_or_default();
    println!(
        "{}{:<8} {:>9.1}  {}{}  {}",
        "  ".repeat(depth),
        marker,
        rank.rank,
        rank.path_id(),
        via.dimmed(),
        describe_path(store, &rank.path)
    );
    for child in &rank.support {
        print_rank(store, child, depth + 1);
    }
}

/// `Aspirin -[affects]-> PTGS2 -[causes|contributes_to]-> Pain`
fn describe_path(store: &GraphStore, path: &Path) -> String {
    let mut out = String::new();
    for (slot, node) in path.node_ids().enumerate() {
        if slot > 0 {
            let predicates: Vec<&str> = path
                .slot_edges(slot - 1)
                .into_iter()
                .map(|id| store.get_edge(id).map(|e| e.predicate.as_str()).unwrap_or(id))
                .collect();
            out.push_str(&format!(" -[{}]-> ", predicates.join("|")));
        }
        out.push_str(store.node_name(node));
    }
    out
}

fn cmd_evidence(config: EngineConfig, payload: &FsPath, result_id: &str) -> Result<()> {
    let session = load_session(config, payload)?;
    let bundle = session
        .evidence(result_id)?
        .ok_or_else(|| anyhow!("unknown result `{result_id}`"))?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

fn cmd_graph(config: EngineConfig, payload: &FsPath, result_id: &str, format: GraphFormat) -> Result<()> {
    let session = load_session(config, payload)?;
    let graph = session
        .render(result_id)?
        .ok_or_else(|| anyhow!("unknown result `{result_id}`"))?;
    match format {
        GraphFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
        GraphFormat::Dot => print!("{}", render_dot(&graph)),
    }
    Ok(())
}
