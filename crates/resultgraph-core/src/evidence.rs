//! Evidence Aggregator.
//!
//! Collects the publications, knowledge sources and clinical trials backing a
//! result. Edges are gathered from the result's (compressed) paths and from
//! every support path below them, so inferred relationships contribute the
//! evidence of the chains that justify them.
//!
//! A publication cited by several edges is one [`PublicationRecord`] that
//! lists every citing edge; an (edge, publication) pair is only counted once
//! even when compression put the same edge into several slots.

use crate::model::{Edge, EdgeId, Path};
use crate::support::walk_support;
use crate::store::GraphStore;
use ahash::AHashSet;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

// ============================================================================
// Publication Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
    Pubmed,
    PubmedCentral,
    ClinicalTrial,
    Other,
}

struct Patterns {
    pmid: Regex,
    pmc: Regex,
    nct: Regex,
    doi: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        pmid: compile(r"(?i)^PMID:\s*(\d+)$"),
        pmc: compile(r"(?i)^PMC:?\s*(?:PMC)?(\d+)$"),
        nct: compile(r"(?i)^(?:clinicaltrials:)?(NCT\d+)$"),
        doi: compile(r"(?i)^doi:\s*(\S+)$"),
    })
}

fn compile(pattern: &str) -> Regex {
    // Patterns are literals above; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid publication pattern {pattern}: {err}"))
}

/// Kind of a publication id and its canonical URL, when one can be derived.
pub fn classify_publication(id: &str) -> (PublicationKind, Option<String>) {
    let id = id.trim();
    let p = patterns();
    if let Some(caps) = p.pmid.captures(id) {
        return (
            PublicationKind::Pubmed,
            Some(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", &caps[1])),
        );
    }
    if let Some(caps) = p.pmc.captures(id) {
        return (
            PublicationKind::PubmedCentral,
            Some(format!("https://pmc.ncbi.nlm.nih.gov/articles/PMC{}/", &caps[1])),
        );
    }
    if let Some(caps) = p.nct.captures(id) {
        let trial = caps[1].to_uppercase();
        return (
            PublicationKind::ClinicalTrial,
            Some(format!("https://clinicaltrials.gov/study/{trial}")),
        );
    }
    if id.starts_with("http://") || id.starts_with("https://") {
        return (PublicationKind::Other, Some(id.to_string()));
    }
    if let Some(caps) = p.doi.captures(id) {
        return (
            PublicationKind::Other,
            Some(format!("https://doi.org/{}", &caps[1])),
        );
    }
    (PublicationKind::Other, None)
}

// ============================================================================
// Evidence Bundle
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationRecord {
    pub id: String,
    pub kind: PublicationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Edges citing this publication.
    pub edges: BTreeSet<EdgeId>,
    /// Knowledge-source keys the citations were filed under.
    #[serde(rename = "knowledgeSources")]
    pub knowledge_sources: BTreeSet<String>,
}

/// One knowledge source asserting one edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourceRecord {
    pub name: String,
    pub edge: EdgeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub publications: Vec<PublicationRecord>,
    pub sources: Vec<SourceRecord>,
    #[serde(rename = "distinctSources")]
    pub distinct_sources: BTreeSet<String>,
}

impl EvidenceBundle {
    /// Distinct publication ids.
    pub fn publication_count(&self) -> usize {
        self.publications.len()
    }

    pub fn count_by_kind(&self) -> BTreeMap<PublicationKind, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.publications {
            *counts.entry(record.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn publications_of(&self, kind: PublicationKind) -> impl Iterator<Item = &PublicationRecord> {
        self.publications.iter().filter(move |p| p.kind == kind)
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[derive(Default)]
struct Accumulator {
    publications: Vec<PublicationRecord>,
    by_id: BTreeMap<String, usize>,
    seen_pairs: AHashSet<(EdgeId, String)>,
    seen_sources: AHashSet<(EdgeId, String)>,
    sources: Vec<SourceRecord>,
    distinct_sources: BTreeSet<String>,
    seen_edges: AHashSet<EdgeId>,
}

impl Accumulator {
    fn add_edge(&mut self, edge: &Edge) {
        if !self.seen_edges.insert(edge.id.clone()) {
            return;
        }
        for source in edge.provenance.iter().chain(edge.publications.keys()) {
            self.add_source(edge, source);
        }
        for (source, ids) in &edge.publications {
            for id in ids {
                self.add_publication(edge, source, id);
            }
        }
        for trial in &edge.trials {
            self.add_publication(edge, "clinical_trials", trial);
        }
    }

    fn add_source(&mut self, edge: &Edge, name: &str) {
        if name.is_empty() {
            return;
        }
        if self.seen_sources.insert((edge.id.clone(), name.to_string())) {
            self.sources.push(SourceRecord {
                name: name.to_string(),
                edge: edge.id.clone(),
            });
            self.distinct_sources.insert(name.to_string());
        }
    }

    fn add_publication(&mut self, edge: &Edge, source: &str, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        if !self.seen_pairs.insert((edge.id.clone(), id.to_string())) {
            tracing::trace!(edge_id = %edge.id, publication = %id, "duplicate citation");
            return;
        }
        let index = match self.by_id.get(id) {
            Some(&index) => index,
            None => {
                let (kind, url) = classify_publication(id);
                self.publications.push(PublicationRecord {
                    id: id.to_string(),
                    kind,
                    url,
                    edges: BTreeSet::new(),
                    knowledge_sources: BTreeSet::new(),
                });
                self.by_id.insert(id.to_string(), self.publications.len() - 1);
                self.publications.len() - 1
            }
        };
        let record = &mut self.publications[index];
        record.edges.insert(edge.id.clone());
        record.knowledge_sources.insert(source.to_string());
    }

    fn finish(self) -> EvidenceBundle {
        EvidenceBundle {
            publications: self.publications,
            sources: self.sources,
            distinct_sources: self.distinct_sources,
        }
    }
}

pub struct EvidenceAggregator<'a> {
    store: &'a GraphStore,
}

impl<'a> EvidenceAggregator<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Evidence for `paths` and every support path reachable from them.
    pub fn aggregate(&self, paths: &[Path]) -> EvidenceBundle {
        let mut acc = Accumulator::default();
        for path in paths {
            self.add_path(&mut acc, path);
        }
        let walk = walk_support(self.store, paths);
        for support_id in &walk.support_ids {
            if let Some(path) = self.store.get_path(support_id) {
                self.add_path(&mut acc, path);
            }
        }
        let bundle = acc.finish();
        tracing::debug!(
            paths = paths.len(),
            support_paths = walk.support_ids.len(),
            publications = bundle.publication_count(),
            sources = bundle.distinct_sources.len(),
            "aggregated evidence"
        );
        bundle
    }

    fn add_path(&self, acc: &mut Accumulator, path: &Path) {
        for edge in self.store.get_edges(path.all_edge_ids()) {
            acc.add_edge(edge);
        }
    }
}

/// Convenience wrapper around [`EvidenceAggregator::aggregate`].
pub fn aggregate_evidence(store: &GraphStore, paths: &[Path]) -> EvidenceBundle {
    EvidenceAggregator::new(store).aggregate(paths)
}
