//! Shared fixtures for resultgraph-core tests.
//!
//! ```text
//!   Aspirin ─e1/e2─► PTGS2 ─e3─► Pain        p1 (e1), p2 (e2): same shape
//!   Aspirin ───────e4 (inferred)───► Pain     p3, supported by sp1 = p1's chain
//!   Ibuprofen ─e5─► Pain                      p4
//! ```

#![allow(dead_code)]

use resultgraph_core::*;

pub fn nodes() -> Vec<Node> {
    vec![
        Node::new("drug", "Aspirin").with_type("biolink:SmallMolecule"),
        Node::new("gene", "PTGS2").with_type("biolink:Gene"),
        Node::new("disease", "Pain").with_type("biolink:Disease"),
        Node::new("drug2", "Ibuprofen").with_type("biolink:SmallMolecule"),
    ]
}

pub fn edges() -> Vec<Edge> {
    let mut e1 = Edge::new("e1", "drug", "biolink:affects", "gene")
        .with_tag("ev:pubs", "Publications")
        .with_publications("infores:ctd", &["PMID:1"]);
    e1.provenance = vec!["infores:ctd".to_string()];

    let e2 = Edge::new("e2", "drug", "biolink:affects", "gene")
        .with_publications("infores:semmeddb", &["PMID:1", "PMC:2"]);

    let mut e3 = Edge::new("e3", "gene", "biolink:gene_associated_with_condition", "disease");
    e3.trials = vec!["NCT0001".to_string()];
    e3.knowledge_level = Some("knowledge_assertion".to_string());

    let e4 = Edge::new("e4", "drug", "biolink:treats", "disease").with_support(&["sp1"]);
    let e5 = Edge::new("e5", "drug2", "biolink:treats", "disease");
    vec![e1, e2, e3, e4, e5]
}

pub fn paths() -> Vec<Path> {
    vec![
        Path::new("p1", &["drug", "e1", "gene", "e3", "disease"]).with_tag("fda:approved", "FDA approved"),
        Path::new("p2", &["drug", "e2", "gene", "e3", "disease"]).with_tag("ara:infores:aragorn", "ARAGORN"),
        Path::new("p3", &["drug", "e4", "disease"]).with_tag("ara:infores:arax", "ARAX"),
        Path::new("p4", &["drug2", "e5", "disease"]).with_tag("fda:approved", "FDA approved"),
        Path::new("sp1", &["drug", "e1", "gene", "e3", "disease"]),
    ]
}

pub fn results() -> Vec<ResultRecord> {
    let mut aspirin = ResultRecord::new("r1", "Aspirin", &["p1", "p2", "p3"]);
    aspirin.subject = "drug".to_string();
    aspirin.object = "disease".to_string();
    aspirin.scores = Some(ScoreComponents {
        confidence: 0.9,
        novelty: 0.1,
        clinical: 0.6,
    });

    let mut ibuprofen = ResultRecord::new("r2", "Ibuprofen", &["p4"]);
    ibuprofen.subject = "drug2".to_string();
    ibuprofen.object = "disease".to_string();
    ibuprofen.scores = Some(ScoreComponents {
        confidence: 0.5,
        novelty: 0.9,
        clinical: 0.2,
    });
    vec![aspirin, ibuprofen]
}

pub fn store() -> GraphStore {
    GraphStore::from_parts(nodes(), edges(), paths())
}

pub fn result_set() -> ResultSet {
    ResultSet::from_parts(store(), results(), Status::Complete)
}

/// Backend-shaped payload: ids omitted inside the maps, one inline support
/// path, one inline result path.
pub fn payload_json() -> String {
    r#"{
      "status": "complete",
      "data": {
        "nodes": {
          "drug": {"names": ["Aspirin"], "types": ["biolink:SmallMolecule"]},
          "disease": {"names": ["Pain"], "types": ["biolink:Disease"]},
          "gene": {"names": ["PTGS2"]}
        },
        "edges": {
          "e1": {"subject": "drug", "object": "gene", "predicate": "biolink:affects",
                 "publications": {"infores:ctd": ["PMID:1"]}},
          "e3": {"subject": "gene", "object": "disease", "predicate": "biolink:causes"},
          "e4": {"subject": "drug", "object": "disease", "predicate": "biolink:treats",
                 "support": [{"id": "sp1", "subgraph": ["drug", "e1", "gene", "e3", "disease"]}]}
        },
        "paths": {
          "p1": {"subgraph": ["drug", "e1", "gene", "e3", "disease"], "tags": {"fda:approved": {"name": "FDA", "value": "approved"}}},
          "bad": {"subgraph": ["drug", "e1"]}
        },
        "results": [
          {"id": "r1", "drug_name": "Aspirin", "subject": "drug", "object": "disease",
           "paths": ["p1", {"id": "p3", "subgraph": ["drug", "e4", "disease"]}],
           "scores": {"confidence": 0.8, "novelty": 0.2, "clinical_evidence": 0.4}}
        ]
      }
    }"#
    .to_string()
}

/// A store over nodes `a`, `b`, `c` with the given edges and paths.
pub fn small_store(edges: Vec<Edge>, paths: Vec<Path>) -> GraphStore {
    GraphStore::from_parts(
        vec![Node::new("a", "A"), Node::new("b", "B"), Node::new("c", "C")],
        edges,
        paths,
    )
}
