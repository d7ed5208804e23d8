use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn resultgraph_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_resultgraph"))
}

const PAYLOAD: &str = r#"{
  "status": "complete",
  "data": {
    "nodes": {
      "drug": {"names": ["Aspirin"], "types": ["biolink:SmallMolecule"]},
      "drug2": {"names": ["Ibuprofen"]},
      "gene": {"names": ["PTGS2"]},
      "disease": {"names": ["Pain"]}
    },
    "edges": {
      "e1": {"subject": "drug", "object": "gene", "predicate": "biolink:affects",
             "publications": {"infores:ctd": ["PMID:1"]}},
      "e3": {"subject": "gene", "object": "disease", "predicate": "biolink:causes"},
      "e4": {"subject": "drug", "object": "disease", "predicate": "biolink:treats", "support": ["sp1"]},
      "e5": {"subject": "drug2", "object": "disease", "predicate": "biolink:treats"}
    },
    "paths": {
      "p1": {"subgraph": ["drug", "e1", "gene", "e3", "disease"], "tags": {"fda:approved": {"name": "FDA"}}},
      "p3": {"subgraph": ["drug", "e4", "disease"]},
      "p4": {"subgraph": ["drug2", "e5", "disease"]},
      "sp1": {"subgraph": ["drug", "e1", "gene", "e3", "disease"]}
    },
    "results": [
      {"id": "r1", "drug_name": "Aspirin", "subject": "drug", "object": "disease", "paths": ["p1", "p3"],
       "scores": {"confidence": 0.9, "novelty": 0.1, "clinical": 0.6}},
      {"id": "r2", "drug_name": "Ibuprofen", "subject": "drug2", "object": "disease", "paths": ["p4"],
       "scores": {"confidence": 0.5, "novelty": 0.9, "clinical": 0.2}}
    ]
  }
}"#;

fn write_payload(dir: &Path) -> PathBuf {
    let path = dir.join("payload.json");
    fs::write(&path, PAYLOAD).expect("write payload");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(resultgraph_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run resultgraph")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn results_table_lists_every_answer() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let out = run(&["results", payload.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let text = stdout(&out);
    assert!(text.contains("2 shown, 0 hidden"));
    let aspirin = text.find("Aspirin").unwrap();
    let ibuprofen = text.find("Ibuprofen").unwrap();
    assert!(aspirin < ibuprofen);
}

#[test]
fn results_filters_and_novelty_boost() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let payload = payload.to_str().unwrap();

    let out = run(&["results", payload, "--exclude", "str:asp", "--json"]);
    assert!(out.status.success());
    let view = json(&out);
    assert_eq!(view["hidden"], 1);
    assert_eq!(view["results"][0]["result"]["id"], "r2");

    let out = run(&["results", payload, "--novelty-boost", "--json"]);
    assert_eq!(json(&out)["results"][0]["result"]["id"], "r2");

    let out = run(&["results", payload, "--bookmark", "r1", "--filter", "sv:bookmarked", "--json"]);
    let view = json(&out);
    assert_eq!(view["results"].as_array().unwrap().len(), 1);
    assert_eq!(view["results"][0]["result"]["id"], "r1");
}

#[test]
fn results_limit_truncates_table() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let out = run(&["results", payload.to_str().unwrap(), "--limit", "1"]);
    let text = stdout(&out);
    assert!(text.contains("Aspirin"));
    assert!(!text.contains("Ibuprofen"));
}

#[test]
fn unknown_sort_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let out = run(&["results", payload.to_str().unwrap(), "--sort", "colorHighLow"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown sort key"));
}

#[test]
fn paths_shows_exclusions_and_support() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let out = run(&["paths", payload.to_str().unwrap(), "r1", "--exclude", "fda:approved"]);
    assert!(out.status.success());

    let text = stdout(&out);
    assert!(text.contains("2 paths, 1 kept"));
    assert!(text.contains("excluded"));
    assert!(text.contains("sp1 via e4"));
    assert!(text.contains("Aspirin -[biolink:treats]-> Pain"));
}

#[test]
fn evidence_is_printed_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let out = run(&["evidence", payload.to_str().unwrap(), "r1"]);
    assert!(out.status.success());
    let bundle = json(&out);
    assert_eq!(bundle["publications"][0]["id"], "PMID:1");
    assert_eq!(bundle["publications"][0]["kind"], "pubmed");
}

#[test]
fn graph_formats() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let payload = payload.to_str().unwrap();

    let out = run(&["graph", payload, "r2"]);
    let graph = json(&out);
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);

    let out = run(&["graph", payload, "r1", "--format", "dot"]);
    let dot = stdout(&out);
    assert!(dot.starts_with("digraph result {"));
    assert!(dot.contains("style=dashed"));
}

#[test]
fn unknown_result_and_missing_payload_fail() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());

    let out = run(&["evidence", payload.to_str().unwrap(), "r9"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown result `r9`"));

    let missing = dir.path().join("missing.json");
    let out = run(&["results", missing.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("loading result payload"));
}

#[test]
fn config_file_changes_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let payload = write_payload(dir.path());
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"ranking": {"heavy_weight": 50.0}}"#).unwrap();

    let out = run(&[
        "--config",
        config.to_str().unwrap(),
        "results",
        payload.to_str().unwrap(),
        "--exclude",
        "fda:approved",
        "--json",
    ]);
    assert!(out.status.success());
    let view = json(&out);
    let ranks = view["results"][0]["ranks"].as_array().unwrap();
    assert!(ranks.iter().any(|r| r["rank"] == 50.0));
}
