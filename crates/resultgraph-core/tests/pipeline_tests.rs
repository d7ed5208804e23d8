//! View pipeline tests: compress → rank → filter → score → sort

mod common;

use resultgraph_core::*;

fn run(request: &ViewRequest) -> ResultView {
    ViewPipeline::default()
        .run(&common::result_set(), request)
        .unwrap()
}

#[test]
fn test_default_view_sorts_by_score() {
    let view = run(&ViewRequest::default());
    assert_eq!(view.ids(), vec!["r1", "r2"]);
    assert_eq!(view.hidden, 0);
    assert_eq!(view.total(), 2);
    assert_eq!(view.mode, SortMode::Standard);
}

#[test]
fn test_novelty_boost_reorders() {
    let request = ViewRequest::default().with_weights(ScoreWeights::novelty_boost());
    assert_eq!(run(&request).ids(), vec!["r2", "r1"]);
}

#[test]
fn test_counts_are_recomputed() {
    let view = run(&ViewRequest::default());
    let r1 = view.get("r1").unwrap();
    // PMID:1, PMC:2, NCT0001
    assert_eq!(r1.result.evidence_count, 3);
    // p1 (folding p2), p3 and sp1 under p3
    assert_eq!(r1.result.path_count, 3);
    assert_eq!(r1.paths.len(), 2);
}

#[test]
fn test_excluded_paths_hide_results() {
    let request = ViewRequest::default().with_filters(vec![Filter::exclude("fda:approved")]);
    let view = run(&request);
    // r2's only path is FDA approved; r1 survives through p3.
    assert_eq!(view.ids(), vec!["r1"]);
    assert_eq!(view.hidden, 1);

    let r1 = view.get("r1").unwrap();
    assert!(!r1.path_filter_state.is_kept("p1"));
    assert!(r1.path_filter_state.is_kept("p3"));
    let order: Vec<&str> = r1.paths.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["p3", "p1"]);
    assert_eq!(r1.rank_of("p1"), Some(1000.0));
    // Only p3 and its support remain.
    assert_eq!(r1.result.path_count, 2);
    assert_eq!(r1.result.evidence_count, 2);
}

#[test]
fn test_pathless_result_hidden_only_by_path_filters() {
    let mut results = common::results();
    results.push(ResultRecord::new("r3", "Naproxen", &["ghost"]));
    let set = ResultSet::from_parts(common::store(), results, Status::Complete);
    let pipeline = ViewPipeline::default();

    let view = pipeline.run(&set, &ViewRequest::default()).unwrap();
    assert!(view.get("r3").is_some());
    assert_eq!(view.hidden, 0);
    let r3 = view.get("r3").unwrap();
    assert!(r3.paths.is_empty());
    assert_eq!(r3.result.path_count, 0);

    // Result-level filters still apply.
    let request = ViewRequest::default().with_filters(vec![Filter::include("str:napro")]);
    assert_eq!(pipeline.run(&set, &request).unwrap().ids(), vec!["r3"]);

    for filter in [Filter::include("ev:pubs"), Filter::exclude("fda:approved")] {
        let request = ViewRequest::default().with_filters(vec![filter]);
        let view = pipeline.run(&set, &request).unwrap();
        assert!(view.get("r3").is_none());
    }
}

#[test]
fn test_text_filters() {
    let include = ViewRequest::default().with_filters(vec![Filter::include("str:asp")]);
    assert_eq!(run(&include).ids(), vec!["r1"]);

    let exclude = ViewRequest::default().with_filters(vec![Filter::exclude("str:asp")]);
    assert_eq!(run(&exclude).ids(), vec!["r2"]);
}

#[test]
fn test_user_save_filters() {
    let saves = UserSaves::default().bookmark("r2").annotate("r1");
    let bookmarked = ViewRequest::default()
        .with_user_saves(saves.clone())
        .with_filters(vec![Filter::include("sv:bookmarked")]);
    assert_eq!(run(&bookmarked).ids(), vec!["r2"]);

    let without_notes = ViewRequest::default()
        .with_user_saves(saves)
        .with_filters(vec![Filter::exclude("sv:notes")]);
    assert_eq!(run(&without_notes).ids(), vec!["r2"]);
}

#[test]
fn test_selection_highlights_merged_paths() {
    let request = ViewRequest::default().with_selection(["p2".to_string()]);
    let view = run(&request);
    let r1 = view.get("r1").unwrap();
    // p2 was folded into p1, so p1 carries the highlight.
    assert_eq!(r1.paths[0].id, "p1");
    assert!(r1.paths[0].highlighted);
    assert!(!r1.paths[1].highlighted);
}

#[test]
fn test_pipeline_is_idempotent() {
    let request = ViewRequest::default()
        .with_filters(vec![Filter::include("ev:pubs"), Filter::exclude("str:ibu")])
        .with_sort("nameLowHigh".parse().unwrap());
    assert_eq!(run(&request), run(&request));
}

#[test]
fn test_error_snapshot_short_circuits() {
    let set = ResultSet::from_parts(common::store(), common::results(), Status::Error);
    let err = ViewPipeline::default()
        .run(&set, &ViewRequest::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::NoUsableResults { .. }));
}

#[test]
fn test_pathfinder_results_sort_by_plain_score() {
    let mut results = common::results();
    results[0].score = Some(ResultScore::Plain(1.0));
    results[1].score = Some(ResultScore::Plain(5.0));
    let set = ResultSet::from_parts(common::store(), results, Status::Complete);
    let view = ViewPipeline::default().run(&set, &ViewRequest::default()).unwrap();
    assert_eq!(view.mode, SortMode::Pathfinder);
    assert_eq!(view.ids(), vec!["r2", "r1"]);
}

#[test]
fn test_evidence_and_render_on_demand() {
    let set = common::result_set();
    let pipeline = ViewPipeline::default();
    let evidence = pipeline.evidence_for(&set, "r1").unwrap();
    assert_eq!(evidence.publication_count(), 3);
    let graph = pipeline.render_for(&set, "r1").unwrap();
    assert_eq!(graph.edges.len(), 4);
    assert!(pipeline.evidence_for(&set, "missing").is_none());
}

#[test]
fn test_annotate_counts_without_filters() {
    let annotated = annotate_counts(&common::result_set());
    assert_eq!(annotated[0].evidence_count, 3);
    assert_eq!(annotated[0].path_count, 3);
    assert_eq!(annotated[1].evidence_count, 0);
    assert_eq!(annotated[1].path_count, 1);
}

#[test]
fn test_pagination() {
    let view = run(&ViewRequest::default());
    assert_eq!(view.page(0, 1).len(), 1);
    assert_eq!(view.page(1, 1)[0].id(), "r2");
    assert!(view.page(5, 10).is_empty());
}

#[test]
fn test_view_request_parses_from_json() {
    let request: ViewRequest = serde_json::from_str(
        r#"{"filters": [{"id": "fda:approved", "negated": true}], "sort": "nameHighLow"}"#,
    )
    .unwrap();
    assert_eq!(request.filters[0].id, "fda:approved");
    assert!(request.filters[0].negated);
    assert_eq!(request.sort.to_string(), "nameHighLow");
    assert_eq!(request.weights, ScoreWeights::default());
}
