//! End-to-end runs of the essay grading workflow against a scripted oracle.

mod support;

use std::sync::Arc;

use nodes::essay::{self, CRITERIA};
use pipeline::{FieldName, NodeId, OracleError};
use support::ScriptedOracle;

const ESSAY: &str = "Renewable energy adoption is accelerating worldwide.";

fn score(state: &pipeline::RunState, field: &'static str) -> f64 {
    state.number(&FieldName::from_static(field)).unwrap()
}

fn all_passing() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply("check_relevance", "Score: 0.8\nStays on topic.")
        .reply("check_grammar", "Score: 0.9\nClean prose.")
        .reply("analyze_structure", "Score: 0.7\nClear paragraphs.")
        .reply("evaluate_depth", "Score: 0.6\nSome analysis.")
}

#[tokio::test]
async fn all_criteria_pass_and_are_weighted() {
    let oracle = Arc::new(all_passing());
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();
    let state = &evaluation.report.state;

    assert!((score(state, "final_score") - 0.74).abs() < 1e-9);
    assert_eq!(score(state, "relevance_score"), 0.8);
    assert_eq!(score(state, "depth_score"), 0.6);
    assert_eq!(
        oracle.called(),
        vec!["check_relevance", "check_grammar", "analyze_structure", "evaluate_depth"]
    );
    assert_eq!(
        evaluation.report.path(),
        vec![
            &NodeId::from_static("check_relevance"),
            &NodeId::from_static("check_grammar"),
            &NodeId::from_static("analyze_structure"),
            &NodeId::from_static("evaluate_depth"),
            &NodeId::from_static("calculate_final_score"),
        ]
    );
}

#[tokio::test]
async fn projection_lists_final_score_first_with_two_decimals() {
    let workflow = essay::essay_grading(Arc::new(all_passing())).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();
    let lines: Vec<String> = evaluation.fields.iter().map(ToString::to_string).collect();

    assert_eq!(
        lines,
        vec![
            "Final Score: 0.74",
            "Relevance Score: 0.80",
            "Grammar Score: 0.90",
            "Structure Score: 0.70",
            "Depth Score: 0.60",
        ]
    );
}

#[tokio::test]
async fn unparsable_relevance_short_circuits_to_zero() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .reply("check_relevance", "This essay is about energy.")
            .reply("check_grammar", "Score: 0.9"),
    );
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();
    let state = &evaluation.report.state;

    assert_eq!(oracle.called(), vec!["check_relevance"]);
    assert_eq!(score(state, "final_score"), 0.0);
    for criterion in &CRITERIA {
        assert_eq!(score(state, criterion.field), 0.0, "{}", criterion.field);
    }
    assert_eq!(
        evaluation.report.path(),
        vec![
            &NodeId::from_static("check_relevance"),
            &NodeId::from_static("calculate_final_score"),
        ]
    );
}

#[tokio::test]
async fn relevance_at_threshold_does_not_pass_the_gate() {
    let oracle = Arc::new(ScriptedOracle::new().reply("check_relevance", "Score: 0.5"));
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();
    let state = &evaluation.report.state;

    assert_eq!(oracle.called(), vec!["check_relevance"]);
    assert!((score(state, "final_score") - 0.15).abs() < 1e-9);
    assert_eq!(score(state, "grammar_score"), 0.0);
    assert_eq!(score(state, "structure_score"), 0.0);
    assert_eq!(score(state, "depth_score"), 0.0);
}

#[tokio::test]
async fn low_structure_skips_depth_but_keeps_earlier_scores() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .reply("check_relevance", "Score: 0.9")
            .reply("check_grammar", "Score: 0.8")
            .reply("analyze_structure", "Score: 0.3")
            .reply("evaluate_depth", "Score: 1.0"),
    );
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let state = workflow.evaluate(ESSAY).await.unwrap().report.state;

    assert_eq!(
        oracle.called(),
        vec!["check_relevance", "check_grammar", "analyze_structure"]
    );
    assert_eq!(score(&state, "depth_score"), 0.0);
    let expected = 0.3 * 0.9 + 0.2 * 0.8 + 0.2 * 0.3;
    assert!((score(&state, "final_score") - expected).abs() < 1e-9);
}

#[tokio::test]
async fn oracle_failure_is_absorbed_like_a_low_score() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .reply("check_relevance", "Score: 0.9")
            .fail("check_grammar", OracleError::Status { status: 429, body: "slow down".into() }),
    );
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();

    assert_eq!(oracle.called(), vec!["check_relevance", "check_grammar"]);
    assert!((score(&evaluation.report.state, "final_score") - 0.27).abs() < 1e-9);
    assert_eq!(evaluation.fields.len(), 5);
}

#[tokio::test]
async fn depth_always_proceeds_to_aggregation() {
    let oracle = Arc::new(all_passing().reply("evaluate_depth", "Score: 0.1"));
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ESSAY).await.unwrap();

    assert_eq!(oracle.called().len(), 4);
    assert_eq!(evaluation.report.visits.len(), 5);
}

#[tokio::test]
async fn every_prompt_carries_the_essay() {
    let oracle = Arc::new(all_passing());
    let workflow = essay::essay_grading(oracle.clone()).unwrap();

    workflow.evaluate(ESSAY).await.unwrap();

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts.iter().all(|p| p.contains(ESSAY) && p.contains("Score: ")));
}

#[tokio::test]
async fn identical_replies_give_identical_projections() {
    let first = essay::essay_grading(Arc::new(all_passing()))
        .unwrap()
        .evaluate(ESSAY)
        .await
        .unwrap();
    let second = essay::essay_grading(Arc::new(all_passing()))
        .unwrap()
        .evaluate(ESSAY)
        .await
        .unwrap();

    assert_eq!(first.fields, second.fields);
    assert_eq!(first.report.state, second.report.state);
    assert_ne!(first.report.run_id, second.report.run_id);
}

#[test]
fn weights_sum_to_one() {
    let sum: f64 = CRITERIA.iter().map(|c| c.weight).sum();
    assert!((sum - 1.0).abs() < pipeline::WEIGHT_SUM_TOLERANCE);
}
