//! End-to-end runs of the text analysis workflow against a scripted oracle.

mod support;

use std::sync::Arc;

use nodes::analysis::{self, CLASSIFY_NODE, ENTITY_NODE, SUMMARY_NODE};
use pipeline::{FieldName, OracleError};
use support::ScriptedOracle;

const ARTICLE: &str = "The WHO met in Paris on Monday, where John Smith presented new findings.";

fn scripted() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply(CLASSIFY_NODE, "News\n")
        .reply(ENTITY_NODE, "Paris, WHO, John Smith")
        .reply(SUMMARY_NODE, "  The WHO heard new findings in Paris.  ")
}

#[tokio::test]
async fn runs_three_stages_in_fixed_order() {
    let oracle = Arc::new(scripted());
    let workflow = analysis::text_analysis(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate(ARTICLE).await.unwrap();
    let state = &evaluation.report.state;

    assert_eq!(oracle.called(), vec![CLASSIFY_NODE, ENTITY_NODE, SUMMARY_NODE]);
    assert_eq!(state.text(&FieldName::from_static("classification")), Some("News"));
    assert_eq!(
        state.list(&FieldName::from_static("entities")).unwrap(),
        ["Paris", "WHO", "John Smith"]
    );
    assert_eq!(
        state.text(&FieldName::from_static("summary")),
        Some("The WHO heard new findings in Paris.")
    );
}

#[tokio::test]
async fn projection_renders_label_entities_and_summary() {
    let workflow = analysis::text_analysis(Arc::new(scripted())).unwrap();

    let evaluation = workflow.evaluate(ARTICLE).await.unwrap();
    let lines: Vec<String> = evaluation.fields.iter().map(ToString::to_string).collect();

    assert_eq!(
        lines,
        vec![
            "Classification: News",
            "Entities: Paris, WHO, John Smith",
            "Summary: The WHO heard new findings in Paris.",
        ]
    );
}

#[tokio::test]
async fn failures_do_not_change_the_order_or_count_of_calls() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .fail(CLASSIFY_NODE, OracleError::Timeout)
            .reply(ENTITY_NODE, "")
            .fail(SUMMARY_NODE, OracleError::EmptyResponse),
    );
    let workflow = analysis::text_analysis(oracle.clone()).unwrap();

    let evaluation = workflow.evaluate("").await.unwrap();

    assert_eq!(oracle.called(), vec![CLASSIFY_NODE, ENTITY_NODE, SUMMARY_NODE]);
    assert!(evaluation.fields.iter().all(|f| f.value.is_empty()));
}

#[tokio::test]
async fn concurrent_runs_share_one_workflow() {
    let oracle = Arc::new(scripted());
    let workflow = analysis::text_analysis(oracle.clone()).unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..3 {
        let workflow = workflow.clone();
        tasks.spawn(async move { workflow.evaluate(ARTICLE).await });
    }
    while let Some(result) = tasks.join_next().await {
        let evaluation = result.unwrap().unwrap();
        assert_eq!(evaluation.report.visits.len(), 3);
    }

    assert_eq!(oracle.called().len(), 9);
}
