use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use llm::{ChatCompletionsOracle, OracleConfig};
use nodes::BuildError;
use pipeline::{Evaluation, ScoringOracle, Workflow};
use tokio::io::AsyncReadExt;
use tokio::task::JoinSet;
use tracing::info;

use crate::observability::LogFormat;

/// Command-line arguments for `gradeflow`.
#[derive(Debug, Parser)]
#[command(
    name = "gradeflow",
    about = "Grade essays and analyse text with an LLM scoring pipeline"
)]
pub struct Cli {
    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score an essay on relevance, grammar, structure, and depth
    Grade(EvaluateArgs),
    /// Classify a text, extract its entities, and summarise it
    Analyze(EvaluateArgs),
}

#[derive(Debug, Args, Clone)]
struct EvaluateArgs {
    /// Read a document from this file. Repeat to evaluate several at once.
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,
    /// Print results as JSON, one object per document.
    #[arg(long)]
    json: bool,
    /// Override the oracle model.
    #[arg(long)]
    model: Option<String>,
    /// Document text. Read from stdin when neither this nor --file is given.
    #[arg(value_name = "TEXT")]
    text: Vec<String>,
}

type WorkflowBuilder = fn(Arc<dyn ScoringOracle>) -> Result<Workflow, BuildError>;

struct Document {
    source: String,
    text: String,
}

struct Outcome {
    source: String,
    evaluation: Evaluation,
}

impl Cli {
    /// The requested log format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Builds the selected workflow, evaluates every document, and prints
    /// the results to stdout.
    pub async fn run(self) -> anyhow::Result<()> {
        let (args, build): (EvaluateArgs, WorkflowBuilder) = match self.command {
            Command::Grade(args) => (args, nodes::essay_grading as WorkflowBuilder),
            Command::Analyze(args) => (args, nodes::text_analysis as WorkflowBuilder),
        };

        let mut config = OracleConfig::from_env()?;
        if let Some(model) = &args.model {
            config = config.with_model(model.clone());
        }
        info!(endpoint = %config.endpoint, model = %config.model, "oracle configured");

        let oracle: Arc<dyn ScoringOracle> = Arc::new(ChatCompletionsOracle::new(config)?);
        let workflow = build(oracle)?;

        let documents = load_documents(&args).await?;
        let outcomes = evaluate_all(&workflow, documents).await?;
        let multiple = outcomes.len() > 1;

        for outcome in &outcomes {
            if args.json {
                println!("{}", render_json(outcome)?);
            } else {
                if multiple {
                    println!("== {} ==", outcome.source);
                }
                for field in &outcome.evaluation.fields {
                    println!("{field}");
                }
            }
        }
        Ok(())
    }
}

async fn load_documents(args: &EvaluateArgs) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(args.files.len() + 1);

    for path in &args.files {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.push(Document {
            source: path.display().to_string(),
            text,
        });
    }

    if !args.text.is_empty() {
        documents.push(Document {
            source: "argument".to_string(),
            text: args.text.join(" "),
        });
    }

    if documents.is_empty() {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read document from stdin")?;
        documents.push(Document {
            source: "stdin".to_string(),
            text,
        });
    }

    Ok(documents)
}

/// Runs every document concurrently; results come back in input order.
async fn evaluate_all(workflow: &Workflow, documents: Vec<Document>) -> anyhow::Result<Vec<Outcome>> {
    let mut slots: Vec<Option<Outcome>> = documents.iter().map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (index, document) in documents.into_iter().enumerate() {
        let workflow = workflow.clone();
        tasks.spawn(async move {
            let result = workflow.evaluate(document.text).await;
            (index, document.source, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, source, result) = joined.context("evaluation task failed")?;
        let evaluation = result.with_context(|| format!("evaluation of {source} failed"))?;
        slots[index] = Some(Outcome { source, evaluation });
    }

    Ok(slots.into_iter().flatten().collect())
}

fn render_json(outcome: &Outcome) -> anyhow::Result<String> {
    let report = &outcome.evaluation.report;
    let value = serde_json::json!({
        "source": outcome.source,
        "run_id": report.run_id.to_string(),
        "pipeline": report.pipeline.as_str(),
        "path": report.path().iter().map(|n| n.as_str()).collect::<Vec<_>>(),
        "fields": outcome.evaluation.fields,
    });
    Ok(serde_json::to_string(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_files_and_flags() {
        let cli = Cli::try_parse_from([
            "gradeflow",
            "grade",
            "--file",
            "a.txt",
            "--file",
            "b.txt",
            "--json",
            "--model",
            "gemma2-9b-it",
        ])
        .unwrap();

        let Command::Grade(args) = cli.command else {
            panic!("expected grade");
        };
        assert_eq!(args.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert!(args.json);
        assert_eq!(args.model.as_deref(), Some("gemma2-9b-it"));
        assert!(args.text.is_empty());
    }

    #[test]
    fn positional_words_form_the_document() {
        let cli = Cli::try_parse_from(["gradeflow", "--log-format", "json", "analyze", "Apple", "hired", "Tim."])
            .unwrap();
        assert_eq!(cli.log_format(), LogFormat::Json);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.text.join(" "), "Apple hired Tim.");
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Cli::try_parse_from(["gradeflow"]).is_err());
    }

    #[tokio::test]
    async fn documents_come_from_files_then_text() {
        let dir = std::env::temp_dir().join(format!("gradeflow-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("essay.txt");
        std::fs::write(&path, "An essay.").unwrap();

        let args = EvaluateArgs {
            files: vec![path.clone()],
            json: false,
            model: None,
            text: vec!["inline".to_string(), "text".to_string()],
        };
        let documents = load_documents(&args).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source, path.display().to_string());
        assert_eq!(documents[0].text, "An essay.");
        assert_eq!(documents[1].source, "argument");
        assert_eq!(documents[1].text, "inline text");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn unreadable_file_is_reported() {
        let args = EvaluateArgs {
            files: vec![PathBuf::from("/definitely/not/here.txt")],
            json: false,
            model: None,
            text: Vec::new(),
        };
        let err = load_documents(&args).await.err().unwrap();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
