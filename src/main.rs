use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use edumate_core::bootstrap::{AppBuilder, resolve_config_path};
use edumate_core::{StudyAssistant, TaskRequest};
use edumate_llm::LlmProvider;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const DEFAULT_SESSION: &str = "cli";

#[derive(Debug, Parser)]
#[command(name = "edumate", version, about = "Study assistant grounded in your school documents")]
struct Cli {
    /// Path to the TOML config (falls back to `EDUMATE_CONFIG`, then `config/default.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer one question from the documents.
    Ask {
        question: String,
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Three multiple-choice questions on a topic.
    Quiz { topic: String },
    /// Bullet-point revision notes for a topic.
    Summary { topic: String },
    /// Mermaid flowchart explaining a topic.
    Mindmap { topic: String },
    /// Day-by-day study plan for a subject.
    Plan {
        subject: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Interactive question loop bound to one session.
    Chat {
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
}

impl Command {
    /// The one-shot request for this command; `None` for the chat loop.
    fn into_request(self) -> Option<TaskRequest> {
        match self {
            Self::Ask { question, session } => Some(TaskRequest::Ask {
                question,
                session_id: session,
            }),
            Self::Quiz { topic } => Some(TaskRequest::Quiz { topic }),
            Self::Summary { topic } => Some(TaskRequest::Summary { topic }),
            Self::Mindmap { topic } => Some(TaskRequest::Mindmap { topic }),
            Self::Plan { subject, days } => Some(TaskRequest::StudyPlan { subject, days }),
            Self::Chat { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let builder = AppBuilder::from_path(config_path).await?;
    let assistant = builder.build_assistant().await?;

    let report = assistant.ingest_report();
    tracing::info!(
        files_loaded = report.files_loaded,
        files_failed = report.files_failed,
        documents = report.documents,
        placeholder = report.placeholder,
        chunks = assistant.index().len(),
        "corpus indexed"
    );

    match cli.command {
        Command::Chat { session } => run_chat(&assistant, &session).await,
        command => {
            let Some(request) = command.into_request() else {
                return Ok(());
            };
            let output = assistant
                .handle(&request)
                .await
                .with_context(|| format!("{} request failed", request.kind()))?;
            println!("{output}");
            Ok(())
        }
    }
}

async fn run_chat<P: LlmProvider>(
    assistant: &StudyAssistant<P>,
    session_id: &str,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"EduMate is ready. Type 'exit' to quit.\n")
        .await?;
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match assistant.ask(question, session_id).await {
            Ok(answer) => {
                stdout.write_all(answer.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Err(e) => {
                tracing::error!(session_id, "ask failed: {e:#}");
                eprintln!("error: {e}");
            }
        }
    }
    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plan_with_days() {
        let cli = Cli::try_parse_from(["edumate", "plan", "Science", "--days", "5"]).unwrap();
        let request = cli.command.into_request().unwrap();
        assert_eq!(
            request,
            TaskRequest::StudyPlan {
                subject: "Science".into(),
                days: 5
            }
        );
    }

    #[test]
    fn ask_defaults_session_id() {
        let cli = Cli::try_parse_from(["edumate", "ask", "What is evaporation?"]).unwrap();
        assert!(cli.config.is_none());
        match cli.command.into_request().unwrap() {
            TaskRequest::Ask { session_id, .. } => assert_eq!(session_id, DEFAULT_SESSION),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["edumate", "quiz", "Photosynthesis", "--config", "school.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("school.toml")));
    }

    #[test]
    fn chat_has_no_one_shot_request() {
        let cli = Cli::try_parse_from(["edumate", "chat", "--session", "s1"]).unwrap();
        assert!(cli.command.into_request().is_none());
    }
}
