use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ActionOutcome, AnswerView, ExplorerPane, GraphImage, HttpGraphQaApi,
    Notification, UiController, UiView,
};
use parking_lot::Mutex;
use shared::{
    domain::{Character, EmbeddingModel, LlmModel},
    protocol::CacheStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graph-qa", about = "Query the Marvel knowledge-graph backend")]
struct Args {
    /// Backend base URL; overrides graph_qa.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Settings file to load instead of ./graph_qa.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a natural-language question.
    Ask {
        question: String,
        /// OpenAI key forwarded to the backend with this one request.
        #[arg(long, default_value = "")]
        api_key: String,
        #[arg(long)]
        llm_model: Option<LlmModel>,
        #[arg(long)]
        embedding_model: Option<EmbeddingModel>,
    },
    /// Drop the backend's cached graph, triplets and index.
    ResetCache,
    /// Download the rendered knowledge-graph image.
    ShowGraph {
        #[arg(long)]
        out: PathBuf,
    },
    /// List a character's relationships (first character when omitted).
    Explore { character: Option<Character> },
    /// Print the characters the explorer knows about.
    Characters,
    /// Show which backend build artifacts are cached.
    CacheStatus,
}

/// Renders controller output to stdout, problems to stderr.
#[derive(Default)]
struct TerminalView {
    graph_image: Mutex<Option<GraphImage>>,
}

impl TerminalView {
    fn take_graph_image(&self) -> Option<GraphImage> {
        self.graph_image.lock().take()
    }
}

impl UiView for TerminalView {
    fn set_controls_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "view: controls toggled");
    }

    fn notify(&self, notification: Notification) {
        eprintln!("[{}] {}", notification.level, notification.message);
    }

    fn show_answer(&self, answer: AnswerView) {
        println!("{}", answer.answer);
        if let Some(cost_line) = &answer.cost_line {
            println!();
            println!("{cost_line}");
        }
        for line in &answer.cache_lines {
            println!("{line}");
        }
    }

    fn show_result_error(&self, message: String) {
        eprintln!("{message}");
    }

    fn show_graph_image(&self, image: GraphImage) {
        *self.graph_image.lock() = Some(image);
    }

    fn set_active_character(&self, character: Character) {
        println!("== {character} ==");
    }

    fn show_explorer(&self, pane: ExplorerPane) {
        match pane {
            ExplorerPane::Loading(_) => {}
            ExplorerPane::Connections { connections, .. } => {
                let width = connections
                    .iter()
                    .map(|c| c.relation.len())
                    .max()
                    .unwrap_or(0);
                for connection in connections {
                    println!("{:<width$}  {}", connection.relation, connection.entity);
                }
            }
            ExplorerPane::Empty(character) => {
                println!("No connections found for {character}.");
            }
            ExplorerPane::Error { message, .. } => eprintln!("{message}"),
        }
    }

    fn show_cache_status(&self, status: CacheStatus) {
        for (label, present) in [
            ("Graph", status.graph),
            ("Triplets", status.triplets),
            ("Index", status.index),
        ] {
            println!("{label}: {}", if present { "cached" } else { "not built" });
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    if matches!(args.command, Command::Characters) {
        for character in Character::ALL {
            println!("{character}");
        }
        return Ok(());
    }

    let mut settings = load_settings(args.config.as_deref());
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }

    let api = HttpGraphQaApi::new(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let view = Arc::new(TerminalView::default());
    let controller = UiController::new_with_settings(Arc::new(api), view.clone(), &settings);

    let outcome = match args.command {
        Command::Ask {
            question,
            api_key,
            llm_model,
            embedding_model,
        } => {
            controller.set_api_key(api_key);
            if let Some(model) = llm_model {
                controller.set_llm_model(model);
            }
            if let Some(model) = embedding_model {
                controller.set_embedding_model(model);
            }
            controller.submit_question(&question).await
        }
        Command::ResetCache => controller.reset_cache().await,
        Command::ShowGraph { out } => {
            let outcome = controller.show_graph().await;
            if let Some(image) = view.take_graph_image() {
                fs::write(&out, &image.bytes)
                    .with_context(|| format!("failed to write graph image to {}", out.display()))?;
                println!("Wrote {} bytes to {}", image.len(), out.display());
            }
            outcome
        }
        Command::Explore { character } => match character {
            Some(character) => controller.select_character(character).await,
            None => controller.start().await,
        },
        Command::CacheStatus => controller.refresh_cache_status().await,
        Command::Characters => ActionOutcome::Succeeded,
    };
    controller.shutdown();

    if !outcome.is_success() {
        bail!("request did not succeed: {outcome:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_parses_models_by_wire_name() {
        let args = Args::try_parse_from([
            "graph-qa",
            "--server-url",
            "http://graph.local:5000",
            "ask",
            "Who is Magneto?",
            "--llm-model",
            "gpt-4",
            "--embedding-model",
            "text-embedding-3-small",
        ])
        .expect("args");

        assert_eq!(args.server_url.as_deref(), Some("http://graph.local:5000"));
        match args.command {
            Command::Ask {
                question,
                api_key,
                llm_model,
                embedding_model,
            } => {
                assert_eq!(question, "Who is Magneto?");
                assert!(api_key.is_empty());
                assert_eq!(llm_model, Some(LlmModel::Gpt4));
                assert_eq!(embedding_model, Some(EmbeddingModel::Small3));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn unknown_model_is_a_usage_error() {
        let result = Args::try_parse_from(["graph-qa", "ask", "q", "--llm-model", "gpt-9"]);
        assert!(result.is_err());
    }

    #[test]
    fn explore_accepts_names_with_spaces() {
        let args = Args::try_parse_from(["graph-qa", "explore", "Professor X"]).expect("args");
        assert!(matches!(
            args.command,
            Command::Explore {
                character: Some(Character::ProfessorX)
            }
        ));

        let args = Args::try_parse_from(["graph-qa", "explore"]).expect("args");
        assert!(matches!(args.command, Command::Explore { character: None }));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from(["graph-qa", "cache-status", "--timeout-secs", "5"])
            .expect("args");
        assert_eq!(args.timeout_secs, Some(5));
        assert!(matches!(args.command, Command::CacheStatus));
    }
}
