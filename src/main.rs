use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use refqa_core::config::{self, Config};
use refqa_core::{Pipeline, create_index_backend, create_provider};
use refqa_llm::AnyProvider;

mod commands;
mod init;

#[derive(Parser)]
#[command(name = "refqa")]
#[command(about = "Answer questions from bank reference documents with per-category retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file [default: $REFQA_CONFIG or config/default.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build missing indexes, answer a question set, and score it
    Run {
        /// Question set JSON
        #[arg(long)]
        question_path: PathBuf,

        /// Reference directory with one sub-directory per category
        #[arg(long)]
        source_path: PathBuf,

        /// Where to write the answer set
        #[arg(long)]
        output_path: PathBuf,

        /// Ground truth to score against
        #[arg(long)]
        ground_truth_path: Option<PathBuf>,
    },

    /// Build the indexes that do not exist yet
    Build {
        /// Reference directory with one sub-directory per category
        #[arg(long)]
        source_path: PathBuf,

        /// Category to build (repeatable) [default: all configured]
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Answer a single question
    Ask {
        #[arg(long)]
        category: String,

        question: String,
    },

    /// Score an answer set against ground truth
    Score {
        #[arg(long)]
        output_path: PathBuf,

        #[arg(long)]
        ground_truth_path: PathBuf,
    },

    /// Write a config file with every default spelled out
    Init {
        /// Target path [default: the resolved config path]
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();
    config::load_dotenv();

    let config_path = config::resolve_config_path(cli.config.as_deref());
    match cli.command {
        Command::Init { output, force } => init::run(&output.unwrap_or(config_path), force),
        Command::Score {
            output_path,
            ground_truth_path,
        } => commands::score(&output_path, &ground_truth_path)
            .await
            .map(|_| ()),
        Command::Run {
            question_path,
            source_path,
            output_path,
            ground_truth_path,
        } => {
            let (config, pipeline) = load_pipeline(&config_path)?;
            commands::build(&pipeline, &source_path, &config.categories).await?;
            commands::answer(&pipeline, &question_path, &output_path).await?;
            match ground_truth_path.or_else(commands::default_ground_truth) {
                Some(path) => {
                    commands::score(&output_path, &path).await?;
                }
                None => tracing::info!("no ground truth given, skipping scoring"),
            }
            Ok(())
        }
        Command::Build {
            source_path,
            categories,
        } => {
            let (config, pipeline) = load_pipeline(&config_path)?;
            let categories = if categories.is_empty() {
                config.categories
            } else {
                categories
            };
            commands::build(&pipeline, &source_path, &categories).await
        }
        Command::Ask { category, question } => {
            let (_, pipeline) = load_pipeline(&config_path)?;
            commands::ask(&pipeline, &category, &question).await
        }
    }
}

/// Load and validate the configuration, then wire the provider and index backend.
fn load_pipeline(config_path: &Path) -> anyhow::Result<(Config, Pipeline<AnyProvider>)> {
    let config = Config::load(config_path)?;
    config.validate().context("invalid configuration")?;
    tracing::info!(
        config = %config_path.display(),
        provider = %config.llm.provider,
        model = %config.llm.model,
        "configuration loaded"
    );

    let provider = create_provider(&config)?;
    let backend = create_index_backend(&config)?;
    let pipeline = Pipeline::new(&config, provider, backend);
    Ok((config, pipeline))
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_arguments_use_kebab_case() {
        let cli = Cli::try_parse_from([
            "refqa",
            "run",
            "--question-path",
            "q.json",
            "--source-path",
            "data/reference",
            "--output-path",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                question_path,
                ground_truth_path,
                ..
            } => {
                assert_eq!(question_path, PathBuf::from("q.json"));
                assert!(ground_truth_path.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn build_categories_repeat_and_config_is_global() {
        let cli = Cli::try_parse_from([
            "refqa",
            "build",
            "--source-path",
            "ref",
            "--category",
            "faq",
            "--category",
            "finance",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::Build { categories, .. } => assert_eq!(categories, ["faq", "finance"]),
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn invalid_configuration_is_rejected_before_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refqa.toml");
        std::fs::write(&path, "[index]\ntop_k = 0\n").unwrap();
        let err = load_pipeline(&path).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn ask_requires_category() {
        assert!(Cli::try_parse_from(["refqa", "ask", "年費多少？"]).is_err());
        let cli = Cli::try_parse_from(["refqa", "ask", "--category", "faq", "年費多少？"]).unwrap();
        assert!(matches!(cli.command, Command::Ask { ref question, .. } if question == "年費多少？"));
    }
}
