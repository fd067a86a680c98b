use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_labeler::decision::{prompts::DEFAULT_MODEL, OpenAiModel};
use ai_labeler::github::{GitHubClient, DEFAULT_API_URL};
use ai_labeler::labels::LabelCache;
use ai_labeler::{Labeler, RunConfig};

/// Default label policy location inside the checkout.
const DEFAULT_CONFIG_PATH: &str = ".github/ai-labeler.yml";

/// Inputs mirror the GitHub Action's `INPUT_*` environment variables.
///
/// The runner passes declared but unset inputs as empty strings, so every
/// input is read as text and an empty value means "not given".
#[derive(Parser)]
#[command(name = "ai-labeler")]
#[command(about = "Label GitHub issues and pull requests with a language model")]
struct Cli {
    /// GitHub token used for API calls
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Issue or pull request number (defaults to the triggering event)
    #[arg(long, env = "INPUT_EVENT-NUMBER")]
    event_number: Option<String>,

    /// GitHub event payload file
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<String>,

    /// Label policy file, relative to the workspace root [default: .github/ai-labeler.yml]
    #[arg(long, env = "INPUT_CONFIG-PATH")]
    config_path: Option<String>,

    /// Repository checkout root [default: .]
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace_root: Option<String>,

    /// Print the labels instead of applying them
    #[arg(long, env = "INPUT_DRY-RUN", num_args = 0..=1, default_missing_value = "true")]
    dry_run: Option<String>,

    /// Only consider labels declared in the config file when false
    #[arg(long, env = "INPUT_INCLUDE-REPO-LABELS")]
    include_repo_labels: Option<String>,

    /// File to append the `labels=[...]` output line to
    #[arg(long, env = "GITHUB_OUTPUT")]
    output: Option<String>,

    /// Model used for the labeling decision [default: gpt-4o-mini]
    #[arg(long, env = "INPUT_MODEL")]
    model: Option<String>,

    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// GitHub API base URL [default: https://api.github.com]
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,
}

/// A trimmed input value, or `None` when it is unset or blank.
fn input(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &Option<String>) -> anyhow::Result<Option<bool>> {
    input(value)
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(anyhow::anyhow!(
                "Invalid value '{}' for {}: expected true or false",
                v,
                name
            )),
        })
        .transpose()
}

impl Cli {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let event_number = input(&self.event_number)
            .map(|v| {
                v.parse::<u64>()
                    .with_context(|| format!("Invalid event number '{}'", v))
            })
            .transpose()?;

        let workspace_root = PathBuf::from(input(&self.workspace_root).unwrap_or("."));

        // Relative config paths are resolved inside the checkout
        let config_path = PathBuf::from(input(&self.config_path).unwrap_or(DEFAULT_CONFIG_PATH));
        let config_path = if config_path.is_relative() {
            workspace_root.join(config_path)
        } else {
            config_path
        };

        Ok(RunConfig {
            repository: input(&self.repository).map(str::to_string),
            event_number,
            event_path: input(&self.event_path).map(PathBuf::from),
            config_path,
            workspace_root,
            dry_run: parse_bool("dry-run", &self.dry_run)?.unwrap_or(false),
            output_sink: input(&self.output).map(PathBuf::from),
            include_repo_labels: parse_bool("include-repo-labels", &self.include_repo_labels)?,
        })
    }
}

/// Initialize tracing on stderr so stdout only carries results.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "ai_labeler=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<Vec<String>> {
    let run = cli.run_config()?;

    let github = GitHubClient::new(
        input(&cli.github_api_url).unwrap_or(DEFAULT_API_URL),
        input(&cli.github_token).map(str::to_string),
    )?;

    let mut model = OpenAiModel::new(
        input(&cli.openai_api_key).map(str::to_string),
        input(&cli.model).unwrap_or(DEFAULT_MODEL),
    );
    if let Some(url) = input(&cli.openai_base_url) {
        model = model.with_base_url(url);
    }

    let cache = LabelCache::new();
    let labeler = Labeler::new(&github, &github, &model, &cache);
    Ok(labeler.run(&run).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(labels) => {
            tracing::info!("Done: {:?}", labels);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
