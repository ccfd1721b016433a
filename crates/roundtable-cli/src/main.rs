use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use roundtable_core::session::DiscussionMode;
use roundtable_core::settings::KnowledgeBaseTiming;
use roundtable_infrastructure::ConfigService;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "roundtable")]
#[command(about = "Roundtable CLI - multi-coach discussions streamed from the backend", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage roundtable sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Send a message to a session and stream the discussion
    Chat(ChatArgs),
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List sessions
    List,
    /// Show a session and its settings
    Show {
        id: String,
        /// Print the raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a session
    Create {
        /// Participant coach id (repeatable, in speaking order)
        #[arg(long = "coach", required = true)]
        coaches: Vec<String>,
        #[arg(long)]
        moderator: Option<String>,
        #[arg(long, default_value = "free")]
        mode: DiscussionMode,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        debate_style: Option<String>,
    },
    /// Change a session's saved model and knowledge-base settings
    Configure(ConfigureArgs),
    /// End a session
    End { id: String },
}

#[derive(Args)]
pub(crate) struct ConfigureArgs {
    pub id: String,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// off, message, round, coach or moderator
    #[arg(long)]
    pub kb_timing: Option<KnowledgeBaseTiming>,
    #[arg(long)]
    pub kb_top_k: Option<u32>,
    #[arg(long)]
    pub kb_max_candidates: Option<u32>,
}

#[derive(Args)]
pub(crate) struct ChatArgs {
    pub session_id: String,
    pub message: String,
    /// File to attach (repeatable)
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
    #[arg(long)]
    pub max_rounds: Option<u32>,
    /// Model for this message only
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

impl ChatArgs {
    fn has_model_override(&self) -> bool {
        self.model.is_some()
            || self.provider.is_some()
            || self.temperature.is_some()
            || self.max_tokens.is_some()
    }
}

impl ConfigureArgs {
    fn has_model_changes(&self) -> bool {
        self.model.is_some()
            || self.provider.is_some()
            || self.temperature.is_some()
            || self.max_tokens.is_some()
    }

    fn has_changes(&self) -> bool {
        self.has_model_changes()
            || self.kb_timing.is_some()
            || self.kb_top_k.is_some()
            || self.kb_max_candidates.is_some()
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service
        .get_config()
        .context("Failed to load configuration")?;
    tracing::debug!(
        "[roundtable] Using API at {} (settings debounce {}ms)",
        config.api_base_url,
        config.settings_debounce_ms
    );

    match cli.command {
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&config).await?,
            SessionsAction::Show { id, json } => {
                commands::sessions::show(&config, &id, json).await?
            }
            SessionsAction::Create {
                coaches,
                moderator,
                mode,
                title,
                debate_style,
            } => {
                commands::sessions::create(&config, coaches, moderator, mode, title, debate_style)
                    .await?
            }
            SessionsAction::Configure(args) => {
                commands::sessions::configure(&config, args).await?
            }
            SessionsAction::End { id } => commands::sessions::end(&config, &id).await?,
        },
        Commands::Chat(args) => commands::chat::run(&config, args).await?,
    }

    Ok(())
}
