mod app;
mod commands;
mod notifier;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "WORKNEST_LOG";

#[derive(Parser)]
#[command(name = "worknest")]
#[command(about = "Create and edit worknest events from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an event with the interactive wizard
    New {
        /// Pre-fill the title
        title: Option<String>,
    },
    /// Edit an existing event with the interactive wizard
    Edit {
        /// Event id
        id: String,
    },
    /// Show the directory grouped by department
    Participants,
    /// List events in a date range
    Events {
        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD, default 30 days after --from)
        #[arg(long)]
        to: Option<String>,
    },
    /// Inspect or change the stored session facts
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Show configuration paths and values
    Config {
        /// Write a commented default config file if none exists
        #[arg(long)]
        init: bool,

        /// Save a new backend API root
        #[arg(long)]
        base_url: Option<String>,

        /// Save the tenant used when the session names none
        #[arg(long)]
        default_organization: Option<String>,

        /// Save a bearer token for the backend
        #[arg(long)]
        access_token: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print every stored fact
    Show,
    /// Store a fact (e.g. `organization_id 42`)
    Set { key: String, value: String },
    /// Forget a fact
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::New { title } => commands::new::run(title).await,
        Commands::Edit { id } => commands::edit::run(&id).await,
        Commands::Participants => commands::participants::run().await,
        Commands::Events { from, to } => commands::events::run(from.as_deref(), to.as_deref()).await,
        Commands::Session { action } => match action {
            SessionAction::Show => commands::session::show(),
            SessionAction::Set { key, value } => commands::session::set(&key, &value),
            SessionAction::Unset { key } => commands::session::unset(&key),
        },
        Commands::Config {
            init,
            base_url,
            default_organization,
            access_token,
        } => commands::config::run(
            init,
            commands::config::Changes {
                base_url,
                default_organization,
                access_token,
            },
        ),
    }
}

/// Logs go to stderr so they never mix with prompts. Quiet unless
/// `WORKNEST_LOG` asks for more.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
