use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{init_tracing, load_config_from, LogLevel, WorkerGuard};
use database::{connect, DbRepository, OperationPolicy};
use services::AppServices;
use std::path::PathBuf;

mod console;
mod render;

/// The main entry point for the campaign manager.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional: settings can also come from config.toml or the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Startup failures (bad config, unreachable database) end the process here.
    let ctx = AppContext::init(&cli).await?;

    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => console::run(&ctx.services).await,
        Commands::Campaigns { json, batched } => handle_campaigns(&ctx, json, batched).await,
        Commands::Channels { json } => handle_channels(&ctx, json).await,
        Commands::Companies => Ok(console::show_companies(&ctx.services).await?),
        Commands::Categories => Ok(console::show_categories(&ctx.services).await?),
    };

    if let Err(e) = &result {
        tracing::error!(error = ?e, "Exiting with an error.");
    }
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Manage marketing campaigns, their channels, companies and categories.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `meta.log_level` from the configuration file.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive menu (the default).
    Menu,
    /// Print every campaign with its channels.
    Campaigns {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Load the channels of all campaigns in a single query.
        #[arg(long)]
        batched: bool,
    },
    /// Print every channel with its category.
    Channels {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print every company.
    Companies,
    /// Print the campaign and channel categories.
    Categories,
}

// ==============================================================================
// Application Context
// ==============================================================================

/// Everything a command needs, created once at startup.
struct AppContext {
    services: AppServices<DbRepository>,
    // Flushes the file log when dropped.
    _log_guard: WorkerGuard,
}

impl AppContext {
    async fn init(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_config_from(&cli.config)
            .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
        let log_guard = init_tracing(&config.meta, cli.log_level).context("Failed to set up logging")?;
        tracing::info!(config = %cli.config.display(), "Starting campaign manager.");

        let pool = connect(&config.database)
            .await
            .context("Failed to connect to the database")?;
        let repo = DbRepository::with_policy(pool, OperationPolicy::from_config(&config.database.pool));
        repo.verify_mappings()
            .await
            .context("The database schema does not match the application")?;

        Ok(Self {
            services: AppServices::new(repo),
            _log_guard: log_guard,
        })
    }
}

// ==============================================================================
// One-shot Commands
// ==============================================================================

async fn handle_campaigns(ctx: &AppContext, json: bool, batched: bool) -> anyhow::Result<()> {
    if !json {
        return Ok(console::show_campaigns(&ctx.services, batched).await?);
    }
    let campaigns = if batched {
        ctx.services.list_campaigns_batched().await?
    } else {
        ctx.services.list_campaigns().await?
    };
    println!("{}", serde_json::to_string_pretty(&campaigns)?);
    Ok(())
}

async fn handle_channels(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    if !json {
        return Ok(console::show_channels(&ctx.services).await?);
    }
    let channels = ctx.services.list_channels().await?;
    println!("{}", serde_json::to_string_pretty(&channels)?);
    Ok(())
}
