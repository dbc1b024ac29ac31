mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scal_core::ScalConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scal")]
#[command(about = "Reshape your Schoology calendar feed and serve it back as ICS")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the reshaped ICS feed
    Feed {
        /// Schoology export URL (defaults to SCHOOLOGY_ICS_URL)
        #[arg(long)]
        url: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the reshaped feed grouped by day
    Agenda {
        #[arg(long)]
        url: Option<String>,
    },
    /// Mark an item done
    Mark {
        id: String,

        /// Only this occurrence (YYYYMMDDTHHMM, as in the feed links)
        #[arg(long)]
        occ: Option<String>,
    },
    /// Remove a done mark
    Unmark {
        id: String,

        #[arg(long)]
        occ: Option<String>,
    },
    /// Manage custom events
    Custom {
        #[command(subcommand)]
        command: CustomCommand,
    },
    /// Rebuild the section catalog from the API
    Refresh,
    /// Counts from the local cache
    Status,
    /// Show the effective configuration
    Config {
        /// Write a commented default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
pub enum CustomCommand {
    List,
    Add {
        name: String,

        /// YYYY-MM-DD
        #[arg(short, long)]
        date: String,

        /// HH:MM, omit for an all-day entry
        #[arg(short, long)]
        time: Option<String>,

        #[arg(long)]
        course: Option<String>,

        /// "assignment" or "event"
        #[arg(short, long, default_value = "event")]
        kind: String,

        /// none, daily, weekly, monthly or yearly
        #[arg(short, long, default_value = "none")]
        repeat: String,

        #[arg(long)]
        description: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Serve { .. } = cli.command {
        scal_server::init_tracing();
    } else {
        // stdout may carry the feed, so logs go to stderr.
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
            .with_writer(std::io::stderr)
            .init();
    }

    if let Commands::Config { init } = cli.command {
        return commands::config::run(cli.config.as_deref(), init);
    }

    let config = ScalConfig::load(cli.config.as_deref())?;
    tracing::debug!(data_dir = %config.data_dir().display(), tz = %config.tz(), "Loaded config");

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config, host, port).await,
        Commands::Feed { url, output } => commands::feed::run(&config, url, output).await,
        Commands::Agenda { url } => commands::agenda::run(&config, url).await,
        Commands::Mark { id, occ } => commands::marks::mark(&config, &id, occ.as_deref()),
        Commands::Unmark { id, occ } => commands::marks::unmark(&config, &id, occ.as_deref()),
        Commands::Custom { command } => commands::custom::run(&config, command),
        Commands::Refresh => commands::refresh::run(&config).await,
        Commands::Status => commands::status::run(&config),
        Commands::Config { .. } => Ok(()),
    }
}
