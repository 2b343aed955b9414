mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notecal")]
#[command(about = "Convert a Notion database into an iCalendar file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Convert {
        /// Settings file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Write the calendar here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Notion integration token
        #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
        token: String,

        /// Ignore cached state and fetch every record
        #[arg(long)]
        full: bool,
    },
    ClearCache {
        /// Settings file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            config,
            output,
            token,
            full,
        } => commands::convert::run(&config, output.as_deref(), &token, full).await,
        Commands::ClearCache { config } => commands::clear_cache::run(&config).await,
    }
}
