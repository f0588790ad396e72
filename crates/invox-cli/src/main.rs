//! CLI application for digitizing invoice images.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{Context, batch, config, extract, key, models};

/// Invoice digitizer - Extract structured line items from invoice images
#[derive(Parser)]
#[command(name = "invox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the stored API key and model preference
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract data from a single invoice
    Extract(extract::ExtractArgs),

    /// Extract data from multiple invoice files
    Batch(batch::BatchArgs),

    /// List and select extraction models
    Models(models::ModelsArgs),

    /// Manage the stored API key
    Key(key::KeyArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let ctx = Context {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };

    match cli.command {
        Commands::Extract(args) => extract::run(args, &ctx).await,
        Commands::Batch(args) => batch::run(args, &ctx).await,
        Commands::Models(args) => models::run(args, &ctx).await,
        Commands::Key(args) => key::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
