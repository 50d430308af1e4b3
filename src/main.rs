use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{analyze, check_config};

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "Business-line social media insights: topics, key people, and relationship graphs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a file of posts and emit the insights graph as JSON
    Analyze {
        /// Input JSON file containing an array of posts
        #[arg(short, long)]
        input: String,

        /// Optional JSON file mapping member handles to descriptions
        #[arg(short, long)]
        members: Option<String>,

        /// Skip LLM enrichment and use frequency analysis only
        #[arg(long, default_value = "false")]
        no_enrichment: bool,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long, default_value = "false")]
        pretty: bool,
    },

    /// Validate provider and logging configuration
    CheckConfig {
        /// Optional TOML config file (environment variables when omitted)
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Analyze {
            input,
            members,
            no_enrichment,
            output,
            pretty,
        } => {
            tracing::info!(
                input = %input,
                members = ?members,
                no_enrichment = %no_enrichment,
                "Starting analyze command"
            );
            analyze(input, members, no_enrichment, output, pretty).await?;
        }

        Commands::CheckConfig { file } => {
            tracing::info!(file = ?file, "Starting check-config command");
            check_config(file).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("pulse=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("pulse=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
