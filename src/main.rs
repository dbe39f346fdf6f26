use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cinder::classify::language::StopWordDetector;
use cinder::config::Config;
use cinder::output::terminal;
use cinder::pipeline::Analyzer;
use cinder::report::{AnalysisRequest, AnalysisResult, Tier};
use cinder::source::file::JsonExportSource;
use cinder::source::http::HttpSource;
use cinder::source::{ChannelSource, Session};
use cinder::target::{is_private_target, TargetHandle};

/// Cinder: activity intelligence for public Telegram channels.
///
/// Profiles a channel's posting cadence, content, risk indicators and
/// relationships from its recent public history.
#[derive(Parser)]
#[command(name = "cinder", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full activity analysis (paid tiers)
    Analyze {
        /// Channel handle, @handle or t.me link
        target: String,

        /// Caller tier (absent means free, which is rejected)
        #[arg(long, value_enum)]
        tier: Option<Tier>,

        /// Messages to analyze (default 200, max 200)
        #[arg(long)]
        limit: Option<u32>,

        /// Read the channel from a JSON export instead of the relay
        #[arg(long)]
        input: Option<PathBuf>,

        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Public profile, recent messages and linked channels
    Scrape {
        /// Channel handle, @handle or t.me link
        target: String,

        /// Messages to fetch (default 25, max 200)
        #[arg(long)]
        limit: Option<u32>,

        /// Read the channel from a JSON export instead of the relay
        #[arg(long)]
        input: Option<PathBuf>,

        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a target normalizes, without fetching anything
    Normalize {
        target: String,
    },

    /// Check that the channel relay is reachable
    Health,
}

enum Operation {
    Analyze,
    Scrape,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cinder=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let ok = match cli.command {
        Commands::Analyze {
            target,
            tier,
            limit,
            input,
            json,
        } => {
            let mut request = AnalysisRequest::new(target);
            request.tier = tier;
            request.message_limit = limit;
            dispatch(&config, input, Operation::Analyze, &request, json).await?
        }

        Commands::Scrape {
            target,
            limit,
            input,
            json,
        } => {
            let mut request = AnalysisRequest::new(target);
            request.message_limit = limit;
            dispatch(&config, input, Operation::Scrape, &request, json).await?
        }

        Commands::Normalize { target } => normalize(&target),

        Commands::Health => {
            let session = Session::with_timeout(http_source(&config)?, config.fetch_timeout);
            match session.health_check().await {
                Ok(()) => {
                    println!("{} channel source is reachable", "ok".green().bold());
                    true
                }
                Err(e) => {
                    println!("{} {e}", "unhealthy:".red().bold());
                    false
                }
            }
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn http_source(config: &Config) -> Result<HttpSource> {
    let url = config.require_source()?;
    HttpSource::new(url, config.source_token.clone(), config.requests_per_second)
}

/// Pick a source, run the operation, print the result. Returns `ok`.
async fn dispatch(
    config: &Config,
    input: Option<PathBuf>,
    operation: Operation,
    request: &AnalysisRequest,
    json: bool,
) -> Result<bool> {
    let result = match input {
        Some(path) => {
            info!(path = %path.display(), "Using channel export file");
            let source = JsonExportSource::load(&path)?;
            run(config, source, operation, request).await
        }
        None => run(config, http_source(config)?, operation, request).await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        terminal::display_result(&result);
    }
    Ok(result.ok)
}

async fn run<S: ChannelSource>(
    config: &Config,
    source: S,
    operation: Operation,
    request: &AnalysisRequest,
) -> AnalysisResult {
    let session = Arc::new(Session::with_timeout(source, config.fetch_timeout));
    let analyzer = Analyzer::new(session, Arc::new(StopWordDetector::new()));
    match operation {
        Operation::Analyze => analyzer.activity_intel(request).await,
        Operation::Scrape => analyzer.channel_scrape(request).await,
    }
}

fn normalize(target: &str) -> bool {
    if is_private_target(target) {
        println!("{} invite link (private channels are not supported)", "private:".red().bold());
        return false;
    }
    match TargetHandle::parse(target) {
        Ok(handle) => {
            println!("{handle}");
            true
        }
        Err(e) => {
            println!("{} {e}", "invalid:".red().bold());
            false
        }
    }
}
