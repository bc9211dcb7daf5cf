use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedrelay::config::Config;
use feedrelay::feed::{build_client, TimeWindow};
use feedrelay::queue::SqsQueue;
use feedrelay::relay;

#[derive(Parser, Debug)]
#[command(
    name = "feedrelay",
    version,
    about = "Publish RSS articles from a time window to a queue"
)]
struct Args {
    /// Start of the time window (ISO-8601, inclusive; no offset means UTC)
    start_datetime: String,

    /// End of the time window (ISO-8601, inclusive; no offset means UTC)
    end_datetime: String,

    /// Path to the TOML configuration file
    #[arg(long, value_name = "FILE", default_value = "config/config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let window = TimeWindow::parse(&args.start_datetime, &args.end_datetime)
        .context("Invalid time window")?;
    if window.start() > window.end() {
        tracing::warn!(
            start = %window.start(),
            end = %window.end(),
            "Start is after end, only undated articles can match"
        );
    }

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let client = build_client().context("Failed to build HTTP client")?;
    let queue = SqsQueue::connect(&config.aws_region, config.sqs_endpoint_url.as_deref()).await;

    let summary = relay::run(&config, &client, &queue, &window)
        .await
        .context("Relay run failed")?;

    tracing::info!(
        routes = summary.routes,
        articles = summary.articles,
        published = summary.published,
        "Relay run complete"
    );
    Ok(())
}
