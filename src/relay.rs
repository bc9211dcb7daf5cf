//! End-to-end run: configured routes → articles → queue messages.
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::feed::{fetch_feed, process_feed, ArticleRecord, FetchError, ParseError, TimeWindow};
use crate::message::{serialize, MessageBody};
use crate::queue::{publish, MessageQueue, PublishError};

/// Errors that abort a relay run.
///
/// Only per-item date problems are recovered inside extraction; everything
/// here stops the run at the first failure.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub routes: usize,
    pub articles: usize,
    pub published: usize,
}

/// Fetches and extracts every feed in `urls`, one at a time, in order.
///
/// Records keep the order of their feed and of their items within it.
pub async fn collect_articles(
    client: &reqwest::Client,
    urls: &[String],
    window: &TimeWindow,
    timeout: std::time::Duration,
) -> Result<Vec<ArticleRecord>, RelayError> {
    let mut articles = Vec::new();

    for url in urls {
        let raw = fetch_feed(client, url, timeout)
            .await
            .map_err(|source| RelayError::Fetch {
                url: url.clone(),
                source,
            })?;
        let mut extracted = process_feed(&raw, window).map_err(|source| RelayError::Parse {
            url: url.clone(),
            source,
        })?;

        tracing::info!(feed = %url, articles = extracted.len(), "Extracted articles");
        articles.append(&mut extracted);
    }

    Ok(articles)
}

/// Runs the relay once: every configured route is fetched and filtered to
/// `window`, then all articles are published to the configured queue.
pub async fn run<Q>(
    config: &Config,
    client: &reqwest::Client,
    queue: &Q,
    window: &TimeWindow,
) -> Result<RelaySummary, RelayError>
where
    Q: MessageQueue + ?Sized,
{
    let urls = config.feed_urls()?;
    tracing::info!(
        routes = urls.len(),
        start = %window.start(),
        end = %window.end(),
        "Starting relay run"
    );

    let articles = collect_articles(client, &urls, window, config.request_timeout()).await?;
    let messages: Vec<MessageBody> = articles.into_iter().map(serialize).collect();

    let published = publish(queue, &config.sqs_queue_name, &messages).await?;

    Ok(RelaySummary {
        routes: urls.len(),
        articles: messages.len(),
        published,
    })
}
