//! Feed retrieval and article extraction.
//!
//! - [`fetcher`] - single-shot HTTP retrieval of a feed body
//! - [`parser`] - XML → `<item>` nodes, using `quick-xml`
//! - [`extract`] - item nodes → [`ArticleRecord`]s inside a [`TimeWindow`]

mod extract;
mod fetcher;
mod parser;

pub use extract::{
    extract, parse_pub_date, parse_timestamp, ArticleRecord, DateParseError, IntoUtc, TimeWindow,
    TimestampError,
};
pub use fetcher::{build_client, decode_body, fetch_feed, FetchError, DEFAULT_TIMEOUT};
pub use parser::{parse_items, ItemNode, ParseError};

/// Parses one feed body and extracts the articles inside `window`.
///
/// Malformed items are dropped individually; only a body that is not XML
/// fails the whole feed.
pub fn process_feed(raw: &str, window: &TimeWindow) -> Result<Vec<ArticleRecord>, ParseError> {
    let items = parse_items(raw)?;
    let total = items.len();
    let articles = extract(items, window);
    tracing::debug!(items = total, kept = articles.len(), "Processed feed");
    Ok(articles)
}
