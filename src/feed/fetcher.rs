use encoding_rs::Encoding;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout for feed retrieval.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
/// Leading bytes searched for an `<?xml ... encoding="..."?>` declaration.
const DECLARATION_SNIFF_LEN: usize = 1024;

/// Errors that can occur while retrieving a feed body.
///
/// There is no retry: every variant is final for the request that raised it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Builds the HTTP client shared by every feed request of a run.
pub fn build_client() -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("feedrelay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Retrieves the raw body of the feed at `url`.
///
/// Performs a single GET bounded by `timeout`. The body is decoded with
/// [`decode_body`], replacing invalid sequences.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - Request exceeded `timeout`
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response (429 and 5xx included)
/// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    tokio::time::timeout(timeout, fetch_body(client, url))
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        tracing::warn!(feed = %url, status = %response.status(), "Feed request failed");
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(feed = %url, bytes = bytes.len(), "Fetched feed");

    Ok(decode_body(&bytes, content_type.as_deref()))
}

/// Decodes a feed body to text.
///
/// The encoding comes from, in order: a byte order mark, the `charset`
/// parameter of `content_type`, the XML declaration, then UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_declaration(bytes))
        .unwrap_or(encoding_rs::UTF_8);

    // `decode` sniffs the BOM itself and lets it override `encoding`.
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = used.name(), "Feed body contains invalid byte sequences");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn charset_from_declaration(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(DECLARATION_SNIFF_LEN)]);

    let decl = head.trim_start_matches('\u{feff}').trim_start();
    let decl = decl.strip_prefix("<?xml")?;
    let decl = &decl[..decl.find("?>")?];

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let value = &value[..value.find(quote)?];

    // An ASCII-readable declaration naming UTF-16 cannot be UTF-16 itself.
    Encoding::for_label(value.as_bytes()).map(Encoding::output_encoding)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
