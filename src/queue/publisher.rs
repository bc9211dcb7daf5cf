use thiserror::Error;

use super::MessageQueue;
use crate::message::MessageBody;

/// Errors raised while publishing records to a queue.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The destination could not be resolved to a concrete target.
    #[error("Failed to resolve queue {destination:?}: {reason}")]
    Resolve { destination: String, reason: String },

    /// A record could not be encoded as JSON.
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The transport rejected a single message.
    #[error("Failed to send message: {0}")]
    Send(String),

    /// A send failed partway through a publish; earlier messages were delivered.
    #[error("Message {index} of {total} not delivered: {source}")]
    Aborted {
        index: usize,
        total: usize,
        #[source]
        source: Box<PublishError>,
    },
}

/// Publishes each record as its own message to `destination`.
///
/// The destination is resolved once, then records are sent sequentially in
/// order. There is no batching, retry, or rollback: the first failed send
/// stops the loop and is returned as [`PublishError::Aborted`], with every
/// earlier message already delivered.
///
/// Returns the number of messages sent.
pub async fn publish<Q>(
    queue: &Q,
    destination: &str,
    records: &[MessageBody],
) -> Result<usize, PublishError>
where
    Q: MessageQueue + ?Sized,
{
    if records.is_empty() {
        tracing::info!(queue = %destination, "No messages to publish");
        return Ok(0);
    }

    let target = queue.resolve(destination).await?;
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        let sent = match record.to_json() {
            Ok(body) => queue.send(&target, body).await,
            Err(e) => Err(PublishError::Encode(e)),
        };
        sent.map_err(|source| PublishError::Aborted {
            index,
            total,
            source: Box::new(source),
        })?;
    }

    tracing::info!(queue = %destination, messages = total, "Published messages");
    Ok(total)
}
