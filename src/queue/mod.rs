//! Message queue boundary.
//!
//! [`MessageQueue`] is the transport seam: resolve a destination name to a
//! concrete target, then send single messages to it. [`publish`] drives it
//! with one send per record. [`SqsQueue`] is the production transport.

mod publisher;
mod sqs;

pub use publisher::{publish, PublishError};
pub use sqs::SqsQueue;

use async_trait::async_trait;

/// A queue transport that delivers one message body at a time.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Resolves a destination identifier (e.g. a queue name) to the target
    /// passed to [`MessageQueue::send`].
    async fn resolve(&self, destination: &str) -> Result<String, PublishError>;

    /// Sends one message with the given body to a resolved target.
    async fn send(&self, target: &str, body: String) -> Result<(), PublishError>;
}
