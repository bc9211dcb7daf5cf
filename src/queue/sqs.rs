use async_trait::async_trait;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::DisplayErrorContext;

use super::{MessageQueue, PublishError};

/// Amazon SQS transport.
///
/// Destinations are queue names, resolved to queue URLs with `GetQueueUrl`.
#[derive(Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
}

impl std::fmt::Debug for SqsQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsQueue")
            .field("client", &"<aws_sdk_sqs::Client>")
            .finish()
    }
}

impl SqsQueue {
    /// Builds a client for `region` from the default credential chain.
    ///
    /// `endpoint_url` overrides the service endpoint, e.g. for a local emulator.
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        tracing::debug!(region = %region, endpoint = ?endpoint_url, "Created SQS client");
        Self::from_client(aws_sdk_sqs::Client::new(&sdk_config))
    }

    pub fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn resolve(&self, destination: &str) -> Result<String, PublishError> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(destination)
            .send()
            .await
            .map_err(|e| PublishError::Resolve {
                destination: destination.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| PublishError::Resolve {
                destination: destination.to_string(),
                reason: "response carried no queue URL".to_string(),
            })
    }

    async fn send(&self, target: &str, body: String) -> Result<(), PublishError> {
        let output = self
            .client
            .send_message()
            .queue_url(target)
            .message_body(body)
            .send()
            .await
            .map_err(|e| PublishError::Send(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(message_id = ?output.message_id(), "Sent message");
        Ok(())
    }
}
