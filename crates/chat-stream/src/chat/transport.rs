use tracing::{debug, warn};

use crate::body::ResponseBody;
use crate::errors::ChatError;

use super::config::ChatClientConfig;
use super::request::CompletionBody;

/// Sends a completion request and returns the established response.
///
/// Implementations return as soon as the status line is in; the body is left
/// for a `StreamSession` to consume.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, body: &CompletionBody) -> Result<ResponseBody, ChatError>;
}

/// `reqwest`-backed transport that POSTs JSON to the configured endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ChatClientConfig,
}

impl HttpTransport {
    pub fn new(config: ChatClientConfig) -> Result<Self, ChatError> {
        if config.endpoint.trim().is_empty() {
            return Err(ChatError::Config(
                "completion endpoint must not be empty".into(),
            ));
        }
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ChatError> {
        Self::new(ChatClientConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, body: &CompletionBody) -> Result<ResponseBody, ChatError> {
        debug!(
            endpoint = %self.config.endpoint,
            messages = body.messages.len(),
            "sending streamed completion request"
        );
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("completion request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.config.endpoint, %status, "completion endpoint rejected request");
        }
        Ok(ResponseBody::from(response))
    }
}
