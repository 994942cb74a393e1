use std::time::Duration;

use crate::errors::ChatError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the HTTP completion client.
#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// Full URL of the streaming completion endpoint.
    pub endpoint: String,
    /// Time allowed to establish the connection.
    pub connect_timeout: Duration,
    /// Optional limit on the whole request, body included.
    ///
    /// Unset by default: sessions have no built-in timeout and callers cancel
    /// them when they choose.
    pub timeout: Option<Duration>,
}

impl ChatClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
        }
    }

    /// Builds a config from `CHAT_STREAM_ENDPOINT` and the optional
    /// `CHAT_STREAM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ChatError> {
        let endpoint = std::env::var("CHAT_STREAM_ENDPOINT").unwrap_or_default();
        let timeout = std::env::var("CHAT_STREAM_TIMEOUT_SECS").ok();
        Self::from_values(&endpoint, timeout.as_deref())
    }

    fn from_values(endpoint: &str, timeout_secs: Option<&str>) -> Result<Self, ChatError> {
        if endpoint.trim().is_empty() {
            return Err(ChatError::Config(
                "missing CHAT_STREAM_ENDPOINT for the completion client".into(),
            ));
        }
        let mut config = Self::new(endpoint.trim());
        if let Some(raw) = timeout_secs.map(str::trim).filter(|s| !s.is_empty()) {
            let secs: u64 = raw.parse().map_err(|_| {
                ChatError::Config(format!("CHAT_STREAM_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_endpoint_is_config_error() {
        let err = ChatClientConfig::from_values("  ", None).expect_err("should fail");
        assert!(matches!(err, ChatError::Config(msg) if msg.contains("CHAT_STREAM_ENDPOINT")));
    }

    #[test]
    fn parses_optional_timeout() {
        let config =
            ChatClientConfig::from_values("http://localhost:3000/chat", Some("45")).expect("config");
        assert_eq!(config.endpoint, "http://localhost:3000/chat");
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ChatClientConfig::from_values("http://x", Some("soon")).expect_err("should fail");
        assert!(matches!(err, ChatError::Config(_)));
    }
}
