use std::sync::Arc;

use tracing::debug;

use crate::callbacks::SessionCallbacks;
use crate::errors::ChatError;
use crate::session::{SessionConfig, SessionHandle, SessionOutcome, StreamSession};

use super::config::ChatClientConfig;
use super::request::ChatRequest;
use super::transport::{ChatTransport, HttpTransport};

/// Sends chat requests and hands each response body to a fresh session.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    session_config: SessionConfig,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            session_config: SessionConfig::default(),
        }
    }

    /// Client over the default HTTP transport.
    pub fn http(config: ChatClientConfig) -> Result<Self, ChatError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Options applied to every session this client starts.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sends the request and starts streaming its reply into `callbacks`.
    ///
    /// A non-OK status is not an error here: the session fails with
    /// `SessionError::Status` through `on_error`.
    pub async fn stream(
        &self,
        request: &ChatRequest,
        callbacks: SessionCallbacks,
    ) -> Result<SessionHandle, ChatError> {
        let body = request.body()?;
        let response = self.transport.send(&body).await?;
        let session = StreamSession::new(self.session_config.clone());
        debug!(session_id = %session.id(), status = response.status(), "starting stream session");
        Ok(session.start(response, callbacks))
    }

    /// Streams the reply to completion and returns its final text.
    pub async fn collect_text(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let handle = self.stream(request, SessionCallbacks::new()).await?;
        match handle.outcome().await {
            SessionOutcome::Finished { final_text } => Ok(final_text),
            SessionOutcome::Failed { cause } => Err(ChatError::Session(cause)),
            SessionOutcome::Cancelled => Err(ChatError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ResponseBody;
    use crate::chat::message::ChatMessage;
    use crate::chat::request::CompletionBody;
    use crate::errors::SessionError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTransport {
        status: u16,
        reads: Vec<&'static str>,
        calls: AtomicUsize,
        sent: Mutex<Vec<CompletionBody>>,
    }

    impl FakeTransport {
        fn new(status: u16, reads: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                status,
                reads,
                calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for FakeTransport {
        async fn send(&self, body: &CompletionBody) -> Result<ResponseBody, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(body.clone());
            if self.status == 200 {
                Ok(ResponseBody::from_chunks(self.reads.clone()))
            } else {
                Ok(ResponseBody::with_status(self.status))
            }
        }
    }

    #[tokio::test]
    async fn collect_text_returns_streamed_reply() {
        let transport = FakeTransport::new(
            200,
            vec!["data: {\"delta\":\"4\"}\n", "data: [DONE]\n"],
        );
        let client = ChatClient::new(transport.clone());
        let request = ChatRequest::new("2 + 2?")
            .system_prompt("Answer with a number.")
            .history([ChatMessage::user("hi"), ChatMessage::assistant("hello")]);

        let text = client.collect_text(&request).await.expect("reply");
        assert_eq!(text, "4");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].stream);
        assert_eq!(sent[0].messages.len(), 4);
    }

    #[tokio::test]
    async fn non_ok_status_surfaces_as_session_failure() {
        let client = ChatClient::new(FakeTransport::new(500, vec![]));
        let err = client
            .collect_text(&ChatRequest::new("hello"))
            .await
            .expect_err("should fail");
        assert_eq!(err, ChatError::Session(SessionError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_transport() {
        let transport = FakeTransport::new(200, vec![]);
        let client = ChatClient::new(transport.clone());
        let err = client
            .collect_text(&ChatRequest::new(""))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ChatError::Validation(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stream_delivers_chunks_to_callbacks() {
        let transport = FakeTransport::new(
            200,
            vec!["data: {\"delta\":\"a\"}\ndata: {\"delta\":\"b\"}\n"],
        );
        let client = ChatClient::new(transport);
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = chunks.clone();
        let handle = client
            .stream(
                &ChatRequest::new("go"),
                SessionCallbacks::new().on_chunk(move |s| sink.lock().unwrap().push(s.to_string())),
            )
            .await
            .expect("start");

        assert_eq!(
            handle.outcome().await,
            SessionOutcome::Finished {
                final_text: "ab".into()
            }
        );
        assert_eq!(*chunks.lock().unwrap(), vec!["a", "ab"]);
    }
}
