//! Streaming consumer for token-streamed chat completions.
//!
//! A `StreamSession` reads a chunked response body, re-frames it into
//! `\n`-delimited records, decodes each record into a `StreamEvent`, and
//! accumulates text deltas into the reply. Callers observe progress through
//! `SessionCallbacks`; every session ends in exactly one `SessionOutcome`.
//!
//! # Usage
//!
//! ```no_run
//! use chat_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let client = ChatClient::http(ChatClientConfig::from_env()?)?;
//! let request = ChatRequest::new("Explain relativity in one line.")
//!     .system_prompt("You are a concise assistant.");
//!
//! let handle = client
//!     .stream(
//!         &request,
//!         SessionCallbacks::new()
//!             .on_chunk(|reply| println!("so far: {reply}"))
//!             .on_finish(|text| println!("done: {text}"))
//!             .on_error(|cause| eprintln!("failed: {cause}")),
//!     )
//!     .await?;
//! let _ = handle.outcome().await;
//! # Ok(())
//! # }
//! ```

/// Reply buffer and immutable snapshots.
pub mod accumulator;
/// Response status plus byte stream consumed by a session.
pub mod body;
/// Caller-supplied session callbacks.
pub mod callbacks;
/// Chat request construction and HTTP transport.
pub mod chat;
/// Frame classification into stream events.
pub mod decoder;
/// Public error types.
pub mod errors;
/// Byte-to-frame segmentation.
pub mod framer;
/// Process-wide tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Session state machine, pull loop and cancellation.
pub mod session;

pub use accumulator::{Accumulator, Snapshot};
pub use body::{ByteStream, ResponseBody};
pub use callbacks::SessionCallbacks;
pub use chat::{
    ChatClient, ChatClientConfig, ChatMessage, ChatRequest, ChatTransport, CompletionBody,
    Conversation, HttpTransport, ImageAttachment, Role,
};
pub use decoder::{DONE_SENTINEL, FrameDecoder, StreamEvent};
pub use errors::{ChatError, SessionError};
pub use framer::{ByteFramer, Frame};
pub use session::{
    AbortHandle, MalformedPolicy, SessionConfig, SessionHandle, SessionOutcome, SessionState,
    StreamSession,
};
