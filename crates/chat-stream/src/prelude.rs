//! Common imports for typical usage.
pub use crate::{
    AbortHandle, ChatClient, ChatClientConfig, ChatError, ChatMessage, ChatRequest, Conversation,
    ImageAttachment, MalformedPolicy, ResponseBody, SessionCallbacks, SessionConfig, SessionError,
    SessionHandle, SessionOutcome, SessionState, Snapshot, StreamSession,
};
