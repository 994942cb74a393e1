//! Request side of a chat exchange: message history, the streamed completion
//! body, and the HTTP transport that produces a `ResponseBody`.
mod client;
mod config;
mod message;
mod request;
mod transport;

pub use client::ChatClient;
pub use config::ChatClientConfig;
pub use message::{ChatMessage, Conversation, Role};
pub use request::{ChatRequest, CompletionBody, ImageAttachment};
pub use transport::{ChatTransport, HttpTransport};
