use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt as _, stream};

use crate::errors::SessionError;

/// Boxed stream of raw reads from a response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, SessionError>> + Send + 'static>>;

/// An established HTTP response as consumed by a session: the status line plus
/// the body's byte stream.
pub struct ResponseBody {
    status: u16,
    stream: ByteStream,
}

impl ResponseBody {
    pub fn new(status: u16, stream: ByteStream) -> Self {
        Self { status, stream }
    }

    /// A `200` body that yields the given reads and then ends.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let reads: Vec<Result<Bytes, SessionError>> =
            chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(200, Box::pin(stream::iter(reads)))
    }

    /// A body whose status rejects the request before any read.
    pub fn with_status(status: u16) -> Self {
        Self::new(status, Box::pin(stream::empty()))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn into_stream(self) -> ByteStream {
        self.stream
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl From<reqwest::Response> for ResponseBody {
    fn from(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let stream = response
            .bytes_stream()
            .map(|read| read.map_err(|e| SessionError::transport(format!("body read failed: {e}"))));
        Self::new(status, Box::pin(stream))
    }
}
