use crate::accumulator::Snapshot;
use crate::errors::SessionError;

type ChunkFn = Box<dyn FnMut(&Snapshot) + Send + 'static>;
type FinishFn = Box<dyn FnOnce(String) + Send + 'static>;
type ErrorFn = Box<dyn FnOnce(SessionError) + Send + 'static>;
type MalformedFn = Box<dyn FnMut(&str) + Send + 'static>;

/// Caller-supplied callbacks for one session.
///
/// `on_finish` and `on_error` are `FnOnce`: a session invokes at most one of
/// them, at most once. Unset callbacks are no-ops.
#[derive(Default)]
pub struct SessionCallbacks {
    on_chunk: Option<ChunkFn>,
    on_finish: Option<FinishFn>,
    on_error: Option<ErrorFn>,
    on_malformed: Option<MalformedFn>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the cumulative reply after every text delta.
    pub fn on_chunk(mut self, f: impl FnMut(&Snapshot) + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(f));
        self
    }

    /// Called once with the final reply on success.
    pub fn on_finish(mut self, f: impl FnOnce(String) + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    /// Called once with the failure cause.
    pub fn on_error(mut self, f: impl FnOnce(SessionError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called with the raw frame whenever a malformed frame is skipped.
    pub fn on_malformed(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_malformed = Some(Box::new(f));
        self
    }

    pub(crate) fn chunk(&mut self, snapshot: &Snapshot) {
        if let Some(f) = self.on_chunk.as_mut() {
            f(snapshot);
        }
    }

    pub(crate) fn finish(&mut self, text: String) {
        if let Some(f) = self.on_finish.take() {
            f(text);
        }
    }

    pub(crate) fn error(&mut self, cause: SessionError) {
        if let Some(f) = self.on_error.take() {
            f(cause);
        }
    }

    pub(crate) fn malformed(&mut self, raw: &str) {
        if let Some(f) = self.on_malformed.as_mut() {
            f(raw);
        }
    }
}

impl std::fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_malformed", &self.on_malformed.is_some())
            .finish()
    }
}
