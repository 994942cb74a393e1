use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt as _;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::accumulator::Accumulator;
use crate::body::ResponseBody;
use crate::callbacks::SessionCallbacks;
use crate::decoder::{FrameDecoder, StreamEvent};
use crate::errors::SessionError;
use crate::framer::{ByteFramer, Frame};

/// What a session does with a frame that is not valid JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Report through `on_malformed` and keep reading.
    #[default]
    Skip,
    /// End the session with `SessionError::Malformed`.
    Fail,
}

/// Per-session options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub malformed_policy: MalformedPolicy,
}

impl SessionConfig {
    pub fn malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }
}

/// Lifecycle state. `Finished`, `Failed` and `Cancelled` are absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Finished,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

/// The single terminal result of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished { final_text: String },
    Failed { cause: SessionError },
    Cancelled,
}

struct Shared {
    state: Mutex<SessionState>,
    abort_tx: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> SessionState {
        *self.lock()
    }

    fn begin(&self) {
        let mut state = self.lock();
        if *state == SessionState::Idle {
            *state = SessionState::Streaming;
        }
    }

    fn is_streaming(&self) -> bool {
        self.current() == SessionState::Streaming
    }

    /// Moves `Streaming` to a terminal state. Returns false if another
    /// transition (cancellation) already won.
    fn settle(&self, next: SessionState) -> bool {
        let mut state = self.lock();
        if *state != SessionState::Streaming {
            return false;
        }
        *state = next;
        true
    }

    fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.is_terminal() {
            return false;
        }
        *state = SessionState::Cancelled;
        self.abort_tx.send_replace(true);
        true
    }
}

/// Handle used to cancel a session, cloneable and usable from any thread.
#[derive(Clone)]
pub struct AbortHandle {
    shared: Arc<Shared>,
}

impl AbortHandle {
    /// Cancels the session if it has not reached a terminal state.
    ///
    /// Returns true when this call moved the session to `Cancelled`. See
    /// [`SessionHandle::cancel`] for which callbacks can still run afterwards.
    pub fn abort(&self) -> bool {
        self.shared.cancel()
    }
}

/// One streamed response, from start to a single terminal outcome.
pub struct StreamSession {
    id: uuid::Uuid,
    config: SessionConfig,
    shared: Arc<Shared>,
}

impl StreamSession {
    pub fn new(config: SessionConfig) -> Self {
        let (abort_tx, _) = watch::channel(false);
        Self {
            id: uuid::Uuid::new_v4(),
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                abort_tx,
            }),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.current()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            shared: self.shared.clone(),
        }
    }

    /// Spawns the pull loop on the current tokio runtime.
    pub fn start(self, body: ResponseBody, callbacks: SessionCallbacks) -> SessionHandle {
        let id = self.id;
        let shared = self.shared.clone();
        shared.begin();
        let task = tokio::spawn(self.run(body, callbacks));
        SessionHandle { id, shared, task }
    }

    /// Drives the pull loop on the calling task until a terminal outcome.
    ///
    /// Cancel through a handle obtained from `abort_handle()` beforehand.
    pub async fn run(self, body: ResponseBody, callbacks: SessionCallbacks) -> SessionOutcome {
        self.shared.begin();
        let abort_rx = self.shared.abort_tx.subscribe();
        let runner = Runner {
            id: self.id,
            config: self.config,
            shared: self.shared,
            framer: ByteFramer::new(),
            decoder: FrameDecoder::new(),
            accumulator: Accumulator::new(),
            callbacks,
        };
        let outcome = runner.drive(body, abort_rx).await;
        match &outcome {
            SessionOutcome::Finished { final_text } => {
                info!(session_id = %self.id, reply_len = final_text.len(), "stream session finished")
            }
            SessionOutcome::Failed { cause } => {
                warn!(session_id = %self.id, error = %cause, "stream session failed")
            }
            SessionOutcome::Cancelled => info!(session_id = %self.id, "stream session cancelled"),
        }
        outcome
    }
}

/// Handle to a spawned session.
///
/// Dropping the handle does not cancel the session.
pub struct SessionHandle {
    id: uuid::Uuid,
    shared: Arc<Shared>,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.current()
    }

    /// Cancels the session. A no-op returning false once a terminal state
    /// has been reached.
    ///
    /// The loop checks the state once per frame, before the frame touches the
    /// reply buffer, and runs callbacks without holding the state lock so a
    /// callback may itself cancel. A `cancel()` from another thread that lands
    /// while a frame is already past that check can therefore still be
    /// followed by that frame's `on_chunk` or `on_malformed`. `on_finish` and
    /// `on_error` are never delivered after a successful `cancel()`.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            shared: self.shared.clone(),
        }
    }

    /// Waits for the session task and returns its outcome.
    pub async fn outcome(self) -> SessionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(_) if self.shared.current() == SessionState::Cancelled => {
                SessionOutcome::Cancelled
            }
            Err(err) => {
                self.shared.settle(SessionState::Failed);
                SessionOutcome::Failed {
                    cause: SessionError::Internal(err.to_string()),
                }
            }
        }
    }
}

enum Step {
    Continue,
    Done,
    Stop(SessionOutcome),
}

struct Runner {
    id: uuid::Uuid,
    config: SessionConfig,
    shared: Arc<Shared>,
    framer: ByteFramer,
    decoder: FrameDecoder,
    accumulator: Accumulator,
    callbacks: SessionCallbacks,
}

impl Runner {
    async fn drive(
        mut self,
        body: ResponseBody,
        mut abort_rx: watch::Receiver<bool>,
    ) -> SessionOutcome {
        if !body.is_success() {
            let status = body.status();
            return self.fail(SessionError::Status { status });
        }

        let mut stream = body.into_stream();
        loop {
            let read = tokio::select! {
                biased;
                _ = wait_for_abort(&mut abort_rx) => return SessionOutcome::Cancelled,
                read = stream.next() => read,
            };
            match read {
                Some(Ok(chunk)) => {
                    debug!(session_id = %self.id, bytes = chunk.len(), "read chunk");
                    for frame in self.framer.feed(&chunk) {
                        match self.apply_frame(&frame) {
                            Step::Continue => {}
                            Step::Done => return self.finish(),
                            Step::Stop(outcome) => return outcome,
                        }
                    }
                }
                Some(Err(err)) => return self.fail(err),
                None => return self.finish(),
            }
        }
    }

    fn apply_frame(&mut self, frame: &Frame) -> Step {
        // Nothing reaches the accumulator or the callbacks once cancelled.
        if !self.shared.is_streaming() {
            return Step::Stop(SessionOutcome::Cancelled);
        }
        let event = self.decoder.decode(frame);
        match event {
            StreamEvent::Delta { .. } => {
                let snapshot = self.accumulator.apply(&event);
                debug!(
                    session_id = %self.id,
                    deltas = self.accumulator.delta_count(),
                    reply_len = snapshot.len(),
                    "applied delta"
                );
                self.callbacks.chunk(&snapshot);
                Step::Continue
            }
            StreamEvent::Keepalive => Step::Continue,
            StreamEvent::Done => Step::Done,
            StreamEvent::Malformed { raw } => match self.config.malformed_policy {
                MalformedPolicy::Skip => {
                    warn!(session_id = %self.id, frame = %raw, "skipping malformed frame");
                    self.callbacks.malformed(&raw);
                    Step::Continue
                }
                MalformedPolicy::Fail => Step::Stop(self.fail(SessionError::Malformed { raw })),
            },
            StreamEvent::Upstream { message } => {
                Step::Stop(self.fail(SessionError::Upstream(message)))
            }
        }
    }

    fn finish(&mut self) -> SessionOutcome {
        if let Some(frame) = self.framer.finish() {
            match self.apply_frame(&frame) {
                Step::Continue | Step::Done => {}
                Step::Stop(outcome) => return outcome,
            }
        }
        if !self.shared.settle(SessionState::Finished) {
            return SessionOutcome::Cancelled;
        }
        let final_text = std::mem::take(&mut self.accumulator).into_text();
        self.callbacks.finish(final_text.clone());
        SessionOutcome::Finished { final_text }
    }

    fn fail(&mut self, cause: SessionError) -> SessionOutcome {
        if !self.shared.settle(SessionState::Failed) {
            return SessionOutcome::Cancelled;
        }
        debug!(
            session_id = %self.id,
            partial_len = self.accumulator.len(),
            "session failed with partial reply"
        );
        self.callbacks.error(cause.clone());
        SessionOutcome::Failed { cause }
    }
}

async fn wait_for_abort(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
