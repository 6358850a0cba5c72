//! Single-slot human confirmation handshake.
//!
//! A tool about to perform a destructive side effect awaits
//! [`ConfirmationGate::request_confirmation`]; the UI answers with
//! [`ConfirmationGate::send_response`]. Each request gets a fresh oneshot
//! channel, so a stale answer from an earlier request can never leak into a
//! new one. Timeouts count as rejection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Default time to wait for a human decision.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Invoked once when a request times out.
pub type TimeoutCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct GateState {
    pending: bool,
    /// Identifies the outstanding request so a late timeout cannot clear a
    /// newer one.
    request_id: u64,
    responder: Option<oneshot::Sender<bool>>,
    timeout: Option<Duration>,
    on_timeout: Option<TimeoutCallback>,
}

/// Reusable approve/reject handshake between a worker and a UI.
#[derive(Default)]
pub struct ConfirmationGate {
    state: Mutex<GateState>,
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ConfirmationGate")
            .field("pending", &state.pending)
            .field("timeout", &state.timeout)
            .finish()
    }
}

impl ConfirmationGate {
    pub fn new(timeout: Duration) -> Self {
        let gate = Self::default();
        gate.set_timeout(timeout);
        gate
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().timeout = Some(timeout);
    }

    pub fn timeout(&self) -> Duration {
        self.lock().timeout.unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT)
    }

    /// Register a hook run when a request times out.
    pub fn set_timeout_callback(&self, callback: Option<TimeoutCallback>) {
        self.lock().on_timeout = callback;
    }

    /// True while a request is waiting for an answer.
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Block until a response arrives or the timeout elapses.
    ///
    /// Returns `false` on rejection, timeout, or when superseded by a newer
    /// request.
    pub async fn request_confirmation(&self) -> bool {
        self.request_confirmation_then(|| {}).await
    }

    /// Like [`request_confirmation`](Self::request_confirmation), but runs
    /// `notify` once the request is registered and before waiting.
    ///
    /// Emitting the prompt from `notify` guarantees an answer sent straight
    /// back from the prompt handler lands on this request.
    pub async fn request_confirmation_then(&self, notify: impl FnOnce()) -> bool {
        let (tx, rx) = oneshot::channel();
        let (request_id, timeout) = {
            let mut state = self.lock();
            // Dropping any previous responder discards its stale answer.
            state.responder = Some(tx);
            state.pending = true;
            state.request_id = state.request_id.wrapping_add(1);
            (
                state.request_id,
                state.timeout.unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT),
            )
        };
        tracing::debug!(request_id, ?timeout, "waiting for confirmation");
        notify();

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(approved)) => {
                tracing::debug!(request_id, approved, "confirmation answered");
                approved
            }
            Ok(Err(_)) => {
                tracing::debug!(request_id, "confirmation superseded");
                false
            }
            Err(_) => {
                let callback = {
                    let mut state = self.lock();
                    if state.request_id != request_id {
                        return false;
                    }
                    state.pending = false;
                    state.responder = None;
                    state.on_timeout.clone()
                };
                tracing::warn!(request_id, ?timeout, "confirmation timed out; rejecting");
                if let Some(callback) = callback {
                    callback();
                }
                false
            }
        }
    }

    /// Answer the outstanding request. No-op when nothing is pending.
    pub fn send_response(&self, approved: bool) {
        let responder = {
            let mut state = self.lock();
            if !state.pending {
                return;
            }
            state.pending = false;
            state.responder.take()
        };
        if let Some(responder) = responder {
            // The requester may have given up already; that is fine.
            let _ = responder.send(approved);
        }
    }

    /// Reject the outstanding request.
    pub fn cancel(&self) {
        self.send_response(false);
    }
}
