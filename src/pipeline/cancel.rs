// src/pipeline/cancel.rs
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Owns the cancellation signal of the single active run.
///
/// Starting a new run and closing the host context are the same primitive:
/// `start_new` signals whatever token is live and hands out a fresh one, so
/// at most one run is ever capable of making progress.
#[derive(Debug, Default)]
pub struct CancelController {
    active: Mutex<Option<CancellationToken>>,
}

impl CancelController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal and discard any live token, then create and return a new one.
    pub fn start_new(&self) -> CancellationToken {
        let mut active = self.active.lock().expect("cancel controller lock poisoned");
        if let Some(previous) = active.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *active = Some(token.clone());
        token
    }

    /// Signal the live token without replacing it. Signalling twice has the
    /// same effect as once; with no live token this is a no-op.
    pub fn cancel_active(&self) {
        let active = self.active.lock().expect("cancel controller lock poisoned");
        if let Some(token) = active.as_ref() {
            token.cancel();
        }
    }
}
