//! Single-fire completion guard

use futures::lock::Mutex;
use std::future::Future;
use std::sync::OnceLock;

/// Runs a completion action at most once and replays its outcome.
///
/// Callers that arrive while the action is running park on the lock and then
/// observe the stored outcome. If the running caller is cancelled before the
/// action finishes, nothing is stored and the next caller runs it again.
/// Reading the outcome never contends with waiters.
#[derive(Debug)]
pub struct CompletionGate<T> {
    /// Held only by the caller running the action
    running: Mutex<()>,
    outcome: OnceLock<T>,
}

impl<T: Clone> CompletionGate<T> {
    /// Create a gate that has not completed yet
    pub fn new() -> Self {
        Self {
            running: Mutex::new(()),
            outcome: OnceLock::new(),
        }
    }

    /// Return the stored outcome, running `complete` first if there is none
    pub async fn complete_with<F, Fut>(&self, complete: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(done) = self.outcome.get() {
            return done.clone();
        }
        let _running = self.running.lock().await;
        if let Some(done) = self.outcome.get() {
            return done.clone();
        }
        let done = complete().await;
        // Only set while `running` is held, so this is the first and only set.
        let _ = self.outcome.set(done.clone());
        done
    }

    /// The stored outcome, without waiting.
    ///
    /// Returns `None` while the action has not finished.
    pub fn peek(&self) -> Option<T> {
        self.outcome.get().cloned()
    }

    /// Whether the action has finished
    pub fn is_done(&self) -> bool {
        self.outcome.get().is_some()
    }
}

impl<T: Clone> Default for CompletionGate<T> {
    fn default() -> Self {
        Self::new()
    }
}
