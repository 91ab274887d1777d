//! The shared observable state container.

use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::sync::watch;

use cleanspot_protocol::AppState;
use cleanspot_protocol::Transition;
use cleanspot_protocol::reduce;

/// Holds the state tree and publishes every committed transition.
///
/// Commits are atomic: the tree is reduced and replaced under one lock,
/// so a reader never observes fields from two different transitions.
#[derive(Debug)]
pub struct Store {
    state: Mutex<AppState>,
    tx: watch::Sender<AppState>,
}

impl Store {
    pub fn new() -> Self {
        let initial = AppState::default();
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            state: Mutex::new(initial),
            tx,
        }
    }

    /// Applies one transition through the pure reducer and publishes the
    /// resulting tree.
    pub fn commit(&self, transition: &Transition) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = reduce(&state, transition);
        *state = next.clone();
        self.tx.send_replace(next);
    }

    /// A snapshot of the current tree.
    pub fn state(&self) -> AppState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A receiver that observes every committed tree.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
