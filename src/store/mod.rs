//! Observable in-memory state containers.
//!
//! A [`Store`] owns one slice of state. Every mutation runs to completion
//! inside [`Store::update`] before the next one starts, and subscribers are
//! woken afterwards with the new value.

pub mod matching;
pub mod session;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

pub use matching::MatchState;
pub use session::SessionState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Status and last error of the asynchronous actions writing to a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsyncState {
    pub status: Status,
    pub error: Option<String>,
}

impl AsyncState {
    /// Pending. Idempotent while already loading: overlapping actions share
    /// one loading phase.
    pub fn begin(&mut self) {
        self.status = Status::Loading;
        self.error = None;
    }

    pub fn succeed(&mut self) {
        self.status = Status::Succeeded;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Status::Failed;
        self.error = Some(message.into());
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// State that the dispatcher can drive through pending/fulfilled/rejected.
pub trait Slice {
    fn async_state(&self) -> &AsyncState;
    fn async_state_mut(&mut self) -> &mut AsyncState;
}

pub struct Store<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Store { tx: self.tx.clone() }
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Store::new(S::default())
    }
}

impl<S> Store<S> {
    pub fn new(initial: S) -> Store<S> {
        Store {
            tx: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Runs `f` against the state and notifies subscribers.
    pub fn update<R: Default>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut out = R::default();
        self.tx.send_modify(|state| out = f(state));
        out
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Clone> Store<S> {
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: u32,
        async_state: AsyncState,
    }

    #[test]
    fn begin_clears_previous_error() {
        let mut state = AsyncState::default();
        state.fail("boom");
        assert_eq!(state.status, Status::Failed);

        state.begin();
        assert!(state.is_loading());
        assert_eq!(state.error, None);

        state.succeed();
        assert_eq!(state.status, Status::Succeeded);
    }

    #[test]
    fn update_returns_closure_result() {
        let store = Store::new(Counter::default());
        let doubled = store.update(|counter| {
            counter.value = 21;
            counter.value * 2
        });
        assert_eq!(doubled, 42);
        assert_eq!(store.read(|counter| counter.value), 21);
        assert_eq!(store.snapshot().async_state, AsyncState::default());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let store = Store::new(Counter::default());
        let mut rx = store.subscribe();

        let writer = store.clone();
        writer.update(|counter| counter.value += 1);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().value, 1);
    }
}
