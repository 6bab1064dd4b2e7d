//! Pending/fulfilled/rejected wrapper around one remote call.
//!
//! Every dispatch gets a process-wide increasing id and becomes the latest
//! action for its [`ActionKey`]. Outcomes are applied to the store only while
//! their id is still the latest for the key, so overlapping actions resolve in
//! issue order no matter which response arrives first.
//!
//! Optimistic changes made under one key stack up until the latest action
//! settles. If it fails, all of them are undone, newest first.

use std::{
    any::Any,
    collections::HashMap,
    future::{Future, IntoFuture},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::future::{self, AbortHandle, Abortable, Aborted, BoxFuture, FutureExt};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    api::ApiError,
    store::{Slice, Store},
};

pub const CANCELLED: &str = "request cancelled";

/// Groups actions by the state they write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    /// login and register
    Authenticate,
    /// profile read and write
    Profile,
    /// start and stop searching
    Searching,
    FindMatch,
    Matches,
    RespondToLink(String),
    /// plain and NFC unlock of one room
    Unlock(String),
    /// Sends only append, so each one gets a key of its own.
    SendMessage(Uuid),
}

impl ActionKey {
    pub fn send_message() -> ActionKey {
        ActionKey::SendMessage(Uuid::now_v7())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] ApiError),
    /// A newer action with the same key was issued; this outcome was not applied.
    #[error("superseded by a newer request")]
    Superseded,
    #[error("request cancelled")]
    Cancelled,
    /// Refused before reaching the network. No store was touched.
    #[error("{0}")]
    Blocked(String),
}

#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    in_flight: Mutex<HashMap<ActionKey, InFlight>>,
}

type Rollback<S> = Box<dyn FnOnce(&mut S) + Send>;

struct InFlight {
    id: u64,
    /// `Rollback<S>` for the store this key writes to.
    undo: Box<dyn Any + Send>,
}

type InFlightMap = HashMap<ActionKey, InFlight>;

/// Removes the key's entry if `id` still holds it.
fn take_latest(in_flight: &mut InFlightMap, key: &ActionKey, id: u64) -> Option<InFlight> {
    match in_flight.get(key) {
        Some(entry) if entry.id == id => in_flight.remove(key),
        _ => None,
    }
}

fn downcast_undo<S: 'static>(undo: Box<dyn Any + Send>) -> Option<Rollback<S>> {
    undo.downcast::<Rollback<S>>().ok().map(|undo| *undo)
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    fn in_flight(&self) -> MutexGuard<'_, InFlightMap> {
        self.inner.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_in_flight(&self, key: &ActionKey) -> bool {
        self.in_flight().contains_key(key)
    }

    /// Outcomes of actions already in flight for `key` will be dropped, and
    /// their optimistic changes are kept.
    pub fn invalidate(&self, key: &ActionKey) {
        if let Some(entry) = self.in_flight().remove(key) {
            debug!(?key, id = entry.id, "invalidated");
        }
    }

    pub fn dispatch<S, T, Fut, R>(
        &self,
        store: &Store<S>,
        key: ActionKey,
        call: Fut,
        fulfilled: R,
    ) -> Action<T>
    where
        S: Slice + Send + Sync + 'static,
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        R: FnOnce(&mut S, &T) + Send + 'static,
    {
        self.dispatch_optimistic(store, key, |_| (), call, fulfilled, |_, ()| {})
    }

    /// `optimistic` runs together with the pending transition and returns
    /// whatever `rollback` needs to undo it. A superseded action hands its
    /// undo on to the one that replaced it, so a failure of the latest action
    /// puts back the state from before the first unconfirmed change.
    pub fn dispatch_optimistic<S, T, P, Fut, O, R, B>(
        &self,
        store: &Store<S>,
        key: ActionKey,
        optimistic: O,
        call: Fut,
        fulfilled: R,
        rollback: B,
    ) -> Action<T>
    where
        S: Slice + Send + Sync + 'static,
        T: Send + 'static,
        P: Default + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        O: FnOnce(&mut S) -> P,
        R: FnOnce(&mut S, &T) + Send + 'static,
        B: FnOnce(&mut S, P) + Send + 'static,
    {
        let mut in_flight = self.in_flight();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = store.update(|state| {
            state.async_state_mut().begin();
            optimistic(state)
        });

        let undo: Rollback<S> = Box::new(move |state: &mut S| rollback(state, snapshot));
        let undo: Rollback<S> = match in_flight.remove(&key).and_then(|earlier| downcast_undo::<S>(earlier.undo)) {
            Some(earlier) => Box::new(move |state: &mut S| {
                undo(state);
                earlier(state);
            }),
            None => undo,
        };
        in_flight.insert(key.clone(), InFlight { id, undo: Box::new(undo) });
        drop(in_flight);
        debug!(?key, id, "pending");

        let (abort, registration) = AbortHandle::new_pair();
        let mut pending = Pending {
            dispatcher: self.clone(),
            store: store.clone(),
            key,
            id,
            settled: false,
        };

        let fut = async move {
            match Abortable::new(call, registration).await {
                Ok(Ok(payload)) => pending.fulfil(|state| fulfilled(state, &payload)).map(|()| payload),
                Ok(Err(err)) => Err(pending.reject(err)),
                Err(Aborted) => Err(pending.cancel()),
            }
        }
        .boxed();

        Action { id, abort, fut }
    }
}

/// The in-flight half of an action. Dropping it unsettled counts as a
/// cancellation.
struct Pending<S: Slice + 'static> {
    dispatcher: Dispatcher,
    store: Store<S>,
    key: ActionKey,
    id: u64,
    settled: bool,
}

impl<S: Slice + 'static> Pending<S> {
    fn fulfil(&mut self, reduce: impl FnOnce(&mut S)) -> Result<(), DispatchError> {
        self.settled = true;
        let mut in_flight = self.dispatcher.in_flight();
        if take_latest(&mut in_flight, &self.key, self.id).is_none() {
            debug!(key = ?self.key, id = self.id, "superseded, response dropped");
            return Err(DispatchError::Superseded);
        }

        self.store.update(|state| {
            reduce(state);
            state.async_state_mut().succeed();
        });
        debug!(key = ?self.key, id = self.id, "fulfilled");
        Ok(())
    }

    fn reject(&mut self, err: ApiError) -> DispatchError {
        if self.fail(err.to_string()) {
            warn!(key = ?self.key, id = self.id, error = %err, "rejected");
        } else {
            debug!(key = ?self.key, id = self.id, error = %err, "superseded, failure dropped");
        }
        DispatchError::Rejected(err)
    }

    fn cancel(&mut self) -> DispatchError {
        if self.fail(CANCELLED.to_owned()) {
            debug!(key = ?self.key, id = self.id, "cancelled");
        }
        DispatchError::Cancelled
    }

    fn fail(&mut self, message: String) -> bool {
        self.settled = true;
        let mut in_flight = self.dispatcher.in_flight();
        let Some(entry) = take_latest(&mut in_flight, &self.key, self.id) else {
            return false;
        };

        let undo = downcast_undo::<S>(entry.undo);
        self.store.update(|state| {
            if let Some(undo) = undo {
                undo(state);
            }
            state.async_state_mut().fail(message);
        });
        true
    }
}

impl<S: Slice + 'static> Drop for Pending<S> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.cancel();
        }
    }
}

/// A dispatched action. The pending transition has already happened; await it
/// for the outcome. Dropping it before it resolves cancels it.
#[must_use = "dropping an action cancels it"]
pub struct Action<T> {
    id: u64,
    abort: AbortHandle,
    fut: BoxFuture<'static, Result<T, DispatchError>>,
}

impl<T: Send + 'static> Action<T> {
    /// An action settled without dispatching anything.
    pub fn ready(result: Result<T, DispatchError>) -> Action<T> {
        let (abort, _) = AbortHandle::new_pair();
        Action {
            id: 0,
            abort,
            fut: future::ready(result).boxed(),
        }
    }
}

impl<T> Action<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Handle that cancels the action from elsewhere, e.g. when the view that
    /// started it goes away.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

impl<T> IntoFuture for Action<T> {
    type Output = Result<T, DispatchError>;
    type IntoFuture = BoxFuture<'static, Result<T, DispatchError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.fut
    }
}
