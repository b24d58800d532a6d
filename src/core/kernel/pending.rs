use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// Callers waiting on a reply that the read loop will produce, keyed by correlation id
///
/// A waiter is registered before its request is sent and removed when it is
/// resolved or cancelled.
pub struct PendingRequests<T> {
    waiters: Mutex<HashMap<String, oneshot::Sender<T>>>,
}

impl<T> Default for PendingRequests<T> {
    fn default() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> PendingRequests<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter; an older waiter under the same id is dropped and sees a closed channel
    pub fn register(&self, id: impl Into<String>) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.into(), tx);
        rx
    }

    /// Hand `value` to the waiter for `id`, giving it back when nobody is waiting
    pub fn resolve(&self, id: &str, value: T) -> Result<(), T> {
        let waiter = self.lock().remove(id);
        match waiter {
            Some(tx) => tx.send(value),
            None => Err(value),
        }
    }

    pub fn cancel(&self, id: &str) {
        self.lock().remove(id);
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(|tx| !tx.is_closed())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, oneshot::Sender<T>>> {
        // Entries stay consistent even if a holder panicked mid-insert
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
