//! Session Observer
//!
//! Keeps the in-memory "is logged in" flag in step with the session store as
//! the user moves around. The store can change behind our back (expiry, a
//! hand-edited jar, logout elsewhere), so every navigation re-reads it, and a
//! single deferred re-check shortly after each navigation catches writes that
//! raced the navigation itself.
//!
//! The deferred re-check is scoped: a newer navigation or dropping the
//! observer cancels it, so a late timer can never resurrect stale state.

use crate::session::SharedSessionStore;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

struct ViewState {
    store: SharedSessionStore,
    logged_in: watch::Sender<bool>,
}

impl ViewState {
    /// Publish the store's current answer if it differs from the view
    fn resync(&self, reason: &'static str) -> bool {
        let observed = self.store.is_authenticated();
        let changed = self.logged_in.send_if_modified(|current| {
            if *current == observed {
                false
            } else {
                *current = observed;
                true
            }
        });

        if changed {
            tracing::debug!(logged_in = observed, reason, "Session view state changed");
        }
        changed
    }
}

pub struct SessionObserver {
    view: Arc<ViewState>,
    resync_delay: Duration,
    scope: CancellationToken,
    pending: Mutex<Option<CancellationToken>>,
    current_path: Mutex<Option<String>>,
}

impl SessionObserver {
    pub fn new(store: SharedSessionStore, resync_delay: Duration) -> Self {
        let (logged_in, _) = watch::channel(store.is_authenticated());
        Self {
            view: Arc::new(ViewState { store, logged_in }),
            resync_delay,
            scope: CancellationToken::new(),
            pending: Mutex::new(None),
            current_path: Mutex::new(None),
        }
    }

    /// Last published view state
    pub fn is_logged_in(&self) -> bool {
        *self.view.logged_in.borrow()
    }

    /// Follow view state changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.view.logged_in.subscribe()
    }

    /// Re-read the store now. Returns whether the view state flipped.
    pub fn resync(&self) -> bool {
        self.view.resync("explicit")
    }

    /// React to a navigation. Repeated notifications for the same path are
    /// ignored. Returns whether the view state flipped.
    ///
    /// Must be called from within a Tokio runtime; the deferred re-check is
    /// spawned onto it.
    pub fn on_navigate(&self, path: &str) -> bool {
        {
            let mut current = self
                .current_path
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if current.as_deref() == Some(path) {
                return false;
            }
            *current = Some(path.to_string());
        }

        let changed = self.view.resync("navigation");
        self.schedule_resync();
        changed
    }

    fn schedule_resync(&self) {
        let token = self.scope.child_token();
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let view = Arc::clone(&self.view);
        let delay = self.resync_delay;
        tracing::trace!(delay_ms = delay.as_millis(), "Scheduling deferred session resync");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::trace!("Deferred session resync cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    view.resync("deferred");
                }
            }
        });
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
