//! Route Guard for protected destinations

use crate::nav::Route;
use crate::session::SharedSessionStore;

/// Where a single navigation attempt ended up.
///
/// Every attempt starts unchecked and settles into exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// A live token was present; render the requested destination
    Authorized(Route),
    /// No live token; go to the login view. The original request is dropped.
    Redirected(Route),
}

impl GuardOutcome {
    /// Destination that should actually be rendered
    pub const fn destination(&self) -> &Route {
        match self {
            Self::Authorized(route) | Self::Redirected(route) => route,
        }
    }

    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Checks the session store on every protected render
#[derive(Clone)]
pub struct RouteGuard {
    store: SharedSessionStore,
}

impl RouteGuard {
    pub fn new(store: SharedSessionStore) -> Self {
        Self { store }
    }

    /// Decide `requested`. Unprotected routes pass through untouched.
    ///
    /// The store is read fresh each time; nothing is remembered between
    /// calls.
    pub fn check(&self, requested: Route) -> GuardOutcome {
        if !requested.is_protected() {
            return GuardOutcome::Authorized(requested);
        }

        if self.store.is_authenticated() {
            GuardOutcome::Authorized(requested)
        } else {
            tracing::debug!(requested = %requested, "No session, redirecting to login");
            GuardOutcome::Redirected(Route::Login)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionStore};
    use std::sync::Arc;

    fn guard() -> (RouteGuard, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (RouteGuard::new(store.clone()), store)
    }

    #[test]
    fn test_redirects_without_token() {
        let (guard, _) = guard();
        assert_eq!(
            guard.check(Route::Dashboard),
            GuardOutcome::Redirected(Route::Login)
        );
        assert_eq!(
            guard.check(Route::parse("/samples/tracking")),
            GuardOutcome::Redirected(Route::Login)
        );
    }

    #[test]
    fn test_authorizes_with_token() {
        let (guard, store) = guard();
        store.set("token", 7).unwrap();
        assert_eq!(
            guard.check(Route::Protected),
            GuardOutcome::Authorized(Route::Protected)
        );
    }

    #[test]
    fn test_unprotected_routes_pass() {
        let (guard, _) = guard();
        assert!(guard.check(Route::Landing).is_authorized());
        assert!(guard.check(Route::Login).is_authorized());
    }

    #[test]
    fn test_not_cached_between_checks() {
        let (guard, store) = guard();
        store.set("token", 7).unwrap();
        assert!(guard.check(Route::Dashboard).is_authorized());

        store.clear().unwrap();
        assert!(!guard.check(Route::Dashboard).is_authorized());
    }
}
