use super::{Clock, SessionStore, SessionToken, SystemClock};
use crate::error::StoreResult;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process store; nothing survives a restart
pub struct MemorySessionStore {
    record: Mutex<Option<SessionToken>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            record: Mutex::new(None),
            clock,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionToken> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        if record.as_ref().is_some_and(|token| token.is_expired_at(now)) {
            tracing::debug!("Session token expired, evicting");
            *record = None;
        }

        record.clone()
    }

    fn set(&self, token: &str, ttl_days: u32) -> StoreResult<()> {
        let issued = SessionToken::issue(token, ttl_days, self.clock.now())?;
        tracing::debug!(expires_at = %issued.expires_at(), "Storing session token");
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(issued);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        tracing::debug!("Clearing session token");
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use chrono::Duration;

    fn store_with_clock() -> (MemorySessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (MemorySessionStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_set_then_get_returns_same_value() {
        let (store, _) = store_with_clock();
        store.set("token-1", 7).unwrap();
        assert_eq!(store.get().unwrap().value(), "token-1");
    }

    #[test]
    fn test_set_overwrites() {
        let (store, _) = store_with_clock();
        store.set("first", 7).unwrap();
        store.set("second", 7).unwrap();
        assert_eq!(store.get().unwrap().value(), "second");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _) = store_with_clock();
        store.clear().unwrap();
        assert!(store.get().is_none());

        store.set("token", 7).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let (store, _) = store_with_clock();
        store.set("kept", 7).unwrap();

        assert!(store.set("t", 200_000_000).is_err());
        assert_eq!(store.get().unwrap().value(), "kept");
    }

    #[test]
    fn test_get_honors_expiry() {
        let (store, clock) = store_with_clock();
        store.set("token", 7).unwrap();

        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert!(store.is_authenticated());

        clock.advance(Duration::seconds(1));
        assert!(store.get().is_none());

        // Stays gone even if the clock were to move backwards
        clock.advance(Duration::days(-1));
        assert!(store.get().is_none());
    }
}
