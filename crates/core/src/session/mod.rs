//! Session Store
//!
//! A single persisted, expiring token is the only piece of shared mutable
//! state in the portal. Every component that needs to know "is someone logged
//! in" asks the store again; nobody keeps a copy across a suspension point.
//!
//! Expiry is enforced when reading. Backends that cannot evict on their own
//! (a JSON file, a cookie jar edited by hand) still never hand out a token
//! past its `expires_at`.

mod clock;
mod file;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Persisted key the token lives under
pub const TOKEN_KEY: &str = "access_token";

/// Shared handle to the process-wide store
pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Opaque credential issued by the Auth Service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Token valid for `ttl_days` starting at `now`
    pub fn issue(
        value: impl Into<String>,
        ttl_days: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<Self> {
        let expires_at = Duration::try_days(i64::from(ttl_days))
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(StoreError::ExpiryOutOfRange { ttl_days })?;
        Ok(Self::new(value, expires_at))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Persistence for the one session token.
///
/// Implementations must honor expiry on `get` and must make a completed
/// `set`/`clear` visible to every later `get` in the process.
pub trait SessionStore: Send + Sync {
    /// Current token, or `None` when absent or expired
    fn get(&self) -> Option<SessionToken>;

    /// Persist `token` for `ttl_days`, replacing whatever was there
    fn set(&self, token: &str, ttl_days: u32) -> StoreResult<()>;

    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> StoreResult<()>;

    /// Fresh presence check
    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let token = SessionToken::issue("abc", 7, now).unwrap();

        assert_eq!(token.value(), "abc");
        assert_eq!(token.expires_at(), now + Duration::days(7));
        assert!(!token.is_expired_at(now + Duration::days(6)));
        assert!(token.is_expired_at(now + Duration::days(7)));
    }

    #[test]
    fn test_issue_rejects_unrepresentable_expiry() {
        let err = SessionToken::issue("abc", u32::MAX, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::ExpiryOutOfRange { ttl_days: u32::MAX }
        ));
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = SessionToken::issue("super-secret", 1, Utc::now()).unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));
    }
}
