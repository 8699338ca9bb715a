//! Backend reachability
//!
//! The portal refuses to show anything protected until it knows the Auth
//! Service is alive. The check runs once at boot, is never retried, and its
//! answer is frozen for the rest of the application's life.

use crate::client::{AuthApi, ClientError};
use crate::error::FatalError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

/// Process-wide liveness verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Unknown,
    Reachable,
    Unreachable,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::Reachable => "reachable",
            Self::Unreachable => "unreachable",
        })
    }
}

/// Set-once holder for [`Reachability`].
///
/// Reads `Unknown` until the boot probe resolves it; after that the value
/// never changes.
#[derive(Debug, Default)]
pub struct ReachabilityCell {
    inner: OnceLock<Reachability>,
}

impl ReachabilityCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Reachability {
        self.inner.get().copied().unwrap_or(Reachability::Unknown)
    }

    /// Record the verdict. Returns `false` if one was already recorded.
    pub fn resolve(&self, value: Reachability) -> bool {
        if value == Reachability::Unknown {
            return false;
        }
        let accepted = self.inner.set(value).is_ok();
        if !accepted {
            tracing::warn!(attempted = %value, current = %self.get(), "Reachability already resolved, ignoring");
        }
        accepted
    }
}

/// One-shot liveness check against the Auth Service root
pub struct ReachabilityProber {
    api: Arc<dyn AuthApi>,
    timeout: Duration,
}

impl ReachabilityProber {
    pub fn new(api: Arc<dyn AuthApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Probe `base_url`.
    ///
    /// An absent URL fails with [`FatalError::ConfigMissing`] without touching
    /// the network. Every network-level failure, timeout and non-2xx status
    /// collapses to [`FatalError::BackendUnreachable`].
    pub async fn probe(&self, base_url: Option<&Url>) -> Result<(), FatalError> {
        let Some(base_url) = base_url else {
            tracing::error!(code = FatalError::ConfigMissing.code(), "Auth Service URL is not configured, skipping probe");
            return Err(FatalError::ConfigMissing);
        };

        tracing::info!(url = %base_url, "Probing Auth Service");

        let result = match tokio::time::timeout(self.timeout, self.api.ping(base_url)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };

        match result {
            Ok(()) => {
                tracing::info!(url = %base_url, "Auth Service is reachable");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    url = %base_url,
                    code = FatalError::BackendUnreachable.code(),
                    error = %e,
                    "Auth Service is unreachable"
                );
                Err(FatalError::BackendUnreachable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockAuthApi;

    fn base() -> Url {
        Url::parse("http://auth.test/").unwrap()
    }

    #[test]
    fn test_cell_starts_unknown_and_resolves_once() {
        let cell = ReachabilityCell::new();
        assert_eq!(cell.get(), Reachability::Unknown);

        assert!(cell.resolve(Reachability::Reachable));
        assert!(!cell.resolve(Reachability::Unreachable));
        assert_eq!(cell.get(), Reachability::Reachable);
    }

    #[test]
    fn test_cell_ignores_unknown() {
        let cell = ReachabilityCell::new();
        assert!(!cell.resolve(Reachability::Unknown));
        assert!(cell.resolve(Reachability::Unreachable));
    }

    #[tokio::test]
    async fn test_missing_url_never_calls_network() {
        let mut api = MockAuthApi::new();
        api.expect_ping().times(0);
        api.expect_login().times(0);

        let prober = ReachabilityProber::new(Arc::new(api), Duration::from_secs(1));
        assert_eq!(prober.probe(None).await, Err(FatalError::ConfigMissing));
    }

    #[tokio::test]
    async fn test_success_is_reachable() {
        let mut api = MockAuthApi::new();
        api.expect_ping().times(1).returning(|_| Ok(()));

        let prober = ReachabilityProber::new(Arc::new(api), Duration::from_secs(1));
        assert_eq!(prober.probe(Some(&base())).await, Ok(()));
    }

    #[tokio::test]
    async fn test_error_status_is_unreachable() {
        let mut api = MockAuthApi::new();
        api.expect_ping().times(1).returning(|_| {
            Err(ClientError::ServerError {
                status: 502,
                message: "bad gateway".to_string(),
            })
        });

        let prober = ReachabilityProber::new(Arc::new(api), Duration::from_secs(1));
        assert_eq!(
            prober.probe(Some(&base())).await,
            Err(FatalError::BackendUnreachable)
        );
    }
}
