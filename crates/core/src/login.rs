//! Login Flow
//!
//! Exchanges credentials for a token and stores it. Failure never touches the
//! store, and whatever went wrong the user sees the same message; the actual
//! cause is only logged.

use crate::client::{AuthApi, ClientError, Credentials};
use crate::error::{AuthError, AuthFailureKind};
use crate::nav::Route;
use crate::session::SharedSessionStore;
use std::sync::Arc;
use url::Url;

/// What the login view should do when it appears
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMount {
    /// A live session exists; skip the form
    Redirect(Route),
    ShowForm,
}

impl From<&ClientError> for AuthFailureKind {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Serialization(_) | ClientError::InvalidResponse(_) => Self::MalformedBody,
            other => other
                .status()
                .map_or(Self::Network, |status| Self::Rejected { status }),
        }
    }
}

pub struct LoginFlow {
    api: Arc<dyn AuthApi>,
    store: SharedSessionStore,
    base_url: Url,
    ttl_days: u32,
}

impl LoginFlow {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: SharedSessionStore,
        base_url: Url,
        ttl_days: u32,
    ) -> Self {
        Self {
            api,
            store,
            base_url,
            ttl_days,
        }
    }

    /// Destination after a successful login
    pub const fn destination() -> Route {
        Route::Dashboard
    }

    /// Decide whether to prompt for credentials at all
    pub fn mount(&self) -> LoginMount {
        if self.store.is_authenticated() {
            tracing::debug!("Session already present, skipping login form");
            LoginMount::Redirect(Self::destination())
        } else {
            LoginMount::ShowForm
        }
    }

    /// Submit credentials. On success the token is stored for the configured
    /// lifetime and the protected destination is returned.
    ///
    /// Each call is an independent attempt; there is no lockout here.
    pub async fn submit(&self, email: &str, password: &str) -> Result<Route, AuthError> {
        let credentials = Credentials::new(email.trim(), password);
        if !credentials.is_complete() {
            return Err(Self::fail(AuthFailureKind::InvalidInput, credentials.email()));
        }

        tracing::info!(email = %credentials.email(), "Submitting login");

        let response = match self.api.login(&self.base_url, &credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Login request failed");
                return Err(Self::fail(AuthFailureKind::from(&e), credentials.email()));
            }
        };

        if let Err(e) = self.store.set(&response.access_token, self.ttl_days) {
            tracing::error!(error = %e, "Failed to persist session token");
            return Err(Self::fail(AuthFailureKind::Store, credentials.email()));
        }

        tracing::info!(email = %credentials.email(), ttl_days = self.ttl_days, "Login succeeded");
        Ok(Self::destination())
    }

    fn fail(kind: AuthFailureKind, email: &str) -> AuthError {
        tracing::warn!(code = AuthError::CODE, email = %email, cause = %kind, "Login failed");
        AuthError::new(kind)
    }
}
