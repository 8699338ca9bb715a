//! Error taxonomy for the portal core
//!
//! Two families exist. [`FatalError`] halts the whole application at boot and is
//! rendered as a terminal screen. [`AuthError`] is local to the login
//! interaction and never propagates past it. Persistence and configuration
//! failures have their own types so callers can decide how loud to be.

use std::fmt;

/// Result type for session persistence operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Application-halting errors decided once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    /// The Auth Service URL is absent, blank, unparsable or the unset sentinel.
    #[error("The authentication service is not configured")]
    ConfigMissing,

    /// The liveness probe failed or returned a non-success status.
    #[error("The authentication service is unreachable")]
    BackendUnreachable,
}

impl FatalError {
    /// Terminal error code shown on the fatal screen and in logs
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::BackendUnreachable => "BACKEND_UNREACHABLE",
        }
    }
}

/// Diagnostic cause behind an [`AuthError`].
///
/// Only ever logged. The user-facing message is the same for every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// Email or password was blank; nothing was sent.
    InvalidInput,
    /// The Auth Service answered with a non-success status.
    Rejected { status: u16 },
    /// Connection, DNS or timeout failure.
    Network,
    /// Success status but the body had no usable `access_token`.
    MalformedBody,
    /// The token was issued but could not be persisted.
    Store,
    /// Login attempted while the application is not ready.
    Unavailable,
}

impl fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => f.write_str("invalid input"),
            Self::Rejected { status } => write!(f, "rejected with status {status}"),
            Self::Network => f.write_str("network failure"),
            Self::MalformedBody => f.write_str("malformed response body"),
            Self::Store => f.write_str("session store failure"),
            Self::Unavailable => f.write_str("application not ready"),
        }
    }
}

/// Login failure as surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid credentials or network failure")]
pub struct AuthError {
    kind: AuthFailureKind,
}

impl AuthError {
    /// The only message an end user ever sees for a failed login
    pub const USER_MESSAGE: &'static str = "invalid credentials or network failure";

    /// Error code used in logs
    pub const CODE: &'static str = "AUTH_FAILED";

    pub const fn new(kind: AuthFailureKind) -> Self {
        Self { kind }
    }

    /// Diagnostic cause, for logging only
    pub const fn kind(&self) -> AuthFailureKind {
        self.kind
    }
}

/// Session persistence failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Token lifetime of {ttl_days} days is out of range")]
    ExpiryOutOfRange { ttl_days: u32 },
}

/// Settings loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create an invalid config error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
