//! Portal configuration
//!
//! [`AuthConfig`] is the one deployment-provided value the core depends on:
//! where the Auth Service lives. It is resolved once at startup and never
//! re-read. [`PortalSettings`] carries the tunables (timeouts, token lifetime,
//! credential transport) and is loaded with the `config` crate from an
//! optional file layered under `LIMS_PORTAL_*` environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the Auth Service base URL
pub const API_URL_ENV: &str = "LIMS_API_URL";

/// Value a deployment uses to say "deliberately left unset"
pub const UNSET_SENTINEL: &str = "error: LIMS_API_URL not set";

/// Prefix for settings overrides in the environment
pub const SETTINGS_ENV_PREFIX: &str = "LIMS_PORTAL";

/// Default session token lifetime
pub const DEFAULT_TOKEN_TTL_DAYS: u32 = 7;

/// Longest session token lifetime a deployment may configure
pub const MAX_TOKEN_TTL_DAYS: u32 = 365;

/// Where the Auth Service lives, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    base_url: Option<Url>,
}

impl AuthConfig {
    /// Resolve from the process environment
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve through an arbitrary lookup, keyed by [`API_URL_ENV`]
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_raw(lookup(API_URL_ENV).as_deref())
    }

    /// Build from a raw value. Absent, blank, the sentinel, unparsable and
    /// non-http(s) values all resolve to "not configured".
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::unset();
        };
        if raw.is_empty() || raw == UNSET_SENTINEL {
            return Self::unset();
        }

        match Url::parse(raw) {
            Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
                // Root-relative joins need the trailing slash
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                Self { base_url: Some(url) }
            }
            Ok(url) => {
                tracing::error!(scheme = url.scheme(), "Auth Service URL must use http or https");
                Self::unset()
            }
            Err(e) => {
                tracing::error!(error = %e, "Auth Service URL is not a valid URL");
                Self::unset()
            }
        }
    }

    /// An explicitly unconfigured instance
    pub const fn unset() -> Self {
        Self { base_url: None }
    }

    /// Normalized base URL, always ending in `/`
    pub const fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub const fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}

/// How credentials travel to the login endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialTransport {
    /// `application/x-www-form-urlencoded` request body
    #[default]
    Form,
    /// Url-encoded query parameters, as the reference service expects
    Query,
}

/// Tunables for the portal shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    /// Upper bound for the boot-time liveness probe
    pub probe_timeout_secs: u64,

    /// Timeout for every other Auth Service request
    pub request_timeout_secs: u64,

    /// Lifetime of a freshly issued session token
    pub token_ttl_days: u32,

    /// Delay before the session observer's deferred resync
    pub resync_delay_ms: u64,

    pub credential_transport: CredentialTransport,

    /// Session cookie jar; defaults to `<data_dir>/session.json`
    pub session_file: Option<PathBuf>,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            request_timeout_secs: 10,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            resync_delay_ms: 100,
            credential_transport: CredentialTransport::default(),
            session_file: None,
        }
    }
}

impl PortalSettings {
    /// Load from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(path, None)
    }

    /// Load from an optional file plus an explicit environment map.
    ///
    /// `env` replaces the process environment when given, which keeps tests
    /// hermetic.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(SETTINGS_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::invalid("probe_timeout_secs must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs must be positive"));
        }
        if self.token_ttl_days == 0 || self.token_ttl_days > MAX_TOKEN_TTL_DAYS {
            return Err(ConfigError::invalid(format!(
                "token_ttl_days must be between 1 and {MAX_TOKEN_TTL_DAYS}"
            )));
        }
        Ok(())
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn resync_delay(&self) -> Duration {
        Duration::from_millis(self.resync_delay_ms)
    }
}
