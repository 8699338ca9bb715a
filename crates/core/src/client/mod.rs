//! Auth Service HTTP client
//!
//! Two calls cross the boundary: a liveness `GET /` and `POST /login`. Both
//! sit behind [`AuthApi`] so the prober and the login flow can be exercised
//! without a network.

pub mod error;

pub use error::ClientError;

use crate::config::CredentialTransport;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("lims-portal/", env!("CARGO_PKG_VERSION"));

/// Email and password as typed by the user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both fields carry something other than whitespace
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful `/login` body
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

/// The Auth Service as seen by the portal
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Liveness check against the service root; `Ok` only on 2xx
    async fn ping(&self, base_url: &Url) -> Result<(), ClientError>;

    /// Exchange credentials for a token
    async fn login(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<LoginResponse, ClientError>;
}

/// reqwest-backed [`AuthApi`]
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    transport: CredentialTransport,
}

impl AuthClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Create a new client builder
    pub fn builder() -> AuthClientBuilder {
        AuthClientBuilder::default()
    }

    /// Resolve `path` under the service base URL
    pub fn endpoint(base_url: &Url, path: &str) -> Result<Url, ClientError> {
        base_url
            .join(path)
            .map_err(|e| ClientError::Configuration(format!("cannot build {path} endpoint: {e}")))
    }

    async fn fail_with_status(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        ClientError::from_status(status, message)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn ping(&self, base_url: &Url) -> Result<(), ClientError> {
        let response = self.client.get(base_url.clone()).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::fail_with_status(response).await)
        }
    }

    async fn login(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<LoginResponse, ClientError> {
        let mut url = Self::endpoint(base_url, "login")?;

        let request = match self.transport {
            CredentialTransport::Form => self.client.post(url).form(&[
                ("email", credentials.email()),
                ("password", credentials.password()),
            ]),
            CredentialTransport::Query => {
                url.query_pairs_mut()
                    .append_pair("email", credentials.email())
                    .append_pair("password", credentials.password());
                self.client.post(url)
            }
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::fail_with_status(response).await);
        }

        let body = response.bytes().await?;
        let login: LoginResponse = serde_json::from_slice(&body)?;
        if login.access_token.trim().is_empty() {
            return Err(ClientError::InvalidResponse(
                "access_token is empty".to_string(),
            ));
        }

        Ok(login)
    }
}

/// Builder for [`AuthClient`]
#[derive(Default)]
pub struct AuthClientBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport: CredentialTransport,
}

impl AuthClientBuilder {
    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Choose how credentials are sent to `/login`
    pub const fn transport(mut self, transport: CredentialTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AuthClient, ClientError> {
        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder =
            client_builder.user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        Ok(AuthClient {
            client: client_builder.build()?,
            transport: self.transport,
        })
    }
}

// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub AuthApi {}

        #[async_trait]
        impl AuthApi for AuthApi {
            async fn ping(&self, base_url: &Url) -> Result<(), ClientError>;
            async fn login(
                &self,
                base_url: &Url,
                credentials: &Credentials,
            ) -> Result<LoginResponse, ClientError>;
        }
    }
}
