//! LIMS portal core
//!
//! The session and backend-reachability state machine behind the portal
//! shell: a persisted expiring token, a one-shot liveness probe of the Auth
//! Service, the login flow, the route guard and the session observer.
//! Rendering is left to whoever embeds [`Shell`].

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod login;
pub mod nav;
pub mod observer;
pub mod probe;
pub mod session;
pub mod shell;

pub use client::{AuthApi, AuthClient, ClientError, Credentials, LoginResponse};
pub use config::{AuthConfig, CredentialTransport, PortalSettings};
pub use error::{AuthError, AuthFailureKind, ConfigError, FatalError, StoreError, StoreResult};
pub use guard::{GuardOutcome, RouteGuard};
pub use login::{LoginFlow, LoginMount};
pub use nav::{Icon, MenuState, NavItem, NavLink, Route};
pub use observer::SessionObserver;
pub use probe::{Reachability, ReachabilityCell, ReachabilityProber};
pub use session::{
    FileSessionStore, MemorySessionStore, SessionStore, SessionToken, SharedSessionStore,
};
pub use shell::{BootState, Screen, Shell};
