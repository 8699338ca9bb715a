//! Application shell
//!
//! Owns the process-wide state (reachability verdict, session view state)
//! for the lifetime of the application and wires the components together:
//! boot probes once, and only a successful boot unlocks navigation, the guard
//! and the login flow.

use crate::client::AuthApi;
use crate::config::{AuthConfig, PortalSettings};
use crate::error::{AuthError, AuthFailureKind, FatalError, StoreResult};
use crate::guard::{GuardOutcome, RouteGuard};
use crate::login::{LoginFlow, LoginMount};
use crate::nav::{LOGIN_PATH, Route};
use crate::observer::SessionObserver;
use crate::probe::{Reachability, ReachabilityCell, ReachabilityProber};
use crate::session::SharedSessionStore;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OnceCell, watch};

/// Guard and login can bounce off each other when the store changes between
/// their reads; give up after this many hops and show the form.
const MAX_REDIRECTS: usize = 4;

/// Application lifecycle as the presentation layer sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    /// Probe in flight; render an interim "checking" view
    Checking,
    Ready,
    Fatal(FatalError),
}

/// What to render after a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Checking,
    Fatal(FatalError),
    Landing,
    LoginForm { error: Option<String> },
    Protected(Route),
    NotFound(String),
}

pub struct Shell {
    config: AuthConfig,
    settings: PortalSettings,
    store: SharedSessionStore,
    api: Arc<dyn AuthApi>,
    reachability: ReachabilityCell,
    boot: OnceCell<Result<(), FatalError>>,
    guard: RouteGuard,
    observer: SessionObserver,
    location: Mutex<Route>,
}

impl Shell {
    pub fn new(
        config: AuthConfig,
        settings: PortalSettings,
        store: SharedSessionStore,
        api: Arc<dyn AuthApi>,
    ) -> Self {
        let observer = SessionObserver::new(store.clone(), settings.resync_delay());
        Self {
            guard: RouteGuard::new(store.clone()),
            observer,
            config,
            settings,
            store,
            api,
            reachability: ReachabilityCell::new(),
            boot: OnceCell::new(),
            location: Mutex::new(Route::Landing),
        }
    }

    /// Run the boot probe. Only the first call touches the network; later
    /// and concurrent calls share its verdict.
    pub async fn boot(&self) -> BootState {
        let result = self
            .boot
            .get_or_init(|| async {
                let prober = ReachabilityProber::new(self.api.clone(), self.settings.probe_timeout());
                let result = prober.probe(self.config.base_url()).await;
                self.reachability.resolve(if result.is_ok() {
                    Reachability::Reachable
                } else {
                    Reachability::Unreachable
                });
                result
            })
            .await;

        Self::state_of(result)
    }

    pub fn boot_state(&self) -> BootState {
        self.boot.get().map_or(BootState::Checking, Self::state_of)
    }

    const fn state_of(result: &Result<(), FatalError>) -> BootState {
        match result {
            Ok(()) => BootState::Ready,
            Err(e) => BootState::Fatal(*e),
        }
    }

    pub fn reachability(&self) -> Reachability {
        self.reachability.get()
    }

    /// Session view state as last published by the observer
    pub fn is_logged_in(&self) -> bool {
        self.observer.is_logged_in()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<bool> {
        self.observer.subscribe()
    }

    /// Route currently displayed
    pub fn location(&self) -> Route {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigate to `path` and return what to render.
    ///
    /// Nothing navigable exists until boot succeeds. Must be called from
    /// within a Tokio runtime.
    pub fn navigate(&self, path: &str) -> Screen {
        match self.boot_state() {
            BootState::Checking => return Screen::Checking,
            BootState::Fatal(e) => return Screen::Fatal(e),
            BootState::Ready => {}
        }

        let mut route = Route::parse(path);
        for _ in 0..MAX_REDIRECTS {
            self.arrive(&route);
            match self.resolve(route) {
                Ok(screen) => return screen,
                Err(next) => route = next,
            }
        }

        tracing::warn!("Redirect limit reached, showing login form");
        self.arrive(&Route::Login);
        Screen::LoginForm { error: None }
    }

    fn arrive(&self, route: &Route) {
        self.observer.on_navigate(route.path());
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = route.clone();
    }

    /// Render `route`, or hand back the route to redirect to
    fn resolve(&self, route: Route) -> Result<Screen, Route> {
        match route {
            Route::Landing => Ok(Screen::Landing),
            Route::NotFound(path) => Ok(Screen::NotFound(path)),
            Route::Login => match self.login_flow().map(|flow| flow.mount()) {
                Some(LoginMount::Redirect(to)) => Err(to),
                _ => Ok(Screen::LoginForm { error: None }),
            },
            protected => match self.guard.check(protected) {
                GuardOutcome::Authorized(route) => Ok(Screen::Protected(route)),
                GuardOutcome::Redirected(to) => Err(to),
            },
        }
    }

    fn login_flow(&self) -> Option<LoginFlow> {
        let base_url = self.config.base_url()?.clone();
        Some(LoginFlow::new(
            self.api.clone(),
            self.store.clone(),
            base_url,
            self.settings.token_ttl_days,
        ))
    }

    /// Submit credentials and, on success, navigate to the protected area
    pub async fn login(&self, email: &str, password: &str) -> Result<Screen, AuthError> {
        if self.boot_state() != BootState::Ready {
            tracing::warn!(state = ?self.boot_state(), "Login attempted before a successful boot");
            return Err(AuthError::new(AuthFailureKind::Unavailable));
        }
        let flow = self
            .login_flow()
            .ok_or_else(|| AuthError::new(AuthFailureKind::Unavailable))?;

        let destination = flow.submit(email, password).await?;
        self.observer.resync();
        Ok(self.navigate(destination.path()))
    }

    /// Revoke the session and show the login view
    pub fn logout(&self) -> StoreResult<Screen> {
        tracing::info!("Logging out");
        self.store.clear()?;
        self.observer.resync();
        Ok(self.navigate(LOGIN_PATH))
    }
}
