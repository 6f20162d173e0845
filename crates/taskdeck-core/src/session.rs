//! Authentication session store.
//!
//! Holds who is signed in and exposes verify/login/register/logout as the only
//! way to change it. Failures never escape as raw transport errors: `verify`
//! treats them as "not logged in", login/register collapse them into one
//! static message each, and logout is applied locally no matter what.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::guard::Route;
use crate::models::{Registration, User};

pub const LOGIN_FAILED: &str = "Invalid credentials";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Observable session state.
///
/// At rest `is_authenticated == user.is_some()`; the two may only diverge
/// while a request is in flight (`is_loading`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Coarse session phase derived from [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not resolved yet (startup verify or a login/register in flight).
    Unknown,
    Authenticated,
    Anonymous,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }
}

impl Session {
    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: None,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::anonymous()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated {
            SessionPhase::Authenticated
        } else if self.is_loading {
            SessionPhase::Unknown
        } else {
            SessionPhase::Anonymous
        }
    }
}

pub struct SessionStore<A> {
    api: Arc<A>,
    state: Mutex<Session>,
}

impl<A: AuthApi> SessionStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: Mutex::new(Session::default()),
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.state.lock().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    async fn begin(&self) {
        let mut state = self.state.lock().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn set(&self, session: Session) {
        *self.state.lock().await = session;
    }

    /// Resolves the startup session from the server-held cookie.
    ///
    /// Any failure is the expected "not logged in" path: no error is recorded.
    /// Returns the login route when the session turns out to be anonymous.
    pub async fn verify(&self) -> Option<Route> {
        self.begin().await;
        match self.api.profile().await {
            Ok(user) => {
                debug!(user = %user.id, "session verified");
                self.set(Session::authenticated(user)).await;
                None
            }
            Err(err) => {
                debug!(error = %err, "no active session");
                self.set(Session::anonymous()).await;
                Some(Route::Login)
            }
        }
    }

    /// Signs in. Returns the dashboard route on success.
    pub async fn login(&self, email: &str, password: &str) -> Option<Route> {
        self.begin().await;
        match self.api.login(email, password).await {
            Ok(response) => {
                info!(user = %response.user.id, "logged in");
                self.set(Session::authenticated(response.user)).await;
                Some(Route::Dashboard)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.set(Session::failed(LOGIN_FAILED)).await;
                None
            }
        }
    }

    /// Creates an account and signs in. Returns the dashboard route on success.
    pub async fn register(&self, data: &Registration) -> Option<Route> {
        self.begin().await;
        match self.api.register(data).await {
            Ok(response) => {
                info!(user = %response.user.id, "registered");
                self.set(Session::authenticated(response.user)).await;
                Some(Route::Dashboard)
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.set(Session::failed(REGISTRATION_FAILED)).await;
                None
            }
        }
    }

    /// Signs out. Local state always ends anonymous, even if the request fails.
    pub async fn logout(&self) -> Route {
        self.begin().await;
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "logout request failed; clearing local session anyway");
        }
        self.set(Session::anonymous()).await;
        Route::Login
    }
}
