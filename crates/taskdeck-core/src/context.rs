//! Application root.
//!
//! [`AppContext`] owns the session and task stores over one shared adapter.
//! Callers obtain stores through it; there are no process-wide singletons.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api::{ApiClient, AuthApi, SessionCookies, TaskApi};
use crate::config::Config;
use crate::guard::{self, Access, Route};
use crate::models::Registration;
use crate::session::SessionStore;
use crate::tasks::TaskStore;

pub struct AppContext<A = ApiClient> {
    api: Arc<A>,
    session: SessionStore<A>,
    tasks: TaskStore<A>,
}

impl AppContext<ApiClient> {
    /// Builds the HTTP adapter from configuration and wraps it.
    ///
    /// # Errors
    /// Returns an error if the configured base URL is invalid.
    pub fn from_config(config: &Config, cookies: Arc<SessionCookies>) -> Result<Self> {
        Ok(Self::new(Arc::new(ApiClient::from_config(config, cookies)?)))
    }
}

impl<A: AuthApi + TaskApi> AppContext<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            session: SessionStore::new(Arc::clone(&api)),
            tasks: TaskStore::new(Arc::clone(&api)),
            api,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn session(&self) -> &SessionStore<A> {
        &self.session
    }

    pub fn tasks(&self) -> &TaskStore<A> {
        &self.tasks
    }

    /// Resolves the startup session and, if signed in, loads the tasks.
    ///
    /// Returns the redirect the session check produced, if any.
    pub async fn bootstrap(&self) -> Option<Route> {
        let redirect = self.session.verify().await;
        if redirect.is_none()
            && let Err(err) = self.tasks.refresh().await
        {
            debug!(error = %err, "initial task load failed");
        }
        redirect
    }

    /// Runs the navigation guard for `route` against the current session.
    pub async fn guard(&self, route: Route) -> Access {
        guard::check(route, &self.session.snapshot().await)
    }

    /// Signs in and loads the tasks on success.
    pub async fn login(&self, email: &str, password: &str) -> Option<Route> {
        let route = self.session.login(email, password).await;
        if route.is_some() {
            self.load_tasks().await;
        }
        route
    }

    /// Registers and loads the tasks on success.
    pub async fn register(&self, data: &Registration) -> Option<Route> {
        let route = self.session.register(data).await;
        if route.is_some() {
            self.load_tasks().await;
        }
        route
    }

    /// Signs out and forgets the previous user's tasks.
    pub async fn logout(&self) -> Route {
        let route = self.session.logout().await;
        self.tasks.clear().await;
        route
    }

    async fn load_tasks(&self) {
        if let Err(err) = self.tasks.refresh().await {
            debug!(error = %err, "task load after sign-in failed");
        }
    }
}
