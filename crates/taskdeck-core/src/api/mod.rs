//! HTTP adapter for the task API.
//!
//! [`ApiClient`] prefixes every path with the configured base URL and sends
//! the session cookie with each request. The operations are split into the
//! [`AuthApi`] and [`TaskApi`] contracts consumed by the stores.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{IntoUrl, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::models::{AuthResponse, NewTask, Registration, Task, TaskId, TaskPatch, User};

mod auth;
mod cookies;
mod error;
mod tasks;

pub use cookies::SessionCookies;
pub use error::ApiError;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("taskdeck/", env!("CARGO_PKG_VERSION"));

/// Session endpoints.
pub trait AuthApi: Send + Sync {
    /// `GET /profile`: the user bound to the current session cookie.
    fn profile(&self) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// `POST /login`.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// `POST /register`, multipart when a profile image is attached.
    fn register(
        &self,
        data: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// `POST /logout`.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Task CRUD endpoints.
pub trait TaskApi: Send + Sync {
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    fn get_task(&self, id: &TaskId) -> impl Future<Output = Result<Task, ApiError>> + Send;

    fn create_task(&self, task: &NewTask)
    -> impl Future<Output = Result<Task, ApiError>> + Send;

    fn update_task(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client for `base_url` sharing the given cookie jar.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        cookies: Arc<SessionCookies>,
    ) -> Result<Self> {
        let base_url = base_url.trim();
        url::Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(cookies);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from configuration (env > config > default base URL).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn from_config(config: &Config, cookies: Arc<SessionCookies>) -> Result<Self> {
        let base_url = config.resolve_api_url()?;
        Self::new(&base_url, config.request_timeout(), cookies)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn decode<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: impl IntoUrl,
    ) -> Result<T, ApiError> {
        Self::decode(self.request(Method::GET, url)).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: impl IntoUrl,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::decode(self.request(method, url).json(body)).await
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        url: impl IntoUrl,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        Self::decode(self.request(Method::POST, url).multipart(form)).await
    }

    /// Sends a request whose response body is ignored.
    pub(crate) async fn send_empty(
        &self,
        method: Method,
        url: impl IntoUrl,
    ) -> Result<(), ApiError> {
        Self::send(self.request(method, url)).await.map(drop)
    }
}
