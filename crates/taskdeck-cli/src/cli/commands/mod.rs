//! CLI command handlers.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use taskdeck_core::api::SessionCookies;
use taskdeck_core::config::{Config, paths};
use taskdeck_core::context::AppContext;
use taskdeck_core::guard::{Access, Route};
use taskdeck_core::tasks::TaskError;
use tracing::debug;

pub mod auth;
pub mod config;
pub mod tasks;

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `taskdeck login`.";

/// Application context plus the on-disk cookie jar it reads and writes.
pub struct Client {
    ctx: AppContext,
    cookies: Arc<SessionCookies>,
    jar_path: PathBuf,
}

impl Client {
    pub fn open(config: &Config) -> Result<Self> {
        let jar_path = paths::session_path();
        let cookies = Arc::new(SessionCookies::load_from(&jar_path)?);
        let ctx = AppContext::from_config(config, Arc::clone(&cookies))?;
        debug!(
            api = ctx.api().base_url(),
            jar = %jar_path.display(),
            "client ready"
        );
        Ok(Self {
            ctx,
            cookies,
            jar_path,
        })
    }

    pub fn ctx(&self) -> &AppContext {
        &self.ctx
    }

    pub fn forget_session(&self) {
        self.cookies.clear();
    }

    pub fn save(&self) -> Result<()> {
        self.cookies
            .save_to(&self.jar_path)
            .with_context(|| format!("save session to {}", self.jar_path.display()))
    }

    /// Resolves the session and loads tasks, failing unless signed in.
    pub async fn require_login(&self) -> Result<()> {
        self.ctx.bootstrap().await;
        match self.ctx.guard(Route::Dashboard).await {
            Access::Allow => Ok(()),
            Access::Pending | Access::Redirect(_) => bail!(NOT_LOGGED_IN),
        }
    }
}

/// Uses `given` or reads one line from stdin.
pub fn password_or_stdin(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Collapses a store error to its user-facing message.
pub fn task_failure(err: TaskError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
