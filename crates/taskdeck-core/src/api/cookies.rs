//! Session cookie jar.
//!
//! The API associates requests with a session through a server-set cookie.
//! [`SessionCookies`] wraps a `cookie_store` jar (RFC 6265 expiry, path and
//! domain rules) and persists it to `session.json` (mode 0600) so the session
//! survives between CLI invocations.

use std::fs::{self, OpenOptions};
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::{MutexGuard, PoisonError};

use anyhow::{Context, Result, anyhow};
use cookie_store::CookieStore as CookieJar;
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest_cookie_store::CookieStoreMutex;

#[derive(Debug, Default)]
pub struct SessionCookies {
    jar: CookieStoreMutex,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    fn jar(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.jar().iter_unexpired().next().is_none()
    }

    /// Drops every stored cookie.
    pub fn clear(&self) {
        self.jar().clear();
    }

    /// Loads a jar from disk, skipping expired cookies. Returns an empty jar
    /// if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to read session from {}", path.display()))?;
        let jar = cookie_store::serde::json::load(BufReader::new(file))
            .map_err(|err| anyhow!(err))
            .with_context(|| format!("Failed to parse session from {}", path.display()))?;
        Ok(Self {
            jar: CookieStoreMutex::new(jar),
        })
    }

    /// Saves the jar with restricted permissions (0600), removing the file
    /// when no live cookie is left.
    ///
    /// Session cookies (no `Expires`/`Max-Age`) are kept: each CLI run is a
    /// fresh process, so they would otherwise never outlive `login`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written or removed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.jar(), &mut contents)
            .map_err(|err| anyhow!(err))
            .context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(&contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(&contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}
