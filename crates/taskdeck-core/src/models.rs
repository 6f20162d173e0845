//! Wire and domain types shared by the API adapter and the stores.
//!
//! The task API speaks camelCase JSON with a few document-store names
//! (`_id`, `createAt`, `__v`). Both those and the plain names are accepted.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub names: String,
    #[serde(default)]
    pub lastnames: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl User {
    /// Full display name, `names lastnames` when both are known.
    pub fn display_name(&self) -> String {
        let names = self.names.trim();
        let lastnames = self.lastnames.trim();
        if lastnames.is_empty() {
            names.to_string()
        } else {
            format!("{names} {lastnames}")
        }
    }
}

/// Task owner as embedded by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub names: String,
    #[serde(default)]
    pub lastnames: String,
    #[serde(default)]
    pub email: String,
}

/// Server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        rename = "user",
        alias = "owner",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<UserSummary>,
    #[serde(rename = "createAt", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "__v", alias = "version", default)]
    pub version: i64,
}

/// Body of `POST /tasks`. New tasks always start incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Partial update sent as the body of `PUT /tasks/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Binary profile image attached to a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProfileImage {
    /// Wraps raw bytes, sniffing the MIME type from the content.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = infer::get(&bytes).map(|kind| kind.mime_type().to_string());
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        }
    }

    /// Reads an image from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read profile image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "profile".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::from_bytes(file_name, bytes))
    }
}

/// Registration form data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub names: String,
    pub lastnames: String,
    pub age: u32,
    pub email: String,
    pub password: String,
    pub profile_image: Option<ProfileImage>,
}

/// JSON registration body (used when no image is attached).
#[derive(Debug, Serialize)]
pub(crate) struct RegistrationBody<'a> {
    pub names: &'a str,
    pub lastnames: &'a str,
    pub age: u32,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Registration> for RegistrationBody<'a> {
    fn from(data: &'a Registration) -> Self {
        Self {
            names: &data.names,
            lastnames: &data.lastnames,
            age: data.age,
            email: &data.email,
            password: &data.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /login` and `POST /register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

/// Response of `GET /profile`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfileResponse {
    pub user: User,
}
