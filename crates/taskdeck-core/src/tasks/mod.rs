//! Task store.
//!
//! Owns the task collection. Every mutation goes to the server first and is
//! followed by a full refresh; nothing is applied optimistically. Category
//! and search views are derived on read via [`views`].
//!
//! Two guards keep overlapping calls from corrupting state:
//! - a task id with an update/delete in flight rejects a second mutation
//!   with [`TaskError::Busy`];
//! - refreshes are numbered and a result older than the last applied one is
//!   dropped.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ApiError, TaskApi};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::notice::Notice;
use crate::validation::{self, FieldErrors};

pub mod views;

pub use views::{TaskStats, TaskView};

pub const FETCH_FAILED: &str = "Failed to fetch tasks";
pub const DETAILS_FAILED: &str = "Failed to fetch task details";
pub const CREATE_FAILED: &str = "Failed to create task";
pub const UPDATE_FAILED: &str = "Failed to update task";
pub const DELETE_FAILED: &str = "Failed to delete task";

const CREATED: &str = "Task created successfully";
const UPDATED: &str = "Task updated successfully";
const DELETED: &str = "Task deleted successfully";

#[derive(Debug)]
pub enum TaskError {
    /// Rejected before any request was made.
    Invalid(FieldErrors),
    /// An update carried no fields.
    NothingToUpdate,
    /// Another update/delete for this task is still in flight.
    Busy(TaskId),
    /// The request failed; `message` is the user-facing text.
    Failed {
        message: &'static str,
        source: ApiError,
    },
}

impl TaskError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            TaskError::Failed { message, .. } => (*message).to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Invalid(errors) => write!(f, "{errors}"),
            TaskError::NothingToUpdate => f.write_str("Nothing to update"),
            TaskError::Busy(id) => write!(f, "Task {id} is already being modified"),
            TaskError::Failed { message, .. } => f.write_str(message),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskError::Invalid(errors) => Some(errors),
            TaskError::Failed { source, .. } => Some(source),
            TaskError::NothingToUpdate | TaskError::Busy(_) => None,
        }
    }
}

/// Immutable copy of the store taken under the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    pub filter: String,
    pub revision: u64,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn filtered(&self) -> Vec<&Task> {
        views::filter_tasks(&self.tasks, &self.filter)
    }

    /// Tasks matching the search term that also belong to `view`.
    pub fn view(&self, view: TaskView) -> Vec<&Task> {
        let today = views::today();
        self.filtered()
            .into_iter()
            .filter(|task| view.contains(task, today))
            .collect()
    }

    pub fn stats(&self) -> TaskStats {
        views::stats(&self.tasks, views::today())
    }
}

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    filter: String,
    revision: u64,
    pending: usize,
    error: Option<String>,
    notice: Option<Notice>,
    issued_refresh: u64,
    applied_refresh: u64,
}

impl State {
    fn begin(&mut self) {
        self.pending += 1;
        self.error = None;
    }

    fn finish(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn fail(&mut self, message: &'static str, source: ApiError) -> TaskError {
        warn!(error = %source, "{message}");
        self.error = Some(message.to_string());
        self.notice = Some(Notice::error(message));
        TaskError::Failed { message, source }
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            tasks: self.tasks.clone(),
            filter: self.filter.clone(),
            revision: self.revision,
            is_loading: self.pending > 0,
            error: self.error.clone(),
        }
    }
}

/// Marks a task id as being mutated until dropped.
struct InFlight<'a> {
    ids: &'a StdMutex<HashSet<TaskId>>,
    id: TaskId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock_ids(self.ids).remove(&self.id);
    }
}

fn lock_ids(ids: &StdMutex<HashSet<TaskId>>) -> MutexGuard<'_, HashSet<TaskId>> {
    ids.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TaskStore<A> {
    api: Arc<A>,
    state: Mutex<State>,
    in_flight: StdMutex<HashSet<TaskId>>,
}

impl<A: TaskApi> TaskStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: Mutex::new(State::default()),
            in_flight: StdMutex::new(HashSet::new()),
        }
    }

    pub async fn snapshot(&self) -> TaskSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    /// Search results for the current filter term.
    pub async fn filtered(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        views::filter_tasks(&state.tasks, &state.filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn today_tasks(&self) -> Vec<Task> {
        self.select(TaskView::Today).await
    }

    pub async fn completed_tasks(&self) -> Vec<Task> {
        self.select(TaskView::Completed).await
    }

    pub async fn pending_tasks(&self) -> Vec<Task> {
        self.select(TaskView::Pending).await
    }

    async fn select(&self, view: TaskView) -> Vec<Task> {
        let state = self.state.lock().await;
        view.select(&state.tasks, views::today())
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> TaskStats {
        views::stats(&self.state.lock().await.tasks, views::today())
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.pending > 0
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Takes the pending notification, if any.
    pub async fn take_notice(&self) -> Option<Notice> {
        self.state.lock().await.notice.take()
    }

    /// Sets the search term. Client-side only; a blank term shows everything.
    pub async fn set_filter(&self, term: &str) {
        self.state.lock().await.filter = term.to_string();
    }

    /// Forgets the collection (used when the session ends).
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let issued = state.issued_refresh;
        *state = State {
            revision: state.revision + 1,
            issued_refresh: issued,
            applied_refresh: issued,
            ..State::default()
        };
    }

    fn claim(&self, id: &TaskId) -> Result<InFlight<'_>, TaskError> {
        let mut ids = lock_ids(&self.in_flight);
        if !ids.insert(id.clone()) {
            debug!(task = %id, "rejecting overlapping mutation");
            return Err(TaskError::Busy(id.clone()));
        }
        Ok(InFlight {
            ids: &self.in_flight,
            id: id.clone(),
        })
    }

    /// Replaces the whole collection with the server's list and clears the
    /// search term.
    ///
    /// # Errors
    /// Returns [`TaskError::Failed`] when the list cannot be fetched; the
    /// previous collection is kept.
    pub async fn refresh(&self) -> Result<(), TaskError> {
        let seq = {
            let mut state = self.state.lock().await;
            state.begin();
            state.issued_refresh += 1;
            state.issued_refresh
        };

        let result = self.api.list_tasks().await;

        let mut state = self.state.lock().await;
        state.finish();
        let stale = seq <= state.applied_refresh;
        match result {
            Ok(_) if stale => {
                debug!(seq, applied = state.applied_refresh, "dropping stale task list");
                Ok(())
            }
            Ok(tasks) => {
                debug!(seq, count = tasks.len(), "task list refreshed");
                state.tasks = tasks;
                state.filter.clear();
                state.revision += 1;
                state.applied_refresh = seq;
                Ok(())
            }
            Err(source) if stale => Err(TaskError::Failed {
                message: FETCH_FAILED,
                source,
            }),
            Err(source) => Err(state.fail(FETCH_FAILED, source)),
        }
    }

    /// Refresh after a successful mutation; its own failure is already
    /// recorded in the store state.
    async fn refetch(&self) {
        if let Err(err) = self.refresh().await {
            debug!(error = %err, "refresh after mutation failed");
        }
    }

    /// Fetches one task without touching the collection.
    ///
    /// # Errors
    /// Returns [`TaskError::Failed`] when the request fails.
    pub async fn get(&self, id: &TaskId) -> Result<Task, TaskError> {
        match self.api.get_task(id).await {
            Ok(task) => Ok(task),
            Err(source) => Err(self.state.lock().await.fail(DETAILS_FAILED, source)),
        }
    }

    /// Creates a task (always incomplete) and re-fetches the collection.
    ///
    /// # Errors
    /// Returns [`TaskError::Invalid`] for a blank title, or
    /// [`TaskError::Failed`] when the server rejects the task.
    pub async fn create(&self, title: &str, description: &str) -> Result<Task, TaskError> {
        let new_task = NewTask::new(title.trim(), description.trim());
        validation::validate_new_task(&new_task).map_err(TaskError::Invalid)?;

        self.state.lock().await.begin();
        let result = self.api.create_task(&new_task).await;
        let outcome = match result {
            Ok(task) => {
                info!(task = %task.id, "task created");
                self.state.lock().await.notice = Some(Notice::success(CREATED));
                self.refetch().await;
                Ok(task)
            }
            Err(source) => Err(self.state.lock().await.fail(CREATE_FAILED, source)),
        };
        self.state.lock().await.finish();
        outcome
    }

    /// Applies a partial update and re-fetches the collection.
    ///
    /// # Errors
    /// Returns [`TaskError::NothingToUpdate`] for an empty patch,
    /// [`TaskError::Invalid`] for a blank title, [`TaskError::Busy`] while
    /// another mutation of the same task runs, or [`TaskError::Failed`].
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, TaskError> {
        if patch.is_empty() {
            return Err(TaskError::NothingToUpdate);
        }
        if let Some(title) = &patch.title {
            validation::validate_title(title).map_err(TaskError::Invalid)?;
        }
        let _claim = self.claim(id)?;

        self.state.lock().await.begin();
        let result = self.api.update_task(id, patch).await;
        let outcome = match result {
            Ok(task) => {
                info!(task = %id, "task updated");
                self.state.lock().await.notice = Some(Notice::success(UPDATED));
                self.refetch().await;
                Ok(task)
            }
            Err(source) => Err(self.state.lock().await.fail(UPDATE_FAILED, source)),
        };
        self.state.lock().await.finish();
        outcome
    }

    /// Convenience for toggling the completed flag.
    ///
    /// # Errors
    /// See [`TaskStore::update`].
    pub async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Task, TaskError> {
        self.update(id, &TaskPatch::default().completed(completed)).await
    }

    /// Deletes a task server-side and re-fetches the collection.
    ///
    /// # Errors
    /// Returns [`TaskError::Busy`] while another mutation of the same task
    /// runs, or [`TaskError::Failed`].
    pub async fn delete(&self, id: &TaskId) -> Result<(), TaskError> {
        let _claim = self.claim(id)?;

        self.state.lock().await.begin();
        let result = self.api.delete_task(id).await;
        let outcome = match result {
            Ok(()) => {
                info!(task = %id, "task deleted");
                self.state.lock().await.notice = Some(Notice::success(DELETED));
                self.refetch().await;
                Ok(())
            }
            Err(source) => Err(self.state.lock().await.fail(DELETE_FAILED, source)),
        };
        self.state.lock().await.finish();
        outcome
    }
}
