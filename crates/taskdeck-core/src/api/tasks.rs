use reqwest::{Method, Url};

use super::{ApiClient, ApiError, TaskApi};
use crate::models::{NewTask, Task, TaskId, TaskPatch};

impl ApiClient {
    /// `tasks/{id}` with the id percent-encoded as a single path segment.
    fn task_url(&self, id: &TaskId) -> Result<Url, ApiError> {
        let id = id.as_str();
        if matches!(id, "" | "." | "..") {
            return Err(ApiError::InvalidInput(format!("task id {id:?}")));
        }
        let mut url = Url::parse(&self.endpoint("tasks"))
            .map_err(|err| ApiError::InvalidInput(format!("task URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidInput("API base URL cannot hold a path".to_string()))?
            .push(id);
        Ok(url)
    }
}

impl TaskApi for ApiClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json(self.endpoint("tasks")).await
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, ApiError> {
        self.get_json(self.task_url(id)?).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.send_json(Method::POST, self.endpoint("tasks"), task).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.send_json(Method::PUT, self.task_url(id)?, patch).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, self.task_url(id)?).await
    }
}
