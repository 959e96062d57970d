use crate::error::Result;
use crate::http_client::TaigaClient;
use crate::models::{CreateTaskRequest, Status, Task, UpdateTaskRequest};

/// Tasks endpoints
pub struct TaskService<'a> {
    client: &'a TaigaClient,
}

impl<'a> TaskService<'a> {
    pub fn new(client: &'a TaigaClient) -> Self {
        Self { client }
    }

    /// All tasks attached to a user story
    pub async fn list_tasks(&self, user_story_id: i64) -> Result<Vec<Task>> {
        self.client
            .get("/tasks", &[("user_story", user_story_id.to_string())])
            .await
    }

    pub async fn get_task(&self, task_id: i64) -> Result<Task> {
        self.client.get(&format!("/tasks/{}", task_id), &[]).await
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        self.client.post("/tasks", request).await
    }

    pub async fn update_task(&self, task_id: i64, request: &UpdateTaskRequest) -> Result<Task> {
        self.client
            .patch(&format!("/tasks/{}", task_id), request)
            .await
    }

    pub async fn get_task_statuses(&self, project_id: i64) -> Result<Vec<Status>> {
        self.client
            .get("/task-statuses", &[("project", project_id.to_string())])
            .await
    }
}
