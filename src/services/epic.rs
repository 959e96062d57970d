use crate::error::Result;
use crate::http_client::TaigaClient;
use crate::models::{CreateEpicRequest, Epic, Status};
use crate::pagination::{list_paged, PageRequest};

/// Epics endpoints
pub struct EpicService<'a> {
    client: &'a TaigaClient,
}

impl<'a> EpicService<'a> {
    pub fn new(client: &'a TaigaClient) -> Self {
        Self { client }
    }

    pub async fn list_epics(&self, project_id: i64, page: &PageRequest) -> Result<Vec<Epic>> {
        list_paged(self.client, "/epics", project_id, page).await
    }

    pub async fn get_epic(&self, epic_id: i64) -> Result<Epic> {
        self.client.get(&format!("/epics/{}", epic_id), &[]).await
    }

    pub async fn create_epic(&self, request: &CreateEpicRequest) -> Result<Epic> {
        self.client.post("/epics", request).await
    }

    pub async fn get_epic_statuses(&self, project_id: i64) -> Result<Vec<Status>> {
        self.client
            .get("/epic-statuses", &[("project", project_id.to_string())])
            .await
    }
}
