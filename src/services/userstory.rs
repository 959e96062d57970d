use crate::error::Result;
use crate::http_client::TaigaClient;
use crate::models::{CreateUserStoryRequest, Status, UpdateUserStoryRequest, UserStory};
use crate::pagination::{list_paged, PageRequest};

/// User stories endpoints
pub struct UserStoryService<'a> {
    client: &'a TaigaClient,
}

impl<'a> UserStoryService<'a> {
    pub fn new(client: &'a TaigaClient) -> Self {
        Self { client }
    }

    pub async fn list_user_stories(
        &self,
        project_id: i64,
        page: &PageRequest,
    ) -> Result<Vec<UserStory>> {
        list_paged(self.client, "/userstories", project_id, page).await
    }

    pub async fn get_user_story(&self, user_story_id: i64) -> Result<UserStory> {
        self.client
            .get(&format!("/userstories/{}", user_story_id), &[])
            .await
    }

    pub async fn create_user_story(&self, request: &CreateUserStoryRequest) -> Result<UserStory> {
        self.client.post("/userstories", request).await
    }

    pub async fn update_user_story(
        &self,
        user_story_id: i64,
        request: &UpdateUserStoryRequest,
    ) -> Result<UserStory> {
        self.client
            .patch(&format!("/userstories/{}", user_story_id), request)
            .await
    }

    pub async fn get_user_story_statuses(&self, project_id: i64) -> Result<Vec<Status>> {
        self.client
            .get("/userstory-statuses", &[("project", project_id.to_string())])
            .await
    }
}
