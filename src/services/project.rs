use crate::error::Result;
use crate::http_client::TaigaClient;
use crate::models::{Project, ProjectMember};

/// Projects and memberships endpoints
pub struct ProjectService<'a> {
    client: &'a TaigaClient,
}

impl<'a> ProjectService<'a> {
    pub fn new(client: &'a TaigaClient) -> Self {
        Self { client }
    }

    /// Projects visible to the user, optionally restricted to a member
    pub async fn list_projects(&self, member_id: Option<i64>) -> Result<Vec<Project>> {
        match member_id {
            Some(member) => {
                self.client
                    .get("/projects", &[("member", member.to_string())])
                    .await
            }
            None => self.client.get("/projects", &[]).await,
        }
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Project> {
        self.client
            .get(&format!("/projects/{}", project_id), &[])
            .await
    }

    pub async fn get_project_by_slug(&self, slug: &str) -> Result<Project> {
        self.client
            .get("/projects/by_slug", &[("slug", slug.to_string())])
            .await
    }

    pub async fn list_project_members(&self, project_id: i64) -> Result<Vec<ProjectMember>> {
        self.client
            .get("/memberships", &[("project", project_id.to_string())])
            .await
    }
}
