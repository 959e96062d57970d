use crate::error::Result;
use crate::http_client::TaigaClient;
use crate::models::User;

/// Users endpoints
pub struct UserService<'a> {
    client: &'a TaigaClient,
}

impl<'a> UserService<'a> {
    pub fn new(client: &'a TaigaClient) -> Self {
        Self { client }
    }

    /// The account the current token belongs to
    pub async fn get_current_user(&self) -> Result<User> {
        self.client.get("/users/me", &[]).await
    }
}
