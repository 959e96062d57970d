// Page-by-page aggregation for Taiga list endpoints
//
// Taiga list endpoints return a bare JSON array with no envelope, so the
// only end-of-data signal used here is an empty or short page. A page that
// comes back short for any other reason (server-side filtering, for
// instance) ends the walk early; that behaviour is kept on purpose.

use serde::de::DeserializeOwned;

use crate::error::{Result, TaigaError};
use crate::http_client::TaigaClient;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Hard ceiling on the number of pages fetched in one walk
pub const MAX_PAGES: u32 = 1000;

/// How a list operation should page through results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: u32,
    pub page: Option<u32>,
    pub fetch_all: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page: None,
            fetch_all: true,
        }
    }
}

impl PageRequest {
    /// One specific page, no walking
    pub fn single(page: u32, page_size: u32) -> Self {
        Self {
            page_size,
            page: Some(page),
            fetch_all: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(TaigaError::Validation(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }
}

/// List a project-scoped resource, honouring the page request.
///
/// A failure on any page aborts the walk and discards what was collected.
pub async fn list_paged<T: DeserializeOwned>(
    client: &TaigaClient,
    resource_path: &str,
    project_id: i64,
    request: &PageRequest,
) -> Result<Vec<T>> {
    request.validate()?;

    let project = project_id.to_string();
    let page_size = request.page_size.to_string();

    if let (Some(page), false) = (request.page, request.fetch_all) {
        return client
            .get(
                resource_path,
                &[
                    ("project", project),
                    ("page_size", page_size),
                    ("page", page.to_string()),
                ],
            )
            .await;
    }

    if request.fetch_all {
        let mut items: Vec<T> = Vec::new();
        let mut current_page = 1;

        while current_page <= MAX_PAGES {
            let batch: Vec<T> = client
                .get(
                    resource_path,
                    &[
                        ("project", project.clone()),
                        ("page_size", page_size.clone()),
                        ("page", current_page.to_string()),
                    ],
                )
                .await?;

            let fetched = batch.len();
            tracing::debug!(
                path = %resource_path,
                page = current_page,
                items = fetched,
                "Fetched page"
            );

            if fetched == 0 {
                break;
            }

            items.extend(batch);

            if fetched < request.page_size as usize {
                break;
            }

            current_page += 1;
        }

        if current_page > MAX_PAGES {
            tracing::warn!(
                path = %resource_path,
                max_pages = MAX_PAGES,
                "Stopped paging at safety limit"
            );
        }

        return Ok(items);
    }

    client
        .get(
            resource_path,
            &[("project", project), ("page_size", page_size)],
        )
        .await
}
