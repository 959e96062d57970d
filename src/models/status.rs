use serde::{Deserialize, Serialize};

/// Workflow status of an epic, user story or task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub color: Option<String>,
    pub project: i64,
}
