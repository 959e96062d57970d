use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{
    deserialize_null_vec, deserialize_tags, ProjectExtraInfo, RefExtraInfo, StatusExtraInfo,
    UserExtraInfo,
};

/// Taiga task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: i64,
    pub version: i64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project: i64,
    #[serde(default)]
    pub user_story: Option<i64>,
    #[serde(default)]
    pub user_story_extra_info: Option<RefExtraInfo>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub status_extra_info: Option<StatusExtraInfo>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub assigned_to_extra_info: Option<UserExtraInfo>,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default)]
    pub owner_extra_info: Option<UserExtraInfo>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    #[serde(default)]
    pub finished_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub project_extra_info: Option<ProjectExtraInfo>,
    #[serde(default)]
    pub milestone: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    pub watchers: Vec<i64>,
}

/// Body of `POST /tasks`
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub project: i64,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Body of `PATCH /tasks/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTaskRequest {
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
