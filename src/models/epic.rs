use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::{
    deserialize_null_vec, deserialize_tags, ProjectExtraInfo, StatusExtraInfo, UserExtraInfo,
};

/// Taiga epic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: i64,
    pub version: i64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project: i64,
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
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub project_extra_info: Option<ProjectExtraInfo>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    pub watchers: Vec<i64>,
}

/// Body of `POST /epics`
#[derive(Debug, Clone, Serialize)]
pub struct CreateEpicRequest {
    pub project: i64,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
