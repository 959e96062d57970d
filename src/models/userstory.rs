use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{
    deserialize_null_vec, deserialize_tags, ProjectExtraInfo, StatusExtraInfo, UserExtraInfo,
};

/// Taiga user story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStory {
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
    /// Either a role -> points map or a scalar, depending on project setup
    #[serde(default)]
    pub points: Option<Value>,
    #[serde(default)]
    pub total_points: Option<f64>,
    #[serde(default)]
    pub project_extra_info: Option<ProjectExtraInfo>,
    #[serde(default)]
    pub milestone: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    pub watchers: Vec<i64>,
}

/// Body of `POST /userstories`
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserStoryRequest {
    pub project: i64,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Body of `PATCH /userstories/{id}`; `version` guards against lost updates
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserStoryRequest {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Value>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_story_with_role_points() {
        let story: UserStory = serde_json::from_value(json!({
            "id": 21,
            "ref": 8,
            "version": 1,
            "subject": "Login form",
            "project": 1,
            "status": 2,
            "created_date": "2024-03-01T10:00:00Z",
            "modified_date": "2024-03-01T10:00:00Z",
            "due_date": "2024-04-01",
            "points": {"1": 3, "2": 5},
            "tags": ["auth"]
        }))
        .unwrap();
        assert_eq!(story.reference, 8);
        assert_eq!(story.due_date.unwrap().to_string(), "2024-04-01");
        assert!(story.points.unwrap().is_object());
        assert_eq!(story.tags, vec!["auth"]);
    }

    #[test]
    fn test_update_request_serialization() {
        let request = UpdateUserStoryRequest {
            version: 3,
            subject: Some("New subject".to_string()),
            points: Some(json!({"1": 5.0})),
            ..Default::default()
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"version": 3, "subject": "New subject", "points": {"1": 5.0}})
        );
    }
}
