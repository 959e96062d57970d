use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::deserialize_owner_id;

fn default_true() -> bool {
    true
}

/// Taiga project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_owner_id")]
    pub owner: i64,
    #[serde(default = "default_true")]
    pub is_private: bool,
    #[serde(default)]
    pub total_memberships: i64,
    #[serde(default)]
    pub total_story_points: Option<f64>,
    #[serde(default = "default_true")]
    pub is_backlog_activated: bool,
    #[serde(default)]
    pub is_kanban_activated: bool,
    #[serde(default = "default_true")]
    pub is_wiki_activated: bool,
    #[serde(default = "default_true")]
    pub is_issues_activated: bool,
}

/// User details nested in a membership
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUserInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Project membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: i64,
    /// Absent for pending invitations
    #[serde(default)]
    pub user: Option<i64>,
    pub role: i64,
    #[serde(default)]
    pub role_name: String,
    pub project: i64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub user_extra_info: Option<MemberUserInfo>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl ProjectMember {
    /// Username from the membership itself or its nested user info
    pub fn display_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.user_extra_info
                    .as_ref()
                    .and_then(|info| info.username.as_deref())
            })
    }

    /// Full name from the membership itself or its nested user info
    pub fn display_full_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.user_extra_info
                    .as_ref()
                    .and_then(|info| info.full_name.as_deref())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_owner_as_object() {
        let project: Project = serde_json::from_value(json!({
            "id": 1,
            "name": "Demo",
            "slug": "demo",
            "created_date": "2024-01-02T03:04:05.000Z",
            "modified_date": "2024-01-02T03:04:05.000Z",
            "owner": {"id": 9, "username": "alice"}
        }))
        .unwrap();
        assert_eq!(project.owner, 9);
        assert!(project.is_private);
        assert_eq!(project.total_memberships, 0);
    }

    #[test]
    fn test_project_owner_as_id() {
        let project: Project = serde_json::from_value(json!({
            "id": 1,
            "name": "Demo",
            "slug": "demo",
            "description": "A demo",
            "created_date": "2024-01-02T03:04:05Z",
            "modified_date": "2024-01-02T03:04:05Z",
            "owner": 3,
            "is_private": false,
            "total_memberships": 4
        }))
        .unwrap();
        assert_eq!(project.owner, 3);
        assert!(!project.is_private);
        assert_eq!(project.description.as_deref(), Some("A demo"));
    }

    #[test]
    fn test_member_names_fall_back_to_extra_info() {
        let member: ProjectMember = serde_json::from_value(json!({
            "id": 1,
            "user": 5,
            "role": 2,
            "role_name": "Back",
            "project": 1,
            "is_admin": false,
            "user_extra_info": {"username": "carol", "full_name": "Carol C"}
        }))
        .unwrap();
        assert_eq!(member.display_username(), Some("carol"));
        assert_eq!(member.display_full_name(), Some("Carol C"));

        let member: ProjectMember = serde_json::from_value(json!({
            "id": 2,
            "user": 6,
            "role": 2,
            "role_name": "Front",
            "project": 1,
            "username": "dave",
            "full_name": "Dave D"
        }))
        .unwrap();
        assert_eq!(member.display_username(), Some("dave"));
        assert_eq!(member.display_full_name(), Some("Dave D"));
    }
}
