// Resolution of human-oriented identifiers (ids, slugs, #refs, names)

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::{Result, TaigaError};
use crate::http_client::TaigaClient;
use crate::models::{Project, ProjectMember, Status};
use crate::pagination::PageRequest;
use crate::services::{ProjectService, UserStoryService};

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

static REF_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#(\d+)$").unwrap());

/// A project named by numeric id or by slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectIdentifier {
    Id(i64),
    Slug(String),
}

impl ProjectIdentifier {
    /// All-digit input is an id; anything else is a slug
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TaigaError::Validation(
                "Project identifier must not be empty".to_string(),
            ));
        }
        if NUMERIC_ID.is_match(raw) {
            return raw
                .parse()
                .map(ProjectIdentifier::Id)
                .map_err(|_| TaigaError::Validation(format!("Project id '{}' is out of range", raw)));
        }
        Ok(ProjectIdentifier::Slug(raw.to_string()))
    }
}

/// A user story named by numeric id or by project-scoped `#ref`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStoryIdentifier {
    Id(i64),
    Ref(i64),
}

impl UserStoryIdentifier {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(caps) = REF_NUMBER.captures(raw) {
            let number = caps[1].parse().map_err(|_| {
                TaigaError::Validation(format!("Reference '{}' is out of range", raw))
            })?;
            return Ok(UserStoryIdentifier::Ref(number));
        }
        if NUMERIC_ID.is_match(raw) {
            if let Ok(id) = raw.parse() {
                return Ok(UserStoryIdentifier::Id(id));
            }
        }
        Err(TaigaError::Validation(format!(
            "Invalid user story identifier '{}'. Use a numeric ID or a reference like #42",
            raw
        )))
    }
}

/// Look up a project by id or slug
pub async fn resolve_project(client: &TaigaClient, identifier: &str) -> Result<Project> {
    let projects = ProjectService::new(client);
    match ProjectIdentifier::parse(identifier)? {
        ProjectIdentifier::Id(id) => projects.get_project(id).await,
        ProjectIdentifier::Slug(slug) => projects.get_project_by_slug(&slug).await,
    }
}

/// Turn a user story identifier into its global id.
///
/// `#ref` forms need the project for scope and walk every story in it.
pub async fn resolve_user_story_id(
    client: &TaigaClient,
    user_story_identifier: &str,
    project_identifier: Option<&str>,
) -> Result<i64> {
    let reference = match UserStoryIdentifier::parse(user_story_identifier)? {
        UserStoryIdentifier::Id(id) => return Ok(id),
        UserStoryIdentifier::Ref(reference) => reference,
    };

    let project_identifier = project_identifier
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            TaigaError::Validation(
                "Project identifier is required when using user story reference number"
                    .to_string(),
            )
        })?;

    let project = resolve_project(client, project_identifier).await?;
    let stories = UserStoryService::new(client)
        .list_user_stories(project.id, &PageRequest::default())
        .await?;

    stories
        .iter()
        .find(|story| story.reference == reference)
        .map(|story| story.id)
        .ok_or_else(|| {
            TaigaError::Validation(format!(
                "User story with reference #{} not found",
                reference
            ))
        })
}

/// Case-insensitive status lookup by name
pub fn find_status_id(statuses: &[Status], name: &str) -> Result<i64> {
    statuses
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
        .map(|s| s.id)
        .ok_or_else(|| {
            let available: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
            TaigaError::Validation(format!(
                "Status '{}' not found. Available statuses: {}",
                name,
                available.join(", ")
            ))
        })
}

/// Case-insensitive member lookup by username or full name; yields the user id
pub fn find_member_user_id(members: &[ProjectMember], name: &str) -> Result<i64> {
    let wanted = name.trim().to_lowercase();

    let found = members.iter().find_map(|member| {
        let user = member.user?;
        let matches = member
            .display_username()
            .is_some_and(|u| u.to_lowercase() == wanted)
            || member
                .display_full_name()
                .is_some_and(|f| f.to_lowercase() == wanted);
        matches.then_some(user)
    });

    found.ok_or_else(|| {
        let usernames: Vec<&str> = members
            .iter()
            .map(|m| m.display_username().unwrap_or("unknown"))
            .collect();
        TaigaError::Validation(format!(
            "User '{}' not found in project. Available members: {}",
            name,
            usernames.join(", ")
        ))
    })
}

/// Build the `points` payload for a story update.
///
/// Role-based stories (points stored as a role -> value map) get the first
/// role updated; scalar stories get a float, or the raw text if it does not
/// parse. Returns `None` when a role-based value cannot be parsed.
pub fn resolve_points(current: Option<&Value>, raw: &str) -> Option<Value> {
    let raw = raw.trim();

    if let Some(Value::Object(roles)) = current {
        if let Some(first_role) = roles.keys().next() {
            return match raw.parse::<f64>() {
                Ok(value) => Some(json!({ first_role.as_str(): value })),
                Err(_) => {
                    tracing::warn!(points = %raw, "Could not convert points value to float");
                    None
                }
            };
        }
    }

    match raw.parse::<f64>() {
        Ok(value) => Some(json!(value)),
        Err(_) => Some(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthManager;
    use crate::config::Config;
    use mockito::Matcher;
    use std::sync::Arc;

    fn status(id: i64, name: &str) -> Status {
        Status {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            order: id,
            is_closed: false,
            color: None,
            project: 1,
        }
    }

    fn member(user: Option<i64>, username: &str, full_name: &str) -> ProjectMember {
        serde_json::from_value(json!({
            "id": user.unwrap_or(0) + 100,
            "user": user,
            "role": 1,
            "role_name": "Dev",
            "project": 1,
            "username": username,
            "full_name": full_name
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_project_identifier() {
        assert_eq!(ProjectIdentifier::parse("42").unwrap(), ProjectIdentifier::Id(42));
        assert_eq!(
            ProjectIdentifier::parse("my-project").unwrap(),
            ProjectIdentifier::Slug("my-project".to_string())
        );
        assert_eq!(
            ProjectIdentifier::parse("42abc").unwrap(),
            ProjectIdentifier::Slug("42abc".to_string())
        );
        assert!(ProjectIdentifier::parse("  ").is_err());
    }

    #[test]
    fn test_parse_user_story_identifier() {
        assert_eq!(
            UserStoryIdentifier::parse("123").unwrap(),
            UserStoryIdentifier::Id(123)
        );
        assert_eq!(
            UserStoryIdentifier::parse("#7").unwrap(),
            UserStoryIdentifier::Ref(7)
        );
        assert!(UserStoryIdentifier::parse("#abc").is_err());
        assert!(UserStoryIdentifier::parse("story").is_err());
    }

    #[test]
    fn test_find_status_id_case_insensitive() {
        let statuses = vec![status(1, "New"), status(2, "In progress")];
        assert_eq!(find_status_id(&statuses, "in PROGRESS").unwrap(), 2);

        let err = find_status_id(&statuses, "Done").unwrap_err();
        assert!(matches!(err, TaigaError::Validation(_)));
        assert!(err.to_string().contains("New, In progress"));
    }

    #[test]
    fn test_find_member_by_username_or_full_name() {
        let members = vec![
            member(Some(5), "alice", "Alice Liddell"),
            member(None, "pending", "Pending Invite"),
            member(Some(6), "bob", "Bob Builder"),
        ];
        assert_eq!(find_member_user_id(&members, "ALICE").unwrap(), 5);
        assert_eq!(find_member_user_id(&members, "bob builder").unwrap(), 6);

        let err = find_member_user_id(&members, "pending").unwrap_err();
        assert!(err.to_string().contains("alice, pending, bob"));
    }

    #[test]
    fn test_resolve_points() {
        let role_points = json!({"3": 1.0, "4": 2.0});
        assert_eq!(
            resolve_points(Some(&role_points), "5"),
            Some(json!({"3": 5.0}))
        );
        assert_eq!(resolve_points(Some(&role_points), "lots"), None);

        assert_eq!(resolve_points(None, "2.5"), Some(json!(2.5)));
        assert_eq!(resolve_points(Some(&json!(1.0)), "?"), Some(json!("?")));
        assert_eq!(resolve_points(Some(&json!({})), "8"), Some(json!(8.0)));
    }

    #[tokio::test]
    async fn test_resolve_user_story_ref_requires_project() {
        let config = Config::default();
        let auth = Arc::new(AuthManager::new_for_testing("tok".to_string(), &config).unwrap());
        let client = TaigaClient::new(auth, &config);

        let err = resolve_user_story_id(&client, "#3", None).await.unwrap_err();
        assert!(matches!(err, TaigaError::Validation(_)));

        // Plain ids resolve without any request
        assert_eq!(resolve_user_story_id(&client, "77", None).await.unwrap(), 77);
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn test_resolve_user_story_ref_through_project() {
        let mut server = mockito::Server::new_async().await;
        let _project = server
            .mock("GET", "/projects/by_slug")
            .match_query(Matcher::UrlEncoded("slug".into(), "demo".into()))
            .with_status(200)
            .with_body(
                json!({
                    "id": 1,
                    "name": "Demo",
                    "slug": "demo",
                    "created_date": "2024-01-01T00:00:00Z",
                    "modified_date": "2024-01-01T00:00:00Z",
                    "owner": 1
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _stories = server
            .mock("GET", "/userstories")
            .match_query(Matcher::UrlEncoded("project".into(), "1".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"id": 501, "ref": 2, "version": 1, "subject": "A", "project": 1,
                     "created_date": "2024-01-01T00:00:00Z", "modified_date": "2024-01-01T00:00:00Z"},
                    {"id": 502, "ref": 3, "version": 1, "subject": "B", "project": 1,
                     "created_date": "2024-01-01T00:00:00Z", "modified_date": "2024-01-01T00:00:00Z"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let config = Config {
            api_url: server.url(),
            ..Config::default()
        };
        let auth = Arc::new(AuthManager::new_for_testing("tok".to_string(), &config).unwrap());
        let client = TaigaClient::new(auth, &config);

        assert_eq!(
            resolve_user_story_id(&client, "#3", Some("demo")).await.unwrap(),
            502
        );

        let err = resolve_user_story_id(&client, "#9", Some("demo"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("#9 not found"));
    }
}
