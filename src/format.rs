// Human-readable tool output

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{
    Epic, Project, ProjectMember, StatusExtraInfo, Task, User, UserExtraInfo, UserStory,
};
use crate::pagination::PageRequest;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn status_name<'a>(status: Option<&'a StatusExtraInfo>, fallback: &'a str) -> &'a str {
    status.map(|s| s.name.as_str()).unwrap_or(fallback)
}

fn assignee(user: Option<&UserExtraInfo>) -> &str {
    match user {
        Some(info) if !info.full_name.is_empty() => &info.full_name,
        Some(info) if !info.username.is_empty() => &info.username,
        _ => "Unassigned",
    }
}

fn description(text: Option<&str>) -> &str {
    match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => "No description",
    }
}

fn tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "None".to_string()
    } else {
        tags.join(", ")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Render story points, which are either a role -> value map or a scalar.
/// A map carrying a `name` entry is shown by that name alone.
pub fn points(story: &UserStory) -> String {
    if let Some(total) = story.total_points {
        return format!("{}", total);
    }
    match &story.points {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::Object(roles)) if roles.is_empty() => "None".to_string(),
        Some(Value::Object(named)) if named.contains_key("name") => match &named["name"] {
            Value::String(name) => name.clone(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        },
        Some(Value::Object(roles)) => roles
            .iter()
            .map(|(role, value)| format!("{}: {}", role, value))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Header suffix matching what `list_paged` actually fetched
fn pagination_suffix(request: &PageRequest, count: usize, noun: &str) -> String {
    match (request.page, request.fetch_all) {
        (Some(page), false) => format!(" (Page {})", page),
        (_, true) => format!(" (All {} {})", count, noun),
        (None, false) => String::new(),
    }
}

// ==================================================================================================
// Users and projects
// ==================================================================================================

pub fn authenticated(user: &User) -> String {
    format!(
        "Successfully authenticated as {} ({}).",
        user.display_name(),
        user.username
    )
}

pub fn current_user(user: &User) -> String {
    format!(
        "Current User:\n\nUsername: {}\nFull name: {}\nID: {}\nEmail: {}\nActive: {}\n",
        user.username,
        user.display_name(),
        user.id,
        user.email.as_deref().unwrap_or("Not available"),
        yes_no(user.is_active)
    )
}

pub fn project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }
    let lines: Vec<String> = projects
        .iter()
        .map(|p| format!("- {} (ID: {}, Slug: {})", p.name, p.id, p.slug))
        .collect();
    format!("Your Taiga Projects:\n\n{}", lines.join("\n"))
}

pub fn project_details(project: &Project) -> String {
    format!(
        "Project Details:\n\n\
         Name: {}\n\
         ID: {}\n\
         Slug: {}\n\
         Description: {}\n\
         Created: {}\n\
         Total Members: {}\n\
         Private: {}\n",
        project.name,
        project.id,
        project.slug,
        description(project.description.as_deref()),
        timestamp(&project.created_date),
        project.total_memberships,
        yes_no(project.is_private)
    )
}

pub fn member_list(members: &[ProjectMember]) -> String {
    if members.is_empty() {
        return "No members found in this project.".to_string();
    }
    let lines: Vec<String> = members
        .iter()
        .map(|m| {
            format!(
                "- {} (@{}) - {}",
                m.display_full_name().unwrap_or("Unknown"),
                m.display_username().unwrap_or("unknown"),
                m.role_name
            )
        })
        .collect();
    format!("Project Members:\n\n{}", lines.join("\n"))
}

// ==================================================================================================
// Epics
// ==================================================================================================

pub fn epic_created(epic: &Epic, project_name: &str) -> String {
    format!(
        "Epic created successfully!\n\nSubject: {}\nReference: #{}\nStatus: {}\nProject: {}\n",
        epic.subject,
        epic.reference,
        status_name(epic.status_extra_info.as_ref(), "Default status"),
        project_name
    )
}

pub fn epic_list(epics: &[Epic], request: &PageRequest) -> String {
    if epics.is_empty() {
        return "No epics found in this project.".to_string();
    }
    let lines: Vec<String> = epics
        .iter()
        .map(|e| {
            format!(
                "- #{}: {} (Status: {})",
                e.reference,
                e.subject,
                status_name(e.status_extra_info.as_ref(), "Unknown")
            )
        })
        .collect();
    format!(
        "Epics in Project{}:\n\n{}",
        pagination_suffix(request, epics.len(), "epics"),
        lines.join("\n")
    )
}

pub fn epic_details(epic: &Epic) -> String {
    format!(
        "Epic Details:\n\n\
         Subject: {}\n\
         Reference: #{}\n\
         Description: {}\n\
         Status: {}\n\
         Assigned to: {}\n\
         Tags: {}\n\
         Created: {}\n\
         Modified: {}\n\
         Project: {}\n",
        epic.subject,
        epic.reference,
        description(epic.description.as_deref()),
        status_name(epic.status_extra_info.as_ref(), "Unknown"),
        assignee(epic.assigned_to_extra_info.as_ref()),
        tags(&epic.tags),
        timestamp(&epic.created_date),
        timestamp(&epic.modified_date),
        epic.project_extra_info
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("N/A")
    )
}

// ==================================================================================================
// User stories
// ==================================================================================================

pub fn user_story_created(story: &UserStory, project_name: &str) -> String {
    format!(
        "User story created successfully!\n\nSubject: {}\nReference: #{}\nStatus: {}\nProject: {}\n",
        story.subject,
        story.reference,
        status_name(story.status_extra_info.as_ref(), "Default status"),
        project_name
    )
}

pub fn user_story_list(stories: &[UserStory], request: &PageRequest) -> String {
    if stories.is_empty() {
        return "No user stories found in this project.".to_string();
    }
    let lines: Vec<String> = stories
        .iter()
        .map(|s| {
            format!(
                "- #{}: {} (Status: {})",
                s.reference,
                s.subject,
                status_name(s.status_extra_info.as_ref(), "Unknown")
            )
        })
        .collect();
    format!(
        "User Stories in Project{}:\n\n{}",
        pagination_suffix(request, stories.len(), "stories"),
        lines.join("\n")
    )
}

fn story_project_name(story: &UserStory) -> &str {
    story
        .project_extra_info
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("N/A")
}

pub fn user_story_details(story: &UserStory) -> String {
    format!(
        "User Story Details:\n\n\
         Subject: {}\n\
         Reference: #{}\n\
         Description: {}\n\
         Status: {}\n\
         Assigned to: {}\n\
         Points: {}\n\
         Tags: {}\n\
         Due Date: {}\n\
         Created: {}\n\
         Modified: {}\n\
         Project: {}\n",
        story.subject,
        story.reference,
        description(story.description.as_deref()),
        status_name(story.status_extra_info.as_ref(), "Unknown"),
        assignee(story.assigned_to_extra_info.as_ref()),
        points(story),
        tags(&story.tags),
        story
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Not set".to_string()),
        timestamp(&story.created_date),
        timestamp(&story.modified_date),
        story_project_name(story)
    )
}

pub fn user_story_updated(story: &UserStory) -> String {
    format!(
        "User story updated successfully!\n\n\
         Subject: {}\n\
         Reference: #{}\n\
         Status: {}\n\
         Assigned to: {}\n\
         Points: {}\n\
         Project: {}\n",
        story.subject,
        story.reference,
        status_name(story.status_extra_info.as_ref(), "Unknown"),
        assignee(story.assigned_to_extra_info.as_ref()),
        points(story),
        story_project_name(story)
    )
}

// ==================================================================================================
// Tasks
// ==================================================================================================

fn task_story(task: &Task) -> String {
    match &task.user_story_extra_info {
        Some(story) => format!("#{} - {}", story.reference, story.subject),
        None => "N/A".to_string(),
    }
}

pub fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found for this user story.".to_string();
    }
    let lines: Vec<String> = tasks
        .iter()
        .map(|t| {
            format!(
                "- #{}: {} (Status: {}, Assigned: {})",
                t.reference,
                t.subject,
                status_name(t.status_extra_info.as_ref(), "Unknown"),
                assignee(t.assigned_to_extra_info.as_ref())
            )
        })
        .collect();
    format!("Tasks in User Story:\n\n{}", lines.join("\n"))
}

pub fn task_created(task: &Task, project_name: &str) -> String {
    format!(
        "Task created successfully!\n\nSubject: {}\nReference: #{}\nStatus: {}\nProject: {}\nUser Story: {}\n",
        task.subject,
        task.reference,
        status_name(task.status_extra_info.as_ref(), "Default status"),
        project_name,
        task_story(task)
    )
}

pub fn task_details(task: &Task) -> String {
    format!(
        "Task Details:\n\n\
         Subject: {}\n\
         Reference: #{}\n\
         Description: {}\n\
         Status: {}\n\
         Assigned to: {}\n\
         User Story: {}\n\
         Tags: {}\n\
         Created: {}\n\
         Modified: {}\n",
        task.subject,
        task.reference,
        description(task.description.as_deref()),
        status_name(task.status_extra_info.as_ref(), "Unknown"),
        assignee(task.assigned_to_extra_info.as_ref()),
        task_story(task),
        tags(&task.tags),
        timestamp(&task.created_date),
        timestamp(&task.modified_date)
    )
}

pub fn task_updated(task: &Task) -> String {
    format!(
        "Task updated successfully!\n\nSubject: {}\nReference: #{}\nStatus: {}\nAssigned to: {}\nUser Story: {}\n",
        task.subject,
        task.reference,
        status_name(task.status_extra_info.as_ref(), "Unknown"),
        assignee(task.assigned_to_extra_info.as_ref()),
        task_story(task)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story(extra: Value) -> UserStory {
        let mut base = json!({
            "id": 21,
            "ref": 8,
            "version": 1,
            "subject": "Login form",
            "project": 1,
            "created_date": "2024-03-01T10:00:00Z",
            "modified_date": "2024-03-02T11:30:00Z"
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut base, extra) {
            base.extend(extra);
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_project_list() {
        let project: Project = serde_json::from_value(json!({
            "id": 1,
            "name": "Demo",
            "slug": "demo",
            "created_date": "2024-01-01T00:00:00Z",
            "modified_date": "2024-01-01T00:00:00Z",
            "owner": 1
        }))
        .unwrap();
        assert_eq!(
            project_list(&[project]),
            "Your Taiga Projects:\n\n- Demo (ID: 1, Slug: demo)"
        );
        assert_eq!(project_list(&[]), "No projects found.");
    }

    #[test]
    fn test_story_list_pagination_suffix() {
        let stories = vec![
            story(json!({"status_extra_info": {"name": "New"}})),
            story(json!({"id": 22, "ref": 9, "subject": "Logout"})),
        ];

        let all = user_story_list(&stories, &PageRequest::default());
        assert!(all.starts_with("User Stories in Project (All 2 stories):"));
        assert!(all.contains("- #8: Login form (Status: New)"));
        assert!(all.contains("- #9: Logout (Status: Unknown)"));

        let paged = user_story_list(&stories, &PageRequest::single(3, 2));
        assert!(paged.starts_with("User Stories in Project (Page 3):"));

        let bare = PageRequest {
            fetch_all: false,
            ..PageRequest::default()
        };
        assert!(user_story_list(&stories, &bare).starts_with("User Stories in Project:"));

        assert_eq!(
            user_story_list(&[], &PageRequest::default()),
            "No user stories found in this project."
        );
    }

    #[test]
    fn test_story_details() {
        let text = user_story_details(&story(json!({
            "description": "",
            "assigned_to_extra_info": {"username": "alice", "full_name_display": "Alice L"},
            "tags": [["auth", null], ["ui", null]],
            "due_date": "2024-04-01",
            "points": {"3": 5.0}
        })));
        assert!(text.contains("Description: No description"));
        assert!(text.contains("Assigned to: Alice L"));
        assert!(text.contains("Tags: auth, ui"));
        assert!(text.contains("Due Date: 2024-04-01"));
        assert!(text.contains("Points: 3: 5.0"));
        assert!(text.contains("Modified: 2024-03-02 11:30:00"));
        assert!(text.contains("Project: N/A"));
    }

    #[test]
    fn test_points_rendering() {
        assert_eq!(points(&story(json!({}))), "None");
        assert_eq!(points(&story(json!({"points": 3.5}))), "3.5");
        assert_eq!(points(&story(json!({"points": "?"}))), "?");
        assert_eq!(
            points(&story(json!({"points": {"1": 1.0}, "total_points": 8.0}))),
            "8"
        );
        assert_eq!(
            points(&story(json!({"points": {"1": 1.0, "2": 3.0}}))),
            "1: 1.0, 2: 3.0"
        );
        assert_eq!(points(&story(json!({"points": {"name": "XL"}}))), "XL");
        assert_eq!(points(&story(json!({"points": {"name": null}}))), "None");
    }

    #[test]
    fn test_task_lines() {
        let task: Task = serde_json::from_value(json!({
            "id": 31,
            "ref": 12,
            "version": 1,
            "subject": "Write migration",
            "project": 1,
            "user_story_extra_info": {"id": 21, "ref": 8, "subject": "Login form"},
            "status_extra_info": {"name": "In progress"},
            "created_date": "2024-03-01T10:00:00Z",
            "modified_date": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(
            task_list(std::slice::from_ref(&task)),
            "Tasks in User Story:\n\n- #12: Write migration (Status: In progress, Assigned: Unassigned)"
        );
        assert!(task_created(&task, "Demo").contains("User Story: #8 - Login form"));
        assert_eq!(task_list(&[]), "No tasks found for this user story.");
    }
}
