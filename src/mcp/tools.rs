// Taiga tools exposed over MCP
//
// Every call opens its own Taiga session, runs to completion and closes the
// session before the result is returned. Argument problems are protocol
// errors; anything Taiga or the resolver reports becomes an `isError` result.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{JsonRpcError, McpToolDef, ToolsCallResult};
use crate::auth::AuthManager;
use crate::config::Config;
use crate::error::{Result, TaigaError};
use crate::format;
use crate::http_client::TaigaClient;
use crate::models::{
    CreateEpicRequest, CreateTaskRequest, CreateUserStoryRequest, UpdateTaskRequest,
    UpdateUserStoryRequest,
};
use crate::pagination::{PageRequest, DEFAULT_PAGE_SIZE};
use crate::resolver::{
    find_member_user_id, find_status_id, resolve_points, resolve_project, resolve_user_story_id,
};
use crate::services::{EpicService, ProjectService, TaskService, UserService, UserStoryService};

// ==================================================================================================
// Arguments
// ==================================================================================================

#[derive(Debug, Default, Deserialize)]
struct AuthenticateArgs {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoArgs {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectArgs {
    project_identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateItemArgs {
    project_identifier: String,
    subject: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs {
    project_identifier: String,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default = "default_fetch_all")]
    fetch_all: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_fetch_all() -> bool {
    true
}

impl ListArgs {
    /// `page` only applies once `fetchAll` is turned off
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page_size: self.page_size,
            page: self.page,
            fetch_all: self.fetch_all,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserStoryArgs {
    user_story_identifier: String,
    #[serde(default)]
    project_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserStoryArgs {
    user_story_identifier: String,
    #[serde(default)]
    project_identifier: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    /// Text or number
    #[serde(default)]
    points: Option<Value>,
    #[serde(default)]
    due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskArgs {
    project_identifier: String,
    user_story_identifier: String,
    subject: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpicIdArgs {
    epic_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIdArgs {
    task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskArgs {
    task_id: i64,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Blank strings count as "not provided"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_empty_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.filter(|t| !t.is_empty())
}

fn points_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => non_empty(Some(text)),
        other => Some(other.to_string()),
    }
}

fn parse_due_date(raw: &str) -> Result<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|date| date.to_string())
        .map_err(|_| {
            TaigaError::Validation(format!(
                "Invalid due date '{}'. Expected format YYYY-MM-DD",
                raw
            ))
        })
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> std::result::Result<T, JsonRpcError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments for {}: {}", tool, e)))
}

// ==================================================================================================
// Dispatch
// ==================================================================================================

/// Shared state every tool call needs
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    auth: Arc<AuthManager>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, auth: Arc<AuthManager>) -> Self {
        Self { config, auth }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open_session(&self) -> TaigaClient {
        TaigaClient::new(self.auth.clone(), &self.config)
    }

    /// Run one tool against a fresh Taiga session
    pub async fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<ToolsCallResult, JsonRpcError> {
        let session = self.open_session();

        let outcome = match name {
            "authenticate" => authenticate(&session, parse_args(name, arguments)?).await,
            "getCurrentUser" => {
                parse_args::<NoArgs>(name, arguments)?;
                get_current_user(&session).await
            }
            "listProjects" => {
                parse_args::<NoArgs>(name, arguments)?;
                list_projects(&session).await
            }
            "getProject" => get_project(&session, parse_args(name, arguments)?).await,
            "listProjectMembers" => {
                list_project_members(&session, parse_args(name, arguments)?).await
            }
            "createEpic" => create_epic(&session, parse_args(name, arguments)?).await,
            "listEpics" => list_epics(&session, parse_args(name, arguments)?).await,
            "getEpic" => get_epic(&session, parse_args(name, arguments)?).await,
            "createUserStory" => create_user_story(&session, parse_args(name, arguments)?).await,
            "listUserStories" => list_user_stories(&session, parse_args(name, arguments)?).await,
            "getUserStory" => get_user_story(&session, parse_args(name, arguments)?).await,
            "updateUserStory" => update_user_story(&session, parse_args(name, arguments)?).await,
            "listUserStoryTasks" => {
                list_user_story_tasks(&session, parse_args(name, arguments)?).await
            }
            "createTask" => create_task(&session, parse_args(name, arguments)?).await,
            "getTask" => get_task(&session, parse_args(name, arguments)?).await,
            "updateTask" => update_task(&session, parse_args(name, arguments)?).await,
            _ => return Err(JsonRpcError::invalid_params(format!("Unknown tool: {}", name))),
        };

        session.close();

        Ok(match outcome {
            Ok(text) => ToolsCallResult::text(text),
            Err(e) => {
                tracing::warn!(tool = %name, kind = e.kind(), status = ?e.status_code(), "Tool failed: {}", e);
                ToolsCallResult::error(format!("Error: {}", e))
            }
        })
    }
}

// ==================================================================================================
// Users and projects
// ==================================================================================================

async fn authenticate(client: &TaigaClient, args: AuthenticateArgs) -> Result<String> {
    let username = non_empty(args.username);
    let password = non_empty(args.password);
    client
        .auth_manager()
        .authenticate(username.as_deref(), password.as_deref())
        .await?;

    let user = UserService::new(client).get_current_user().await?;
    tracing::info!(username = %user.username, "Authenticated with Taiga");
    Ok(format::authenticated(&user))
}

async fn get_current_user(client: &TaigaClient) -> Result<String> {
    let user = UserService::new(client).get_current_user().await?;
    Ok(format::current_user(&user))
}

async fn list_projects(client: &TaigaClient) -> Result<String> {
    let user = UserService::new(client).get_current_user().await?;
    let projects = ProjectService::new(client).list_projects(Some(user.id)).await?;
    Ok(format::project_list(&projects))
}

async fn get_project(client: &TaigaClient, args: ProjectArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    Ok(format::project_details(&project))
}

async fn list_project_members(client: &TaigaClient, args: ProjectArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let members = ProjectService::new(client)
        .list_project_members(project.id)
        .await?;
    Ok(format::member_list(&members))
}

// ==================================================================================================
// Epics
// ==================================================================================================

async fn create_epic(client: &TaigaClient, args: CreateItemArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let epics = EpicService::new(client);

    let status = match non_empty(args.status) {
        Some(name) => Some(find_status_id(&epics.get_epic_statuses(project.id).await?, &name)?),
        None => None,
    };

    let request = CreateEpicRequest {
        project: project.id,
        subject: args.subject,
        description: non_empty(args.description),
        status,
        tags: non_empty_tags(args.tags),
    };
    let epic = epics.create_epic(&request).await?;
    tracing::info!(epic_id = epic.id, project_id = project.id, "Created epic");
    Ok(format::epic_created(&epic, &project.name))
}

async fn list_epics(client: &TaigaClient, args: ListArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let request = args.page_request();
    let epics = EpicService::new(client)
        .list_epics(project.id, &request)
        .await?;
    Ok(format::epic_list(&epics, &request))
}

async fn get_epic(client: &TaigaClient, args: EpicIdArgs) -> Result<String> {
    let epic = EpicService::new(client).get_epic(args.epic_id).await?;
    Ok(format::epic_details(&epic))
}

// ==================================================================================================
// User stories
// ==================================================================================================

async fn create_user_story(client: &TaigaClient, args: CreateItemArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let stories = UserStoryService::new(client);

    let status = match non_empty(args.status) {
        Some(name) => Some(find_status_id(
            &stories.get_user_story_statuses(project.id).await?,
            &name,
        )?),
        None => None,
    };

    let request = CreateUserStoryRequest {
        project: project.id,
        subject: args.subject,
        description: non_empty(args.description),
        status,
        tags: non_empty_tags(args.tags),
    };
    let story = stories.create_user_story(&request).await?;
    tracing::info!(user_story_id = story.id, project_id = project.id, "Created user story");
    Ok(format::user_story_created(&story, &project.name))
}

async fn list_user_stories(client: &TaigaClient, args: ListArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let request = args.page_request();
    let stories = UserStoryService::new(client)
        .list_user_stories(project.id, &request)
        .await?;
    Ok(format::user_story_list(&stories, &request))
}

async fn get_user_story(client: &TaigaClient, args: UserStoryArgs) -> Result<String> {
    let story_id = resolve_user_story_id(
        client,
        &args.user_story_identifier,
        args.project_identifier.as_deref(),
    )
    .await?;
    let story = UserStoryService::new(client).get_user_story(story_id).await?;
    Ok(format::user_story_details(&story))
}

async fn update_user_story(client: &TaigaClient, args: UpdateUserStoryArgs) -> Result<String> {
    let story_id = resolve_user_story_id(
        client,
        &args.user_story_identifier,
        args.project_identifier.as_deref(),
    )
    .await?;

    let stories = UserStoryService::new(client);
    let current = stories.get_user_story(story_id).await?;

    let mut request = UpdateUserStoryRequest {
        version: current.version,
        subject: non_empty(args.subject),
        description: non_empty(args.description),
        tags: non_empty_tags(args.tags),
        ..Default::default()
    };

    if let Some(points) = points_text(args.points) {
        request.points = resolve_points(current.points.as_ref(), &points);
    }

    if let Some(due_date) = non_empty(args.due_date) {
        request.due_date = Some(parse_due_date(&due_date)?);
    }

    if let Some(status) = non_empty(args.status) {
        let statuses = stories.get_user_story_statuses(current.project).await?;
        request.status = Some(find_status_id(&statuses, &status)?);
    }

    if let Some(assignee) = non_empty(args.assigned_to) {
        let members = ProjectService::new(client)
            .list_project_members(current.project)
            .await?;
        request.assigned_to = Some(find_member_user_id(&members, &assignee)?);
    }

    tracing::debug!(user_story_id = story_id, update = ?request, "Updating user story");
    let story = stories.update_user_story(story_id, &request).await?;
    Ok(format::user_story_updated(&story))
}

async fn list_user_story_tasks(client: &TaigaClient, args: UserStoryArgs) -> Result<String> {
    let story_id = resolve_user_story_id(
        client,
        &args.user_story_identifier,
        args.project_identifier.as_deref(),
    )
    .await?;
    let tasks = TaskService::new(client).list_tasks(story_id).await?;
    Ok(format::task_list(&tasks))
}

// ==================================================================================================
// Tasks
// ==================================================================================================

async fn create_task(client: &TaigaClient, args: CreateTaskArgs) -> Result<String> {
    let project = resolve_project(client, &args.project_identifier).await?;
    let story_id = resolve_user_story_id(
        client,
        &args.user_story_identifier,
        Some(args.project_identifier.as_str()),
    )
    .await?;
    let tasks = TaskService::new(client);

    let status = match non_empty(args.status) {
        Some(name) => Some(find_status_id(&tasks.get_task_statuses(project.id).await?, &name)?),
        None => None,
    };

    let request = CreateTaskRequest {
        project: project.id,
        subject: args.subject,
        user_story: Some(story_id),
        description: non_empty(args.description),
        status,
        tags: non_empty_tags(args.tags),
    };
    let task = tasks.create_task(&request).await?;
    tracing::info!(task_id = task.id, user_story_id = story_id, "Created task");
    Ok(format::task_created(&task, &project.name))
}

async fn get_task(client: &TaigaClient, args: TaskIdArgs) -> Result<String> {
    let task = TaskService::new(client).get_task(args.task_id).await?;
    Ok(format::task_details(&task))
}

async fn update_task(client: &TaigaClient, args: UpdateTaskArgs) -> Result<String> {
    let tasks = TaskService::new(client);
    let current = tasks.get_task(args.task_id).await?;

    let mut request = UpdateTaskRequest {
        version: current.version,
        subject: non_empty(args.subject),
        description: non_empty(args.description),
        tags: non_empty_tags(args.tags),
        ..Default::default()
    };

    if let Some(status) = non_empty(args.status) {
        let statuses = tasks.get_task_statuses(current.project).await?;
        request.status = Some(find_status_id(&statuses, &status)?);
    }

    if let Some(assignee) = non_empty(args.assigned_to) {
        let members = ProjectService::new(client)
            .list_project_members(current.project)
            .await?;
        request.assigned_to = Some(find_member_user_id(&members, &assignee)?);
    }

    let task = tasks.update_task(args.task_id, &request).await?;
    Ok(format::task_updated(&task))
}

// ==================================================================================================
// Definitions
// ==================================================================================================

fn project_identifier_schema() -> Value {
    json!({
        "type": "string",
        "description": "Project ID (numeric) or slug"
    })
}

fn user_story_identifier_schema() -> Value {
    json!({
        "type": "string",
        "description": "User story ID (numeric) or reference number prefixed with # (e.g. #42)"
    })
}

fn optional_project_schema() -> Value {
    json!({
        "type": "string",
        "description": "Project ID or slug; required when the user story is given as #ref"
    })
}

fn tags_schema() -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": "Tags to apply"})
}

fn create_item_schema(kind: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "projectIdentifier": project_identifier_schema(),
            "subject": {"type": "string", "description": format!("Title of the {}", kind)},
            "description": {"type": "string", "description": format!("Description of the {}", kind)},
            "status": {"type": "string", "description": "Status name (case-insensitive)"},
            "tags": tags_schema()
        },
        "required": ["projectIdentifier", "subject"]
    })
}

fn list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "projectIdentifier": project_identifier_schema(),
            "pageSize": {
                "type": "integer",
                "minimum": 1,
                "maximum": 100,
                "default": 100,
                "description": "Items per page (1-100)"
            },
            "page": {"type": "integer", "minimum": 1, "description": "Page to fetch when fetchAll is false"},
            "fetchAll": {
                "type": "boolean",
                "default": true,
                "description": "Walk every page (default: true, even when page is given)"
            }
        },
        "required": ["projectIdentifier"]
    })
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Every tool this server offers, in `tools/list` order
pub fn tool_definitions() -> Vec<McpToolDef> {
    vec![
        McpToolDef {
            name: "authenticate",
            description: "Authenticate with Taiga API. Uses credentials from environment variables if not provided.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "Taiga username or email"},
                    "password": {"type": "string", "description": "Taiga password"}
                }
            }),
        },
        McpToolDef {
            name: "getCurrentUser",
            description: "Show the currently authenticated Taiga user.",
            input_schema: empty_schema(),
        },
        McpToolDef {
            name: "listProjects",
            description: "List all projects accessible to the authenticated user.",
            input_schema: empty_schema(),
        },
        McpToolDef {
            name: "getProject",
            description: "Get detailed information about a specific project.",
            input_schema: json!({
                "type": "object",
                "properties": {"projectIdentifier": project_identifier_schema()},
                "required": ["projectIdentifier"]
            }),
        },
        McpToolDef {
            name: "listProjectMembers",
            description: "List all members of a project.",
            input_schema: json!({
                "type": "object",
                "properties": {"projectIdentifier": project_identifier_schema()},
                "required": ["projectIdentifier"]
            }),
        },
        McpToolDef {
            name: "createEpic",
            description: "Create a new epic in a project.",
            input_schema: create_item_schema("epic"),
        },
        McpToolDef {
            name: "listEpics",
            description: "List epics in a project with pagination support.",
            input_schema: list_schema(),
        },
        McpToolDef {
            name: "getEpic",
            description: "Get detailed information about an epic.",
            input_schema: json!({
                "type": "object",
                "properties": {"epicId": {"type": "integer", "description": "Epic ID"}},
                "required": ["epicId"]
            }),
        },
        McpToolDef {
            name: "createUserStory",
            description: "Create a new user story in a project.",
            input_schema: create_item_schema("user story"),
        },
        McpToolDef {
            name: "listUserStories",
            description: "List user stories in a project with pagination support.",
            input_schema: list_schema(),
        },
        McpToolDef {
            name: "getUserStory",
            description: "Get detailed information about a specific user story.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "userStoryIdentifier": user_story_identifier_schema(),
                    "projectIdentifier": optional_project_schema()
                },
                "required": ["userStoryIdentifier"]
            }),
        },
        McpToolDef {
            name: "updateUserStory",
            description: "Update an existing user story.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "userStoryIdentifier": user_story_identifier_schema(),
                    "projectIdentifier": optional_project_schema(),
                    "subject": {"type": "string", "description": "New title"},
                    "description": {"type": "string", "description": "New description"},
                    "status": {"type": "string", "description": "Status name (case-insensitive)"},
                    "assignedTo": {"type": "string", "description": "Username or full name of a project member"},
                    "tags": tags_schema(),
                    "points": {"type": ["string", "number"], "description": "Story points"},
                    "dueDate": {"type": "string", "description": "Due date (YYYY-MM-DD)"}
                },
                "required": ["userStoryIdentifier"]
            }),
        },
        McpToolDef {
            name: "listUserStoryTasks",
            description: "Get all tasks associated with a user story.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "userStoryIdentifier": user_story_identifier_schema(),
                    "projectIdentifier": optional_project_schema()
                },
                "required": ["userStoryIdentifier"]
            }),
        },
        McpToolDef {
            name: "createTask",
            description: "Create a new task within a user story.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectIdentifier": project_identifier_schema(),
                    "userStoryIdentifier": user_story_identifier_schema(),
                    "subject": {"type": "string", "description": "Title of the task"},
                    "description": {"type": "string", "description": "Description of the task"},
                    "status": {"type": "string", "description": "Status name (case-insensitive)"},
                    "tags": tags_schema()
                },
                "required": ["projectIdentifier", "userStoryIdentifier", "subject"]
            }),
        },
        McpToolDef {
            name: "getTask",
            description: "Get detailed information about a task.",
            input_schema: json!({
                "type": "object",
                "properties": {"taskId": {"type": "integer", "description": "Task ID"}},
                "required": ["taskId"]
            }),
        },
        McpToolDef {
            name: "updateTask",
            description: "Update an existing task.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "taskId": {"type": "integer", "description": "Task ID"},
                    "subject": {"type": "string", "description": "New title"},
                    "description": {"type": "string", "description": "New description"},
                    "status": {"type": "string", "description": "Status name (case-insensitive)"},
                    "assignedTo": {"type": "string", "description": "Username or full name of a project member"},
                    "tags": tags_schema()
                },
                "required": ["taskId"]
            }),
        },
    ]
}
