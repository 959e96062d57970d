// Data models for Taiga API resources

pub mod common;
pub mod epic;
pub mod project;
pub mod status;
pub mod task;
pub mod user;
pub mod userstory;

pub use common::{ProjectExtraInfo, RefExtraInfo, StatusExtraInfo, UserExtraInfo};
pub use epic::{CreateEpicRequest, Epic};
pub use project::{MemberUserInfo, Project, ProjectMember};
pub use status::Status;
pub use task::{CreateTaskRequest, Task, UpdateTaskRequest};
pub use user::User;
pub use userstory::{CreateUserStoryRequest, UpdateUserStoryRequest, UserStory};
