// Thin typed wrappers over the Taiga REST endpoints

mod epic;
mod project;
mod task;
mod user;
mod userstory;

pub use epic::EpicService;
pub use project::ProjectService;
pub use task::TaskService;
pub use user::UserService;
pub use userstory::UserStoryService;
