pub mod client;
pub mod models;

pub use client::{ApiError, TaskApi, TodoistClient, TodoistConfig, TODOIST_HOST};
pub use models::{Due, Project, Task};
