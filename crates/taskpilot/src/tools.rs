//! Tool handlers for project and task CRUD against the task-management API.
//!
//! Handlers resolve human-readable names to API ids by listing and scanning
//! for an exact match; the list is re-fetched on every call so results never
//! go stale within a turn. All failures, including "not found", come back as
//! results the loop relays to the model, never as panics.
pub mod projects;
pub mod tasks;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::agent::Agent;
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::registry::ToolHandler;
use crate::todoist::{ApiError, TaskApi};

/// Every handler over the task API, in the order they are advertised
pub fn all(api: Arc<dyn TaskApi>) -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(projects::GetUserProjects::new(api.clone())),
        Box::new(projects::CreateNewProject::new(api.clone())),
        Box::new(projects::GetProject::new(api.clone())),
        Box::new(projects::UpdateProject::new(api.clone())),
        Box::new(projects::DeleteProject::new(api.clone())),
        Box::new(tasks::GetActiveTasks::new(api.clone())),
        Box::new(tasks::GetTasksByDueDate::new(api.clone())),
        Box::new(tasks::CreateNewTask::new(api.clone())),
        Box::new(tasks::UpdateTask::new(api.clone())),
        Box::new(tasks::CompleteTask::new(api)),
    ]
}

/// Register every task-management tool on the agent
pub fn install(agent: &mut Agent, api: Arc<dyn TaskApi>) -> AgentResult<()> {
    for handler in all(api) {
        agent.add_tool(handler)?;
    }
    Ok(())
}

pub(crate) fn api_error(e: ApiError) -> AgentError {
    AgentError::ExecutionError(e.to_string())
}

pub(crate) fn required_str(arguments: &Value, key: &str) -> AgentResult<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AgentError::InvalidParameters(format!("missing required argument '{}'", key))
        })
}

pub(crate) fn optional_str(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn json_content<T: Serialize>(value: &T) -> AgentResult<Vec<Content>> {
    let data = serde_json::to_value(value).map_err(|e| AgentError::Internal(e.to_string()))?;
    Ok(vec![Content::json(data)])
}

/// Find a project id by exact name match; first match wins.
///
/// The full project list is fetched fresh on every call.
pub(crate) async fn resolve_project_id(
    api: &dyn TaskApi,
    project_name: &str,
) -> AgentResult<String> {
    let projects = api.projects().await.map_err(api_error)?;
    projects
        .into_iter()
        .find(|project| project.name == project_name)
        .map(|project| project.id)
        .ok_or_else(|| {
            AgentError::ExecutionError(format!("Project '{}' not found.", project_name))
        })
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::todoist::{ApiError, Due, Project, Task, TaskApi};

    /// In-memory task API for handler tests
    #[derive(Default)]
    pub struct FakeApi {
        pub projects: Mutex<Vec<Project>>,
        pub tasks: Mutex<Vec<Task>>,
        next_id: AtomicU64,
        pub failing: Mutex<Option<String>>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                ..Self::default()
            }
        }

        pub fn with_project(self, id: &str, name: &str) -> Self {
            self.projects.lock().unwrap().push(project(id, name));
            self
        }

        pub fn with_task(self, id: &str, project_id: &str, content: &str, due: Option<&str>) -> Self {
            self.tasks
                .lock()
                .unwrap()
                .push(task(id, project_id, content, due));
            self
        }

        pub fn fail_with(&self, message: &str) {
            *self.failing.lock().unwrap() = Some(message.to_string());
        }

        fn check_failing(&self) -> Result<(), ApiError> {
            if let Some(message) = self.failing.lock().unwrap().clone() {
                return Err(ApiError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: message,
                });
            }
            Ok(())
        }

        fn fresh_id(&self) -> String {
            self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
        }
    }

    pub fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            comment_count: 0,
            order: 0,
            color: "charcoal".to_string(),
            is_shared: false,
            is_favorite: false,
            is_inbox_project: false,
            is_team_inbox: false,
            view_style: "list".to_string(),
            url: format!("https://todoist.com/showProject?id={}", id),
            parent_id: None,
        }
    }

    pub fn task(id: &str, project_id: &str, content: &str, due: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            project_id: project_id.to_string(),
            content: content.to_string(),
            description: String::new(),
            is_completed: false,
            priority: 1,
            due: due.map(|date| Due {
                date: date.to_string(),
                string: date.to_string(),
                is_recurring: false,
                datetime: None,
                timezone: None,
            }),
            url: format!("https://todoist.com/showTask?id={}", id),
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn projects(&self) -> Result<Vec<Project>, ApiError> {
            self.check_failing()?;
            Ok(self.projects.lock().unwrap().clone())
        }

        async fn project(&self, id: &str) -> Result<Project, ApiError> {
            self.check_failing()?;
            self.projects
                .lock()
                .unwrap()
                .iter()
                .find(|project| project.id == id)
                .cloned()
                .ok_or(ApiError::Api {
                    status: StatusCode::NOT_FOUND,
                    body: "project not found".to_string(),
                })
        }

        async fn add_project(&self, name: &str) -> Result<Project, ApiError> {
            self.check_failing()?;
            let created = project(&self.fresh_id(), name);
            self.projects.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn rename_project(&self, id: &str, name: &str) -> Result<Project, ApiError> {
            self.check_failing()?;
            let mut projects = self.projects.lock().unwrap();
            let found = projects
                .iter_mut()
                .find(|project| project.id == id)
                .ok_or(ApiError::Api {
                    status: StatusCode::NOT_FOUND,
                    body: "project not found".to_string(),
                })?;
            found.name = name.to_string();
            Ok(found.clone())
        }

        async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
            self.check_failing()?;
            self.projects
                .lock()
                .unwrap()
                .retain(|project| project.id != id);
            Ok(())
        }

        async fn tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>, ApiError> {
            self.check_failing()?;
            let tasks = self.tasks.lock().unwrap();
            Ok(tasks
                .iter()
                .filter(|task| project_id.map_or(true, |id| task.project_id == id))
                .cloned()
                .collect())
        }

        async fn add_task(
            &self,
            content: &str,
            project_id: &str,
            due_string: Option<&str>,
        ) -> Result<Task, ApiError> {
            self.check_failing()?;
            let created = task(&self.fresh_id(), project_id, content, due_string);
            self.tasks.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_task(&self, id: &str, due_string: &str) -> Result<Task, ApiError> {
            self.check_failing()?;
            let mut tasks = self.tasks.lock().unwrap();
            let found = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(ApiError::Api {
                    status: StatusCode::NOT_FOUND,
                    body: "task not found".to_string(),
                })?;
            found.due = Some(Due {
                date: due_string.to_string(),
                string: due_string.to_string(),
                is_recurring: false,
                datetime: None,
                timezone: None,
            });
            Ok(found.clone())
        }

        async fn close_task(&self, id: &str) -> Result<(), ApiError> {
            self.check_failing()?;
            let mut tasks = self.tasks.lock().unwrap();
            let found = tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(ApiError::Api {
                    status: StatusCode::NOT_FOUND,
                    body: "task not found".to_string(),
                })?;
            found.is_completed = true;
            Ok(())
        }
    }
}
