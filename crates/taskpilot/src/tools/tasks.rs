//! Task CRUD tools
use async_trait::async_trait;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{api_error, json_content, optional_str, required_str, resolve_project_id};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::Tool;
use crate::registry::ToolHandler;
use crate::todoist::{Task, TaskApi};

/// Resolve "today"/"tomorrow" to a calendar date, otherwise pass through
/// (expected as YYYY-MM-DD).
fn normalize_due_date(due_date: &str) -> String {
    let today = Local::now().date_naive();
    match due_date {
        "today" => today.to_string(),
        "tomorrow" => (today + Duration::days(1)).to_string(),
        other => other.to_string(),
    }
}

async fn find_task(
    api: &dyn TaskApi,
    project_name: &str,
    task_content: &str,
) -> AgentResult<Task> {
    let project_id = resolve_project_id(api, project_name).await?;
    let tasks = api.tasks(Some(&project_id)).await.map_err(api_error)?;
    tasks
        .into_iter()
        .find(|task| task.content == task_content)
        .ok_or_else(|| {
            AgentError::ExecutionError(format!(
                "Task '{}' not found in project '{}'.",
                task_content, project_name
            ))
        })
}

pub struct GetActiveTasks {
    api: Arc<dyn TaskApi>,
}

impl GetActiveTasks {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for GetActiveTasks {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "get_active_tasks",
            "List the active (not completed) tasks in a project.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project to list tasks for"
                    }
                },
                "required": ["project_name"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let project_id = resolve_project_id(self.api.as_ref(), &project_name).await?;
        let tasks = self
            .api
            .tasks(Some(&project_id))
            .await
            .map_err(api_error)?;
        let active: Vec<Task> = tasks.into_iter().filter(|task| !task.is_completed).collect();
        json_content(&active)
    }
}

pub struct GetTasksByDueDate {
    api: Arc<dyn TaskApi>,
}

impl GetTasksByDueDate {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for GetTasksByDueDate {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "get_tasks_by_due_date",
            "List tasks across all projects due on a given date. Accepts \
             'today', 'tomorrow', or a date in YYYY-MM-DD format.",
            json!({
                "type": "object",
                "properties": {
                    "due_date": {
                        "type": "string",
                        "description": "The due date to filter by"
                    }
                },
                "required": ["due_date"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let due_date = required_str(&arguments, "due_date")?;
        let date = normalize_due_date(&due_date);
        let tasks = self.api.tasks(None).await.map_err(api_error)?;
        let matching: Vec<Task> = tasks
            .into_iter()
            .filter(|task| task.due.as_ref().map_or(false, |due| due.date == date))
            .collect();
        if matching.is_empty() {
            return Ok(vec![Content::text(format!(
                "No tasks found with due date '{}'.",
                date
            ))]);
        }
        json_content(&matching)
    }
}

pub struct CreateNewTask {
    api: Arc<dyn TaskApi>,
}

impl CreateNewTask {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for CreateNewTask {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "create_new_task",
            "Create a task in a project, optionally with a due date in \
             natural language (for example 'tomorrow at 12:00').",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project to add the task to"
                    },
                    "task_content": {
                        "type": "string",
                        "description": "The content of the task"
                    },
                    "due_string": {
                        "type": "string",
                        "description": "When the task is due, in natural language"
                    }
                },
                "required": ["project_name", "task_content"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let task_content = required_str(&arguments, "task_content")?;
        let due_string = optional_str(&arguments, "due_string");
        let project_id = resolve_project_id(self.api.as_ref(), &project_name).await?;
        let task = self
            .api
            .add_task(&task_content, &project_id, due_string.as_deref())
            .await
            .map_err(api_error)?;
        json_content(&task)
    }
}

pub struct UpdateTask {
    api: Arc<dyn TaskApi>,
}

impl UpdateTask {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for UpdateTask {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "update_task",
            "Change the due date of an existing task, found by its exact \
             content within a project.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project containing the task"
                    },
                    "task_content": {
                        "type": "string",
                        "description": "The exact content of the task to update"
                    },
                    "due_string": {
                        "type": "string",
                        "description": "The new due date, in natural language"
                    }
                },
                "required": ["project_name", "task_content", "due_string"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let task_content = required_str(&arguments, "task_content")?;
        let due_string = required_str(&arguments, "due_string")?;
        let task = find_task(self.api.as_ref(), &project_name, &task_content).await?;
        self.api
            .update_task(&task.id, &due_string)
            .await
            .map_err(api_error)?;
        Ok(vec![Content::text(format!(
            "Task '{}' updated successfully.",
            task_content
        ))])
    }
}

pub struct CompleteTask {
    api: Arc<dyn TaskApi>,
}

impl CompleteTask {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for CompleteTask {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "complete_task",
            "Mark a task as completed, found by its exact content within a \
             project.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project containing the task"
                    },
                    "task_content": {
                        "type": "string",
                        "description": "The exact content of the task to complete"
                    }
                },
                "required": ["project_name", "task_content"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let task_content = required_str(&arguments, "task_content")?;
        let task = find_task(self.api.as_ref(), &project_name, &task_content).await?;
        self.api.close_task(&task.id).await.map_err(api_error)?;
        json_content(&json!({
            "status": "completed",
            "task_id": task.id,
            "content": task.content,
            "project_id": task.project_id,
        }))
    }
}
