//! Project CRUD tools
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{api_error, json_content, required_str, resolve_project_id};
use crate::errors::AgentResult;
use crate::models::content::Content;
use crate::models::tool::Tool;
use crate::registry::ToolHandler;
use crate::todoist::TaskApi;

pub struct GetUserProjects {
    api: Arc<dyn TaskApi>,
}

impl GetUserProjects {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for GetUserProjects {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "get_user_projects",
            "Retrieve all of the user's projects, with their names and ids.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    async fn call(&self, _arguments: Value) -> AgentResult<Vec<Content>> {
        let projects = self.api.projects().await.map_err(api_error)?;
        json_content(&projects)
    }
}

pub struct CreateNewProject {
    api: Arc<dyn TaskApi>,
}

impl CreateNewProject {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for CreateNewProject {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "create_new_project",
            "Create a new project with the given name.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project to create"
                    }
                },
                "required": ["project_name"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let project = self.api.add_project(&project_name).await.map_err(api_error)?;
        json_content(&project)
    }
}

pub struct GetProject {
    api: Arc<dyn TaskApi>,
}

impl GetProject {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for GetProject {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "get_project",
            "Look up a single project by its exact name.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project to look up"
                    }
                },
                "required": ["project_name"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let id = resolve_project_id(self.api.as_ref(), &project_name).await?;
        let project = self.api.project(&id).await.map_err(api_error)?;
        json_content(&project)
    }
}

pub struct UpdateProject {
    api: Arc<dyn TaskApi>,
}

impl UpdateProject {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for UpdateProject {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "update_project",
            "Rename an existing project.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The current name of the project"
                    },
                    "new_project_name": {
                        "type": "string",
                        "description": "The new name for the project"
                    }
                },
                "required": ["project_name", "new_project_name"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let new_name = required_str(&arguments, "new_project_name")?;
        let id = resolve_project_id(self.api.as_ref(), &project_name).await?;
        self.api
            .rename_project(&id, &new_name)
            .await
            .map_err(api_error)?;
        Ok(vec![Content::text(format!(
            "Project '{}' updated successfully.",
            project_name
        ))])
    }
}

pub struct DeleteProject {
    api: Arc<dyn TaskApi>,
}

impl DeleteProject {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolHandler for DeleteProject {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "delete_project",
            "Delete a project by its exact name.",
            json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project to delete"
                    }
                },
                "required": ["project_name"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let project_name = required_str(&arguments, "project_name")?;
        let id = resolve_project_id(self.api.as_ref(), &project_name).await?;
        self.api.delete_project(&id).await.map_err(api_error)?;
        Ok(vec![Content::text(format!(
            "Project '{}' deleted successfully.",
            project_name
        ))])
    }
}
