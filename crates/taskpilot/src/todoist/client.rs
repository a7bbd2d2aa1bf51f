use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::models::{Project, Task};

pub const TODOIST_HOST: &str = "https://api.todoist.com";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Todoist API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// The capabilities the tool handlers need from the task-management API.
///
/// Handlers take this as a trait object so tests can substitute an
/// in-memory implementation.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn projects(&self) -> Result<Vec<Project>, ApiError>;
    async fn project(&self, id: &str) -> Result<Project, ApiError>;
    async fn add_project(&self, name: &str) -> Result<Project, ApiError>;
    async fn rename_project(&self, id: &str, name: &str) -> Result<Project, ApiError>;
    async fn delete_project(&self, id: &str) -> Result<(), ApiError>;

    /// List active tasks, optionally limited to one project
    async fn tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>, ApiError>;
    async fn add_task(
        &self,
        content: &str,
        project_id: &str,
        due_string: Option<&str>,
    ) -> Result<Task, ApiError>;
    async fn update_task(&self, id: &str, due_string: &str) -> Result<Task, ApiError>;
    async fn close_task(&self, id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoistConfig {
    pub host: String,
    pub api_token: String,
}

impl TodoistConfig {
    pub fn new<S: Into<String>>(api_token: S) -> Self {
        Self {
            host: TODOIST_HOST.to_string(),
            api_token: api_token.into(),
        }
    }
}

/// Client for the Todoist REST v2 API
pub struct TodoistClient {
    client: Client,
    config: TodoistConfig,
}

impl TodoistClient {
    pub fn new(config: TodoistConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/rest/v2/{}",
            self.config.host.trim_end_matches('/'),
            path
        )
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.config.api_token)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Api { status, body })
        }
    }
}

#[async_trait]
impl TaskApi for TodoistClient {
    async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self
            .client
            .get(self.url("projects"))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn project(&self, id: &str) -> Result<Project, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("projects/{}", id)))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn add_project(&self, name: &str) -> Result<Project, ApiError> {
        let response = self
            .client
            .post(self.url("projects"))
            .header("Authorization", self.auth())
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn rename_project(&self, id: &str, name: &str) -> Result<Project, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("projects/{}", id)))
            .header("Authorization", self.auth())
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("projects/{}", id)))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>, ApiError> {
        let mut request = self
            .client
            .get(self.url("tasks"))
            .header("Authorization", self.auth());
        if let Some(project_id) = project_id {
            request = request.query(&[("project_id", project_id)]);
        }
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn add_task(
        &self,
        content: &str,
        project_id: &str,
        due_string: Option<&str>,
    ) -> Result<Task, ApiError> {
        let mut body = json!({
            "content": content,
            "project_id": project_id,
        });
        if let Some(due_string) = due_string {
            body["due_string"] = json!(due_string);
        }
        let response = self
            .client
            .post(self.url("tasks"))
            .header("Authorization", self.auth())
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_task(&self, id: &str, due_string: &str) -> Result<Task, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("tasks/{}", id)))
            .header("Authorization", self.auth())
            .json(&json!({ "due_string": due_string }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn close_task(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("tasks/{}/close", id)))
            .header("Authorization", self.auth())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
