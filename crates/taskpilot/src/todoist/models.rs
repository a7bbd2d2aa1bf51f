use serde::{Deserialize, Serialize};

/// A Todoist project, with the fields the assistant reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_inbox_project: bool,
    #[serde(default)]
    pub is_team_inbox: bool,
    #[serde(default)]
    pub view_style: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A task's due date, as Todoist reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Due {
    /// Due date in YYYY-MM-DD format
    pub date: String,
    #[serde(default)]
    pub string: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub due: Option<Due>,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_deserializes_with_missing_optionals() {
        let project: Project =
            serde_json::from_value(json!({"id": "220474322", "name": "Groceries"})).unwrap();
        assert_eq!(project.name, "Groceries");
        assert_eq!(project.parent_id, None);
        assert!(!project.is_favorite);
    }

    #[test]
    fn test_task_deserializes_with_due() {
        let task: Task = serde_json::from_value(json!({
            "id": "2995104339",
            "project_id": "220474322",
            "content": "Buy milk",
            "due": {"date": "2025-01-16", "string": "tomorrow", "is_recurring": false}
        }))
        .unwrap();
        assert_eq!(task.due.as_ref().unwrap().date, "2025-01-16");
        assert!(!task.is_completed);
    }
}
