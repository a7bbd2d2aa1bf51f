use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonContent {
    pub data: Value,
}

/// A unit of tool output: either plain text or a structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    Text(TextContent),
    Json(JsonContent),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(TextContent { text: text.into() })
    }

    pub fn json(data: Value) -> Self {
        Content::Json(JsonContent { data })
    }

    /// Get the text if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Get the structured payload if this is a Json variant
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Content::Json(json) => Some(&json.data),
            _ => None,
        }
    }

    /// Render the content as a string suitable for the model to read.
    pub fn to_display(&self) -> String {
        match self {
            Content::Text(text) => text.text.clone(),
            Content::Json(json) => {
                serde_json::to_string_pretty(&json.data).unwrap_or_else(|_| json.data.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_accessors() {
        let content = Content::text("hello");
        assert_eq!(content.as_text(), Some("hello"));
        assert!(content.as_json().is_none());
    }

    #[test]
    fn test_json_display_is_pretty() {
        let content = Content::json(json!({"id": "123"}));
        assert!(content.to_display().contains("\"id\": \"123\""));
    }

    #[test]
    fn test_serialization_tags() {
        let content = Content::text("hi");
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hi");

        let content = Content::json(json!({"a": 1}));
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "json");
        assert_eq!(value["data"]["a"], 1);
    }
}
