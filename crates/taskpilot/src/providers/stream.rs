use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::models::message::Message;
use crate::models::tool::ToolCall;

use super::utils::is_valid_function_name;

/// One incremental fragment of a streamed model response.
///
/// A chunk may carry a text delta, tool-call deltas, or both. A single tool
/// call is usually split across many chunks: the first fragment carries the
/// id and name, later fragments append to the JSON arguments string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
}

impl StreamChunk {
    pub fn text<S: Into<String>>(text: S) -> Self {
        StreamChunk {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(delta: ToolCallDelta) -> Self {
        StreamChunk {
            text: None,
            tool_calls: vec![delta],
        }
    }
}

/// A fragment of one tool call, keyed by its position in the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

#[derive(Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Folds a chunk sequence into a complete assistant message.
///
/// Text fragments are concatenated in arrival order. Tool-call fragments are
/// merged by wire index, each field concatenated in the order its pieces
/// arrived, so a call split across chunks reassembles losslessly.
#[derive(Default)]
pub struct ResponseAccumulator {
    text: String,
    calls: Vec<PartialToolCall>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment into the accumulated response
    pub fn push(&mut self, chunk: &StreamChunk) {
        if let Some(text) = &chunk.text {
            self.text.push_str(text);
        }
        for delta in &chunk.tool_calls {
            while self.calls.len() <= delta.index {
                self.calls.push(PartialToolCall::default());
            }
            let call = &mut self.calls[delta.index];
            if let Some(id) = &delta.id {
                call.id.push_str(id);
            }
            if let Some(name) = &delta.name {
                call.name.push_str(name);
            }
            call.arguments.push_str(&delta.arguments);
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Finish the fold, producing the assistant message.
    ///
    /// Malformed accumulated calls are kept as `Err` tool requests so the
    /// failure is relayed to the model rather than crashing the turn.
    pub fn into_message(self) -> Message {
        let mut message = Message::assistant();
        if !self.text.is_empty() {
            message = message.with_text(self.text);
        }
        for call in self.calls {
            // Some providers omit ids; tool responses still need one to pair up.
            let id = if call.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                call.id
            };
            if !is_valid_function_name(&call.name) {
                let error = AgentError::ToolNotFound(format!(
                    "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    call.name
                ));
                message = message.with_tool_request(id, Err(error));
                continue;
            }
            let arguments = if call.arguments.is_empty() {
                "{}".to_string()
            } else {
                call.arguments
            };
            match serde_json::from_str::<Value>(&arguments) {
                Ok(parsed) => {
                    message =
                        message.with_tool_request(id, Ok(ToolCall::new(&call.name, parsed)));
                }
                Err(e) => {
                    let error = AgentError::InvalidParameters(format!(
                        "Could not interpret tool call arguments for id {}: {}",
                        id, e
                    ));
                    message = message.with_tool_request(id, Err(error));
                }
            }
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageContent;

    fn delta(
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments: &str,
    ) -> ToolCallDelta {
        ToolCallDelta {
            index,
            id: id.map(String::from),
            name: name.map(String::from),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_text_concatenated_in_arrival_order() {
        let mut accumulator = ResponseAccumulator::new();
        for piece in ["Add", "ed 'Buy milk'", " to Groceries."] {
            accumulator.push(&StreamChunk::text(piece));
        }
        assert_eq!(accumulator.text(), "Added 'Buy milk' to Groceries.");
        assert!(!accumulator.has_tool_calls());

        let message = accumulator.into_message();
        assert_eq!(message.text(), "Added 'Buy milk' to Groceries.");
    }

    #[test]
    fn test_tool_call_split_across_chunks() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            Some("call_1"),
            Some("create_new_task"),
            "{\"project_name\":",
        )));
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            None,
            None,
            "\"Groceries\",\"task_content\":\"Buy milk\"}",
        )));

        let message = accumulator.into_message();
        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "call_1");
        let call = requests[0].tool_call.as_ref().unwrap();
        assert_eq!(call.name, "create_new_task");
        assert_eq!(call.arguments["project_name"], "Groceries");
        assert_eq!(call.arguments["task_content"], "Buy milk");
    }

    #[test]
    fn test_interleaved_calls_merge_by_index() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            Some("a"),
            Some("get_project"),
            "{\"project_name\":\"Ho",
        )));
        accumulator.push(&StreamChunk::tool_call(delta(
            1,
            Some("b"),
            Some("get_user_projects"),
            "",
        )));
        accumulator.push(&StreamChunk::tool_call(delta(0, None, None, "me\"}")));

        let message = accumulator.into_message();
        let requests = message.tool_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].tool_call.as_ref().unwrap().arguments["project_name"],
            "Home"
        );
        // Empty argument buffers read as an empty object
        assert_eq!(
            requests[1].tool_call.as_ref().unwrap().arguments,
            serde_json::json!({})
        );
    }

    #[test]
    fn test_bad_arguments_become_err_request() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            Some("call_1"),
            Some("get_project"),
            "{not json",
        )));
        let message = accumulator.into_message();
        let requests = message.tool_requests();
        assert!(matches!(
            requests[0].tool_call,
            Err(AgentError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_invalid_name_becomes_err_request() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            Some("call_1"),
            Some("bad name!"),
            "{}",
        )));
        let message = accumulator.into_message();
        assert!(matches!(
            message.tool_requests()[0].tool_call,
            Err(AgentError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            None,
            Some("get_user_projects"),
            "{}",
        )));
        let message = accumulator.into_message();
        assert!(!message.tool_requests()[0].id.is_empty());
    }

    #[test]
    fn test_text_alongside_tool_call() {
        let mut accumulator = ResponseAccumulator::new();
        accumulator.push(&StreamChunk::text("Let me check."));
        accumulator.push(&StreamChunk::tool_call(delta(
            0,
            Some("call_1"),
            Some("get_user_projects"),
            "{}",
        )));
        assert!(accumulator.has_tool_calls());
        let message = accumulator.into_message();
        assert_eq!(message.text(), "Let me check.");
        assert_eq!(message.tool_requests().len(), 1);
    }
}
