use anyhow::{anyhow, bail, Result};
use futures::StreamExt;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::base::ChunkStream;
use super::stream::{StreamChunk, ToolCallDelta};
use crate::models::content::Content;
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;

/// Convert internal Message format to the chat-completions message list.
///
/// Tool responses become `tool` role entries carrying the originating call
/// id; a failed tool result is rendered as text so the model can reason
/// about the error.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.is_empty() {
                        converted["content"] = json!(text);
                    }
                }
                MessageContent::ToolRequest(request) => match &request.tool_call {
                    Ok(tool_call) => {
                        let sanitized_name = sanitize_function_name(&tool_call.name);
                        let tool_calls = converted
                            .as_object_mut()
                            .unwrap()
                            .entry("tool_calls")
                            .or_insert(json!([]));

                        tool_calls.as_array_mut().unwrap().push(json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": sanitized_name,
                                "arguments": tool_call.arguments.to_string(),
                            }
                        }));
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("Error: {}", e),
                            "tool_call_id": request.id
                        }));
                    }
                },
                MessageContent::ToolResponse(response) => match &response.tool_result {
                    Ok(contents) => {
                        output.push(json!({
                            "role": "tool",
                            "content": contents_to_text(contents),
                            "tool_call_id": response.id
                        }));
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("The tool call returned the following error:\n{}", e),
                            "tool_call_id": response.id
                        }));
                    }
                },
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Flatten tool output into a single string for the model to read
pub fn contents_to_text(contents: &[Content]) -> String {
    contents
        .iter()
        .map(|content| content.to_display())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert internal Tool format to the chat-completions tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Build the request body for a streamed chat-completions call
pub fn build_chat_payload(
    model: &str,
    system: &str,
    messages: &[Message],
    tools: &[Tool],
    temperature: Option<f32>,
    max_tokens: Option<i32>,
) -> Result<Value> {
    let system_message = json!({
        "role": "system",
        "content": system
    });

    let mut messages_array = vec![system_message];
    messages_array.extend(messages_to_openai_spec(messages));

    let mut payload = json!({
        "model": model,
        "messages": messages_array,
        "stream": true
    });

    if !tools.is_empty() {
        payload
            .as_object_mut()
            .unwrap()
            .insert("tools".to_string(), json!(tools_to_openai_spec(tools)?));
    }
    if let Some(temp) = temperature {
        payload
            .as_object_mut()
            .unwrap()
            .insert("temperature".to_string(), json!(temp));
    }
    if let Some(tokens) = max_tokens {
        payload
            .as_object_mut()
            .unwrap()
            .insert("max_tokens".to_string(), json!(tokens));
    }

    Ok(payload)
}

/// POST a streamed chat-completions request and parse the SSE body into
/// chunks. Shared by every provider speaking the OpenAI-compatible wire.
pub(crate) async fn stream_chat_completions(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    payload: Value,
) -> Result<ChunkStream> {
    let mut request = client.post(url).json(&payload);
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }
    let response = request.send().await?;

    match response.status() {
        StatusCode::OK => {}
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            return Err(anyhow!("Server error: {}", status));
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Request failed: {}\n{}", status, body));
        }
    }

    let mut body = response.bytes_stream();
    Ok(Box::pin(async_stream::try_stream! {
        let mut buffer = String::new();
        'read: while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));
            // SSE frames are line-delimited; a partial line stays buffered
            // until the rest of it arrives.
            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    break 'read;
                }
                let value: Value = serde_json::from_str(data)?;
                check_stream_error(&value)?;
                if let Some(chunk) = delta_to_chunk(&value) {
                    yield chunk;
                }
            }
        }
    }))
}

fn check_stream_error(value: &Value) -> Result<()> {
    if let Some(error) = value.get("error") {
        bail!("API error: {}", error);
    }
    Ok(())
}

/// Parse one streamed completion frame into a chunk, if it carries anything
pub fn delta_to_chunk(value: &Value) -> Option<StreamChunk> {
    let delta = value.get("choices")?.get(0)?.get("delta")?;

    let mut chunk = StreamChunk::default();
    if let Some(text) = delta.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
            chunk.text = Some(text.to_string());
        }
    }
    if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            chunk.tool_calls.push(ToolCallDelta {
                index: call.get("index").and_then(Value::as_u64).unwrap_or(0) as usize,
                id: call.get("id").and_then(Value::as_str).map(String::from),
                name: call
                    .pointer("/function/name")
                    .and_then(Value::as_str)
                    .map(String::from),
                arguments: call
                    .pointer("/function/arguments")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }

    if chunk.text.is_none() && chunk.tool_calls.is_empty() {
        None
    } else {
        Some(chunk)
    }
}

pub fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

pub fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}
