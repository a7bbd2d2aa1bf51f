use crate::state::AppState;
use axum::{
    extract::State,
    http::{self, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use taskpilot::{
    agent::{Agent, AgentEvent},
    models::content::Content,
    models::message::{Message, MessageContent},
    models::role::Role,
    providers::factory,
    todoist::TodoistClient,
    tools,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    message: String,
}

/// Convert incoming role/content pairs to the internal message type.
/// Messages with a role the assistant does not model are dropped.
fn convert_messages(incoming: Vec<IncomingMessage>) -> Vec<Message> {
    let mut messages = Vec::new();

    for msg in incoming {
        match msg.role.as_str() {
            "user" => {
                messages.push(Message::user().with_text(msg.content));
            }
            "assistant" => {
                messages.push(Message::assistant().with_text(msg.content));
            }
            _ => {
                tracing::warn!("Unknown role: {}", msg.role);
            }
        }
    }

    messages
}

fn build_agent(state: &AppState) -> anyhow::Result<Agent> {
    let provider = factory::get_provider(state.provider_config.clone())?;
    let mut agent = Agent::new(provider);
    let api = Arc::new(TodoistClient::new(state.todoist.clone())?);
    tools::install(&mut agent, api)?;
    Ok(agent)
}

/// Non-streaming chat: run the full reply loop and return the final
/// assistant text.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let agent = build_agent(&state).map_err(|e| {
        tracing::error!("Failed to set up agent: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let messages = convert_messages(request.messages);

    let mut stream = agent.reply(&messages).await.map_err(|e| {
        tracing::error!("Failed to start reply stream: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut final_text = String::new();
    while let Some(event) = stream.next().await {
        match event {
            Ok(AgentEvent::Message(message)) if message.role == Role::Assistant => {
                let text = message.text();
                if !text.is_empty() {
                    final_text = text;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Error processing message: {}", e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    Ok(Json(ChatResponse {
        message: final_text,
    }))
}

// Custom SSE response type implementing the data-stream protocol
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .header("x-vercel-ai-data-stream", "v1")
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

// Protocol-specific message formatting
struct ProtocolFormatter;

impl ProtocolFormatter {
    fn format_text(text: &str) -> String {
        let encoded_text = serde_json::to_string(text).unwrap_or_default();
        format!("0:{}\n", encoded_text)
    }

    fn format_tool_call(id: &str, name: &str, args: &serde_json::Value) -> String {
        // Tool calls start with "9:"
        let tool_call = json!({
            "toolCallId": id,
            "toolName": name,
            "args": args
        });
        format!("9:{}\n", tool_call)
    }

    fn format_tool_response(id: &str, result: &Vec<Content>) -> String {
        // Tool responses start with "a:"
        let response = json!({
            "toolCallId": id,
            "result": result,
        });
        format!("a:{}\n", response)
    }

    fn format_finish(reason: &str) -> String {
        // Finish messages start with "d:"
        let finish = json!({
            "finishReason": reason,
            "usage": {
                "promptTokens": 0,
                "completionTokens": 0
            }
        });
        format!("d:{}\n", finish)
    }
}

async fn stream_message(
    message: Message,
    tx: &mpsc::Sender<String>,
) -> Result<(), mpsc::error::SendError<String>> {
    match message.role {
        Role::User => {
            for content in message.content {
                if let MessageContent::ToolResponse(response) = content {
                    match response.tool_result {
                        Ok(result) => {
                            tx.send(ProtocolFormatter::format_tool_response(
                                &response.id,
                                &result,
                            ))
                            .await?;
                        }
                        Err(err) => {
                            let result = vec![Content::text(format!("Error: {}", err))];
                            tx.send(ProtocolFormatter::format_tool_response(
                                &response.id,
                                &result,
                            ))
                            .await?;
                        }
                    }
                }
            }
        }
        Role::Assistant => {
            for content in message.content {
                match content {
                    MessageContent::ToolRequest(request) => match request.tool_call {
                        Ok(tool_call) => {
                            tx.send(ProtocolFormatter::format_tool_call(
                                &request.id,
                                &tool_call.name,
                                &tool_call.arguments,
                            ))
                            .await?;
                        }
                        Err(_) => {
                            // A malformed call still enters the history; its
                            // paired response carries the error detail
                            tx.send(ProtocolFormatter::format_tool_call(
                                &request.id,
                                "invalid name",
                                &json!({}),
                            ))
                            .await?;
                        }
                    },
                    MessageContent::Text(text) => {
                        for line in text.lines() {
                            let modified_line = format!("{}\n", line);
                            tx.send(ProtocolFormatter::format_text(&modified_line))
                                .await?;
                        }
                    }
                    MessageContent::ToolResponse(_) => {
                        // Tool responses only come from the user side
                        continue;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Streaming chat using the data-stream wire protocol
async fn reply_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, StatusCode> {
    let agent = build_agent(&state).map_err(|e| {
        tracing::error!("Failed to set up agent: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let messages = convert_messages(request.messages);

    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tokio::spawn(async move {
        let mut stream = match agent.reply(&messages).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Failed to start reply stream: {}", e);
                let _ = tx.send(ProtocolFormatter::format_finish("error")).await;
                return;
            }
        };

        while let Some(response) = stream.next().await {
            match response {
                Ok(AgentEvent::TextDelta(_)) => {
                    // The completed message carries the full text; deltas
                    // matter to the console client, not this protocol
                }
                Ok(AgentEvent::Message(message)) => {
                    if let Err(e) = stream_message(message, &tx).await {
                        tracing::error!("Error sending message through channel: {}", e);
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!("Error processing message: {}", e);
                    let _ = tx.send(ProtocolFormatter::format_finish("error")).await;
                    return;
                }
            }
        }

        let _ = tx.send(ProtocolFormatter::format_finish("stop")).await;
    });

    Ok(SseResponse::new(stream))
}

/// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/reply", post(reply_handler))
        .with_state(state)
}
