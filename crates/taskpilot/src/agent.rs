use anyhow::Result;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;
use crate::providers::stream::ResponseAccumulator;
use crate::registry::{ToolHandler, ToolRegistry};

/// Maximum number of consecutive tool rounds within a single user turn.
/// Exceeding it fails the turn rather than letting the model loop forever.
pub const MAX_TOOL_TURNS: usize = 5;

/// One unit of agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A text fragment, forwarded downstream as it arrives from the model
    TextDelta(String),
    /// A completed message appended to the conversation: the assistant's
    /// accumulated response, or the batch of tool results that answered it
    Message(Message),
}

/// Agent drives the conversation: it prompts the model with the registered
/// tool set, executes the tool calls the model requests, and repeats until
/// the model produces a plain answer.
pub struct Agent {
    registry: ToolRegistry,
    provider: Box<dyn Provider>,
}

impl Agent {
    /// Create a new Agent with the specified provider and no tools
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            registry: ToolRegistry::new(),
            provider,
        }
    }

    /// Register a tool the model may call
    pub fn add_tool(&mut self, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        self.registry.register(handler)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn system_prompt(&self) -> AgentResult<String> {
        let mut context = HashMap::new();
        context.insert(
            "current_date".to_string(),
            chrono::Local::now().date_naive().to_string(),
        );
        load_prompt_file("system.md", &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    fn check_depth(depth: usize) -> AgentResult<()> {
        if depth > MAX_TOOL_TURNS {
            return Err(AgentError::LoopExceeded(MAX_TOOL_TURNS));
        }
        Ok(())
    }

    /// Execute a single tool call. Every failure mode becomes the result for
    /// this one call; the rest of the batch is unaffected.
    async fn dispatch_tool_call(&self, request: &ToolRequest) -> AgentResult<Vec<Content>> {
        let call = request.tool_call.clone()?;
        let handler = self.registry.resolve(&call.name)?;
        handler.call(call.arguments).await
    }

    /// Create a stream that yields text fragments live and each completed
    /// message as the turn progresses.
    ///
    /// The stream is finite and not restartable: it ends after the model
    /// produces a response with no tool calls, or with an error if the
    /// model keeps requesting tools past `MAX_TOOL_TURNS` or the transport
    /// fails. Tool failures never end the stream; they are relayed to the
    /// model as tool output.
    pub async fn reply(&self, messages: &[Message]) -> Result<BoxStream<'_, Result<AgentEvent>>> {
        let tools = self.registry.descriptors();
        let system_prompt = self.system_prompt()?;
        let mut messages = messages.to_vec();

        Ok(Box::pin(async_stream::try_stream! {
            let mut depth = 0;
            loop {
                Self::check_depth(depth)?;

                let mut stream = self
                    .provider
                    .stream(&system_prompt, &messages, &tools)
                    .await?;

                let mut gathered = ResponseAccumulator::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    if let Some(text) = &chunk.text {
                        yield AgentEvent::TextDelta(text.clone());
                    }
                    gathered.push(&chunk);
                }

                let response = gathered.into_message();
                yield AgentEvent::Message(response.clone());

                // Make sure the consumer renders the response before any
                // long-running tool dispatch starts.
                tokio::task::yield_now().await;

                let tool_requests: Vec<ToolRequest> = response
                    .tool_requests()
                    .into_iter()
                    .cloned()
                    .collect();

                if tool_requests.is_empty() {
                    // No more tool calls, end the reply loop
                    break;
                }

                messages.push(response);

                // Sequential on purpose: a later call may depend on the side
                // effect of an earlier one, such as a just-created project.
                let mut tool_response = Message::user();
                for request in &tool_requests {
                    let output = self.dispatch_tool_call(request).await;
                    tool_response =
                        tool_response.with_tool_response(request.id.clone(), output);
                }

                yield AgentEvent::Message(tool_response.clone());
                messages.push(tool_response);

                depth += 1;
            }
        }))
    }
}
