use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::Tool;

/// A capability the model can invoke by name.
///
/// Implementations must never panic or propagate transport errors: a failed
/// remote call becomes an `Err` result that the loop relays to the model as
/// tool output.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The descriptor advertised to the model
    fn descriptor(&self) -> Tool;

    /// Invoke the tool with the named arguments the model supplied
    async fn call(&self, arguments: Value) -> AgentResult<Vec<Content>>;
}

/// The canonical set of tools available to the agent.
///
/// Names are stored lower-cased so lookups tolerate casing drift in model
/// output, and insertion order is preserved so the descriptor list sent to
/// the model is stable across turns.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    handlers: HashMap<String, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its descriptor name
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        let name = handler.descriptor().name.to_lowercase();
        if self.handlers.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.order.push(name.clone());
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// All descriptors in registration order, for transmission to the model
    pub fn descriptors(&self) -> Vec<Tool> {
        self.order
            .iter()
            .map(|name| self.handlers[name].descriptor())
            .collect()
    }

    /// Resolve a tool name to its handler
    pub fn resolve(&self, name: &str) -> AgentResult<&dyn ToolHandler> {
        self.handlers
            .get(&name.to_lowercase())
            .map(|handler| handler.as_ref())
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
