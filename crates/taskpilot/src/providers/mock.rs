use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::base::{ChunkStream, Provider};
use super::stream::StreamChunk;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A mock provider that plays back pre-scripted chunk turns for testing.
///
/// Each call to `stream` consumes the next turn; once the script runs out it
/// returns empty streams, which the agent reads as an empty final answer.
pub struct MockProvider {
    turns: Arc<Mutex<Vec<Vec<StreamChunk>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of chunked turns
    pub fn new(turns: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(turns)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of how many times the model was invoked
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut turns = self.turns.lock().unwrap();
        let chunks = if turns.is_empty() {
            Vec::new()
        } else {
            turns.remove(0)
        };
        Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}
