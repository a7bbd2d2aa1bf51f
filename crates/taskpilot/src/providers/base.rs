use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use super::stream::StreamChunk;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A lazy sequence of response fragments from the model.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Base trait for AI providers (OpenAI, Ollama, etc)
///
/// Transport failures are returned as errors and never retried here; the
/// caller decides what a failed turn means.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stream the next assistant turn for the given history and tool set
    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<ChunkStream>;
}
