//! These models represent the objects passed around by the agent
//!
//! There are a few related formats in play:
//! - the JSON bodies the HTTP surface and console accept from the user
//! - openai-style messages/tools, sent from the agent to the LLM
//! - tool calls, sent from the agent to the registered tool handlers
//!
//! Incoming and outgoing wire shapes are converted into these internal
//! structs immediately at the boundary, so everything in between works on
//! one representation.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
