use serde::{Deserialize, Serialize};

/// The speaker of a message. Tool results travel as content on a user
/// message, and the system prompt is passed to providers out of band, so
/// only the two conversational roles appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
