//! API request and response types

use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};

/// Request body shared by both endpoints: a conversation transcript.
///
/// `messages` is optional so that validation, not deserialization, decides
/// what a missing array means for each endpoint.
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub messages: Option<Vec<ChatMessage>>,
}

/// Response for the suggestions endpoint
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
