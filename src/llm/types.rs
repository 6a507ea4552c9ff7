//! Common types for LLM interactions

use serde::{Deserialize, Serialize};

/// LLM completion request
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
}

/// Message in a conversation. Serializes directly to the chat-completions
/// wire format (`{"role": "user", "content": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// Set for `function` messages: the name of the tool that produced
    /// the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
        }
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: content.into(),
            name: Some(name.into()),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// Tool declared to the model
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Non-streamed LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
}

/// One increment of a streamed completion: a text delta, tool-call
/// fragments, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatChunk {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
}

impl ChatChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Raw tool-call fragment as it arrives on the stream. Any field may be
/// absent; the provider spreads one logical call across many fragments.
#[derive(Debug, Clone, Default)]
pub struct ToolCallFragment {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// A fully reassembled tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    #[allow(dead_code)] // Part of the provider's call shape, not consumed here
    pub kind: Option<String>,
    pub name: String,
    pub arguments: String,
}

/// Folds streamed tool-call fragments into complete calls.
///
/// Reassembly rules:
/// - a fragment carrying an `id` selects (or creates) the entry for that id,
///   and that id carries forward to subsequent id-less fragments;
/// - `name` and `kind` are taken from the fragment that creates the entry,
///   later values for the same entry are ignored;
/// - `arguments` accumulates by string concatenation across all fragments
///   attributed to the entry.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCall>,
    current_id: Option<String>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, fragment: ToolCallFragment) {
        let ToolCallFragment {
            id,
            kind,
            name,
            arguments,
        } = fragment;

        if let Some(id) = id {
            self.current_id = Some(id);
        }
        let key = self.current_id.clone().unwrap_or_default();

        let index = match self.calls.iter().position(|c| c.id == key) {
            Some(index) => index,
            None => {
                self.calls.push(ToolCall {
                    id: key,
                    kind,
                    name: name.unwrap_or_default(),
                    arguments: String::new(),
                });
                self.calls.len() - 1
            }
        };

        if let Some(arguments) = arguments {
            self.calls[index].arguments.push_str(&arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The first call seen on the stream, in arrival order.
    pub fn into_first(self) -> Option<ToolCall> {
        self.calls.into_iter().next()
    }
}
