//! Streaming chat flow
//!
//! Orchestrates one support-chat turn: a streamed completion with the
//! product-lookup tool declared, reassembly of any streamed tool call,
//! retrieval against the factsheet, and a second streamed completion
//! carrying the tool result.
//!
//! The turn is split in two: [`start_chat`] opens the first provider
//! stream so the handler can still answer with an HTTP error status, and
//! [`ChatTurn::relay`] consumes it from a spawned task once the response
//! is committed as an event stream. Text deltas go to the caller through
//! an unbounded channel; a failed send means the client dropped the
//! response, which the flow treats as cancellation.

use crate::factsheet::Factsheet;
use crate::llm::{
    ChatMessage, ChunkStream, LlmError, LlmRequest, LlmService, ToolCallAccumulator,
    ToolDefinition,
};
use crate::retrieval;
use crate::system_prompt::SYSTEM_PROMPT;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Name of the single tool declared to the model
pub const LOOKUP_TOOL_NAME: &str = "lookup_product_info";

/// Sent when the model's tool-call arguments are not valid JSON
const ARGUMENTS_APOLOGY: &str =
    "Sorry, I had trouble understanding the request. Please try rephrasing your question.";

/// Sent when the reassembled tool call has no function name
const LOOKUP_APOLOGY: &str = "Sorry, something went wrong while retrieving the information.";

fn lookup_tool() -> ToolDefinition {
    ToolDefinition {
        name: LOOKUP_TOOL_NAME.to_string(),
        description: "Searches RoboClean product documentation".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What the user wants to know"
                }
            },
            "required": ["query"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct LookupArgs {
    query: String,
}

/// A chat turn whose first provider stream is already open
pub struct ChatTurn {
    llm: Arc<dyn LlmService>,
    factsheet: Arc<Factsheet>,
    messages: Vec<ChatMessage>,
    stream: ChunkStream,
}

/// Open the first provider stream for a chat turn.
///
/// # Errors
///
/// Returns the provider error when the completion request fails. No
/// response bytes have been produced yet, so the caller can still map
/// this to an HTTP error status.
pub async fn start_chat(
    llm: Arc<dyn LlmService>,
    factsheet: Arc<Factsheet>,
    history: Vec<ChatMessage>,
) -> Result<ChatTurn, LlmError> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history);

    let request = LlmRequest {
        messages: messages.clone(),
        tools: vec![lookup_tool()],
        temperature: None,
    };

    let stream = llm.complete_stream(&request).await?;

    Ok(ChatTurn {
        llm,
        factsheet,
        messages,
        stream,
    })
}

impl ChatTurn {
    /// Consume the turn, writing text deltas to `tx`.
    ///
    /// Returns `Ok(())` on a complete turn and on client disconnect.
    /// In-band recoverable problems (unparseable tool arguments, nameless
    /// tool call) surface to the client as apology events, not errors.
    ///
    /// # Errors
    ///
    /// Returns the provider error when either stream fails mid-turn; the
    /// response is already streaming by then, so the caller can only log
    /// it and let the stream end.
    pub async fn relay(mut self, tx: UnboundedSender<String>) -> Result<(), LlmError> {
        let mut accumulator = ToolCallAccumulator::default();

        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            if let Some(text) = chunk.text {
                if tx.send(text).is_err() {
                    return Ok(());
                }
            }
            for fragment in chunk.tool_calls {
                accumulator.push(fragment);
            }
        }

        let Some(call) = accumulator.into_first() else {
            // Plain text answer, nothing more to do
            return Ok(());
        };

        if call.arguments.trim().is_empty() {
            return Ok(());
        }

        let args: LookupArgs = match serde_json::from_str(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    arguments = %call.arguments,
                    "Failed to parse tool call arguments"
                );
                let _ = tx.send(ARGUMENTS_APOLOGY.to_string());
                return Ok(());
            }
        };

        if call.name.is_empty() {
            tracing::error!("Missing function name in tool call");
            let _ = tx.send(LOOKUP_APOLOGY.to_string());
            return Ok(());
        }

        tracing::debug!(query = %args.query, "Dispatching product lookup");
        let tool_result = retrieval::lookup(&args.query, self.factsheet.text());
        self.messages.push(ChatMessage::function(&call.name, tool_result));

        let followup = LlmRequest {
            messages: self.messages,
            tools: Vec::new(),
            temperature: None,
        };

        let mut stream = self.llm.complete_stream(&followup).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(text) = chunk.text {
                if tx.send(text).is_err() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlm;
    use crate::llm::{ChatChunk, LlmErrorKind, Role, ToolCallFragment};
    use tokio::sync::mpsc;

    fn tool_chunk(
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> ChatChunk {
        ChatChunk {
            text: None,
            tool_calls: vec![ToolCallFragment {
                id: id.map(String::from),
                kind: Some("function".to_string()),
                name: name.map(String::from),
                arguments: arguments.map(String::from),
            }],
        }
    }

    async fn run(
        llm: &Arc<MockLlm>,
        factsheet: &str,
        history: Vec<ChatMessage>,
    ) -> (Result<(), LlmError>, Vec<String>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let turn = start_chat(
            llm.clone() as Arc<dyn LlmService>,
            Arc::new(Factsheet::from_text(factsheet)),
            history,
        )
        .await
        .unwrap();
        let result = turn.relay(tx).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }

    #[tokio::test]
    async fn plain_text_stream_relays_deltas_without_tool_round_trip() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![ChatChunk::text("Hello"), ChatChunk::text(" there")]);

        let (result, events) = run(&llm, "", vec![ChatMessage::user("hello")]).await;
        result.unwrap();
        assert_eq!(events, vec!["Hello", " there"]);

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, LOOKUP_TOOL_NAME);
    }

    #[tokio::test]
    async fn tool_call_round_trip_feeds_lookup_result_to_second_call() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![
            tool_chunk(Some("call_1"), Some(LOOKUP_TOOL_NAME), None),
            tool_chunk(None, None, Some("{\"query\":")),
            tool_chunk(None, None, Some("\"mop\"}")),
        ]);
        llm.queue_stream(vec![ChatChunk::text("The Duo can mop.")]);

        let factsheet = "RoboClean Mini: vacuum only.\nRoboClean Duo: vacuum and mop combo.";
        let history = vec![ChatMessage::user("which model can mop?")];
        let (result, events) = run(&llm, factsheet, history).await;
        result.unwrap();
        assert_eq!(events, vec!["The Duo can mop."]);

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 2);

        // Second call carries the retrieval result as a function message
        // and declares no tools.
        let followup = &requests[1];
        assert!(followup.tools.is_empty());
        let function_msg = followup.messages.last().unwrap();
        assert_eq!(function_msg.role, Role::Function);
        assert_eq!(function_msg.name.as_deref(), Some(LOOKUP_TOOL_NAME));
        assert_eq!(function_msg.content, "RoboClean Duo: vacuum and mop combo.");
    }

    #[tokio::test]
    async fn malformed_tool_arguments_yield_single_apology_event() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![tool_chunk(
            Some("call_1"),
            Some(LOOKUP_TOOL_NAME),
            Some("{bad json"),
        )]);

        let (result, events) = run(&llm, "", vec![ChatMessage::user("hi")]).await;
        result.unwrap();
        assert_eq!(events, vec![ARGUMENTS_APOLOGY]);
        // No second provider call after the parse failure
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn nameless_tool_call_yields_lookup_apology() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![tool_chunk(
            Some("call_1"),
            None,
            Some("{\"query\":\"mop\"}"),
        )]);

        let (result, events) = run(&llm, "", vec![ChatMessage::user("hi")]).await;
        result.unwrap();
        assert_eq!(events, vec![LOOKUP_APOLOGY]);
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn blank_tool_arguments_close_quietly() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![tool_chunk(
            Some("call_1"),
            Some(LOOKUP_TOOL_NAME),
            Some("   "),
        )]);

        let (result, events) = run(&llm, "", vec![ChatMessage::user("hi")]).await;
        result.unwrap();
        assert!(events.is_empty());
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn dropped_receiver_cancels_the_flow() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![
            ChatChunk::text("first"),
            ChatChunk::text("never delivered"),
        ]);

        let turn = start_chat(
            llm.clone() as Arc<dyn LlmService>,
            Arc::new(Factsheet::from_text("")),
            vec![ChatMessage::user("hi")],
        )
        .await
        .unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        turn.relay(tx).await.unwrap();
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn first_call_failure_surfaces_before_relay() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream_error(LlmError::server_error("upstream down"));

        let err = start_chat(
            llm as Arc<dyn LlmService>,
            Arc::new(Factsheet::from_text("")),
            vec![ChatMessage::user("hi")],
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ServerError);
    }

    #[tokio::test]
    async fn second_call_failure_surfaces_from_relay() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_stream(vec![tool_chunk(
            Some("call_1"),
            Some(LOOKUP_TOOL_NAME),
            Some("{\"query\":\"mop\"}"),
        )]);
        llm.queue_stream_error(LlmError::network("connection reset"));

        let (result, _) = run(&llm, "", vec![ChatMessage::user("hi")]).await;
        assert_eq!(result.unwrap_err().kind, LlmErrorKind::Network);
    }
}
