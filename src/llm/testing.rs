//! Mock LLM service for testing
//!
//! Enables exercising the chat flow and handlers without network I/O.

use super::{ChatChunk, ChunkStream, LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock service that returns queued responses and records requests
pub struct MockLlm {
    completions: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    streams: Mutex<VecDeque<Result<Vec<ChatChunk>, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            completions: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a non-streamed response
    pub fn queue_completion(&self, content: impl Into<String>) {
        self.completions.lock().unwrap().push_back(Ok(LlmResponse {
            content: content.into(),
        }));
    }

    /// Queue an error for the next non-streamed request
    pub fn queue_completion_error(&self, error: LlmError) {
        self.completions.lock().unwrap().push_back(Err(error));
    }

    /// Queue the chunks of one streamed response
    pub fn queue_stream(&self, chunks: Vec<ChatChunk>) {
        self.streams.lock().unwrap().push_back(Ok(chunks));
    }

    /// Queue an error for the next streamed request
    pub fn queue_stream_error(&self, error: LlmError) {
        self.streams.lock().unwrap().push_back(Err(error));
    }

    /// Get all recorded requests, in order
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock completion queued")))
    }

    async fn complete_stream(&self, request: &LlmRequest) -> Result<ChunkStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock stream queued")))?;
        Ok(Box::pin(futures::stream::iter(
            chunks.into_iter().map(Ok::<_, LlmError>),
        )))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
