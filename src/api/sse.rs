//! Server-Sent Events support
//!
//! Adapts the chat flow's text-delta channel to an axum SSE response whose
//! events are `data: {"text": <delta>}` payloads. The receiver lives in
//! the response body; dropping the connection drops the receiver, which is
//! how client disconnects propagate back to the flow task.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Wrap a text-delta receiver as an SSE stream
pub fn sse_stream(
    rx: UnboundedReceiver<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = UnboundedReceiverStream::new(rx)
        .map(|text| Ok(Event::default().data(json!({ "text": text }).to_string())));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
