//! NDJSON framing of the job event channel.

use std::convert::Infallible;

use axum::body::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use varia_core::events::JobEvent;

/// Serialize one event as a newline-terminated JSON line.
fn encode_line(event: &JobEvent) -> Bytes {
    let mut line = serde_json::to_vec(event).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to encode job event");
        br#"{"type":"error","error":"event encoding failed"}"#.to_vec()
    });
    line.push(b'\n');
    Bytes::from(line)
}

/// Adapt the job event channel into an NDJSON byte stream for the response
/// body. The stream ends when every sender has been dropped.
pub fn ndjson_stream(
    events: mpsc::Receiver<JobEvent>,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    ReceiverStream::new(events).map(|event| Ok(encode_line(&event)))
}
