//! Sinks for canonical stream events.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::types::ChatStreamEvent;

/// Callback receiving canonical stream events in provider order.
pub type EventSink = Arc<dyn Fn(ChatStreamEvent) + Send + Sync>;

/// Write each event as one JSON line to stdout.
pub fn stdout_sink() -> EventSink {
    Arc::new(|event: ChatStreamEvent| {
        let mut out = std::io::stdout().lock();
        // a closed stdout just means nobody is watching
        let _ = out.write_all(event.to_wire_line().as_bytes());
        let _ = out.flush();
    })
}

/// Forward JSON-line encoded events to a channel, e.g. an HTTP response body.
pub fn channel_sink(tx: mpsc::UnboundedSender<String>) -> EventSink {
    Arc::new(move |event: ChatStreamEvent| {
        let _ = tx.send(event.to_wire_line());
    })
}
