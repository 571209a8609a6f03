//! Stream normalizers: vendor streaming events → canonical stream events.
//!
//! Each provider gets its own per-response state machine. The variant is
//! picked once when the adapter starts a request, never per event.

pub mod anthropic;
pub mod openai;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::info;

use crate::chat_loop::EventSink;
use crate::error::Result;
use crate::models::ProviderKind;
use crate::provider::ChatTurn;
use crate::state::ChatState;
use crate::types::{ChatStreamEvent, Message};

pub use anthropic::AnthropicNormalizer;
pub use openai::OpenAiNormalizer;

/// A normalizer for one streaming response.
#[derive(Debug)]
pub enum Normalizer {
    Anthropic(AnthropicNormalizer),
    OpenAi(OpenAiNormalizer),
}

impl Normalizer {
    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Anthropic => Self::Anthropic(AnthropicNormalizer::new()),
            ProviderKind::OpenAi => Self::OpenAi(OpenAiNormalizer::new()),
        }
    }

    /// Map one raw event to zero or more canonical events.
    ///
    /// Unrecognized events are logged and dropped; only an explicit upstream
    /// error payload fails.
    pub fn accept(&mut self, raw: &str) -> Result<Vec<ChatStreamEvent>> {
        match self {
            Self::Anthropic(n) => n.accept(raw),
            Self::OpenAi(n) => n.accept(raw),
        }
    }

    /// Consume the accumulated state into the final assistant message.
    pub fn finish(self) -> Result<Message> {
        match self {
            Self::Anthropic(n) => n.finish(),
            Self::OpenAi(n) => n.finish(),
        }
    }
}

/// Pump raw events through a normalizer, forwarding canonical events to `sink`.
///
/// Cancellation is polled once per raw event. When it is observed the raw
/// stream is dropped, which closes the underlying connection, and
/// [`ChatTurn::Cancelled`] is returned.
pub async fn drive_stream(
    mut raw: BoxStream<'_, Result<String>>,
    mut normalizer: Normalizer,
    sink: Option<&EventSink>,
    state: &ChatState,
) -> Result<ChatTurn> {
    while let Some(item) = raw.next().await {
        if state.is_cancelled() {
            drop(raw);
            info!("chat cancelled mid-stream, transport closed");
            return Ok(ChatTurn::Cancelled);
        }
        for event in normalizer.accept(&item?)? {
            if let Some(sink) = sink {
                sink(event);
            }
        }
    }

    if state.is_cancelled() {
        info!("chat cancelled as the stream ended");
        return Ok(ChatTurn::Cancelled);
    }
    Ok(ChatTurn::Message(normalizer.finish()?))
}
