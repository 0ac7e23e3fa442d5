//! The consumption loop for a [`ChunkStream`].

use cohere_types::{ApiError, StreamChunk};
use tokio_util::sync::CancellationToken;

use crate::stream::ChunkStream;

/// What a drained stream produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks: usize,
    /// Concatenation of every text delta, in order.
    pub text: String,
    /// Whether the terminal chunk was seen before the body ended.
    pub terminated: bool,
}

/// Pull chunks until the stream ends, handing each to `on_chunk`.
///
/// The stream is consumed and therefore released on every exit path,
/// including cancellation, which yields [`ApiError::Cancelled`].
pub async fn drain_stream<C, F>(
    mut stream: ChunkStream<C>,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> Result<StreamSummary, ApiError>
where
    C: StreamChunk,
    F: FnMut(&C),
{
    let mut summary = StreamSummary::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Stream consumption cancelled after {} chunks", summary.chunks);
                return Err(ApiError::Cancelled);
            }
            next = stream.recv() => {
                match next? {
                    Some(chunk) => {
                        summary.chunks += 1;
                        if let Some(text) = chunk.text_delta() {
                            summary.text.push_str(text);
                        }
                        if chunk.is_terminal() {
                            summary.terminated = true;
                        }
                        on_chunk(&chunk);
                    }
                    None => return Ok(summary),
                }
            }
        }
    }
}
