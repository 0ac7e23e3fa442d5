//! Typed chunk stream over a framed response body.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use cohere_types::{ApiError, Framing, StreamChunk};
use futures_core::Stream;
use futures_util::StreamExt;

use crate::framing::{Frame, Framer};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// An in-flight streaming response.
///
/// The transport is released exactly once: after the terminal chunk, on the
/// first error, on [`close`](Self::close), or on drop. Once released the
/// stream yields `None` forever.
pub struct ChunkStream<C> {
    inner: Option<ByteStream>,
    framer: Framer,
    pending: VecDeque<Result<C, ApiError>>,
}

impl<C> Unpin for ChunkStream<C> {}

impl<C: StreamChunk> ChunkStream<C> {
    /// Wrap a raw byte stream, e.g. `reqwest::Response::bytes_stream()`.
    pub fn new<S, E>(framing: Framing, byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display,
    {
        let inner = byte_stream
            .map(|item| item.map_err(|e| ApiError::StreamInterrupted(e.to_string())));
        Self {
            inner: Some(Box::pin(inner)),
            framer: Framer::new(framing),
            pending: VecDeque::new(),
        }
    }

    /// Pull the next chunk. `Ok(None)` is the normal end of the stream.
    pub async fn recv(&mut self) -> Result<Option<C>, ApiError> {
        self.next().await.transpose()
    }

    /// Decode frames into the pending queue. Stops at the first bad frame.
    fn enqueue(&mut self, frames: Vec<Frame>) {
        for frame in frames {
            match C::decode(frame.event.as_deref(), &frame.data) {
                Ok(Some(chunk)) => self.pending.push_back(Ok(chunk)),
                Ok(None) => {}
                Err(e) => {
                    self.fail(e);
                    return;
                }
            }
        }
    }

    fn fail(&mut self, err: ApiError) {
        self.release("error");
        self.pending.push_back(Err(err));
    }
}

impl<C> ChunkStream<C> {
    /// Stop reading and release the transport.
    pub fn close(mut self) {
        self.release("closed by caller");
    }

    /// True once the transport has been released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn release(&mut self, reason: &str) {
        if self.inner.take().is_some() {
            tracing::debug!("Stream released: {reason}");
        }
    }
}

impl<C> Drop for ChunkStream<C> {
    fn drop(&mut self) {
        self.release("dropped");
    }
}

impl<C: StreamChunk> Stream for ChunkStream<C> {
    type Item = Result<C, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                if matches!(&item, Ok(chunk) if chunk.is_terminal()) {
                    this.release("terminal chunk");
                    this.pending.clear();
                }
                return Poll::Ready(Some(item));
            }

            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let (frames, err) = this.framer.feed(&bytes);
                    this.enqueue(frames);
                    if let Some(e) = err {
                        if !this.is_closed() {
                            this.fail(e);
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => this.fail(e),
                Poll::Ready(None) => {
                    match this.framer.finish() {
                        Ok(frame) => this.enqueue(frame.into_iter().collect()),
                        Err(e) => this.fail(e),
                    }
                    this.release("end of body");
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
