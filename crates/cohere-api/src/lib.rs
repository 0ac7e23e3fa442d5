//! Cohere REST API client: single-shot dispatch, typed chunk streams and
//! job polling.

mod client;
mod consume;
mod framing;
mod poll;
mod stream;

pub use client::ApiClient;
pub use consume::{StreamSummary, drain_stream};
pub use framing::{Frame, Framer};
pub use poll::WaitConfig;
pub use stream::ChunkStream;
pub use tokio_util::sync::CancellationToken;
