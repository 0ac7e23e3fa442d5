//! Output: pretty JSON for single-shot responses, live text for streams.

use std::io::{self, Write};

use anyhow::{Context, Result};
use cohere_api::{CancellationToken, ChunkStream, StreamSummary, drain_stream};
use cohere_types::{ApiError, ErrorKind, Operation, StreamChunk};
use serde::Serialize;

/// Print a response as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render response")?;
    println!("{rendered}");
    Ok(())
}

/// Drain a stream, writing text deltas to stdout as they arrive.
///
/// Cancellation (Ctrl+C) is reported on stderr and is not an error.
pub async fn print_stream<C: StreamChunk>(
    stream: ChunkStream<C>,
    cancel: &CancellationToken,
) -> Result<()> {
    write_stream(stream, cancel, |text| {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    })
    .await
}

/// Drain a stream, handing each text delta to `write`. The first write
/// failure stops the drain and is returned.
async fn write_stream<C, W>(
    stream: ChunkStream<C>,
    cancel: &CancellationToken,
    mut write: W,
) -> Result<()>
where
    C: StreamChunk,
    W: FnMut(&str) -> io::Result<()>,
{
    let stop = cancel.child_token();
    let mut write_error = None;

    let result = drain_stream(stream, &stop, |chunk| {
        let Some(text) = chunk.text_delta() else {
            return;
        };
        if write_error.is_none() {
            if let Err(e) = write(text) {
                write_error = Some(e);
                stop.cancel();
            }
        }
    })
    .await;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write stream output");
    }
    write("\n").context("Failed to write stream output")?;

    match result {
        Ok(summary) => {
            log_summary(&summary);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::Cancelled => {
            eprintln!("Cancelled.");
            Ok(())
        }
        Err(e) => Err(e).context("Stream ended abnormally"),
    }
}

fn log_summary(summary: &StreamSummary) {
    if summary.terminated {
        tracing::debug!(
            "Stream finished: {} chunks, {} chars",
            summary.chunks,
            summary.text.chars().count()
        );
    } else {
        tracing::debug!("Stream body ended without a terminal event after {} chunks", summary.chunks);
    }
}

/// Turn a cancelled single-shot call into a notice; pass other errors on.
pub fn settle<T>(result: Result<T, ApiError>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == ErrorKind::Cancelled => {
            eprintln!("Cancelled.");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("{what} failed")),
    }
}

/// One row per catalog entry.
pub fn catalog_lines() -> Vec<String> {
    let mut lines = vec![format!(
        "{:<34} {:<7} {:<9} {}",
        "OPERATION", "METHOD", "STREAMS", "READ-ONLY"
    )];
    for op in Operation::ALL {
        lines.push(format!(
            "{:<34} {:<7} {:<9} {}",
            op.name(),
            op.method().as_str(),
            yes_no(op.is_streaming()),
            yes_no(op.is_read_only())
        ));
    }
    lines
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
