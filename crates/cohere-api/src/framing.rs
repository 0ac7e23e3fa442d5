//! Incremental framing of streaming response bodies.
//!
//! Bytes are buffered until a full frame is available, so frames split
//! across transport chunks (including inside a UTF-8 sequence) reassemble
//! correctly. Carriage returns are dropped on the way in; the API never
//! sends them unescaped inside a JSON payload.

use cohere_types::{ApiError, Framing};

/// One complete frame cut from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// SSE `event:` field. Always `None` for JSON lines.
    pub event: Option<String>,
    pub data: String,
}

/// Buffers raw body bytes and cuts them into [`Frame`]s.
pub struct Framer {
    framing: Framing,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a delimiter.
    scanned: usize,
}

impl Framer {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
            scanned: 0,
        }
    }

    /// Feed a chunk of bytes and return the frames it completed.
    ///
    /// If a completed block does not parse, the frames before it are still
    /// returned along with the error, and nothing after it is read.
    pub fn feed(&mut self, chunk: &[u8]) -> (Vec<Frame>, Option<ApiError>) {
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let delimiter: &[u8] = match self.framing {
            Framing::Sse => b"\n\n",
            Framing::JsonLines => b"\n",
        };

        let mut frames = Vec::new();
        while let Some(pos) = find(&self.buffer, delimiter, self.scanned) {
            let rest = self.buffer.split_off(pos + delimiter.len());
            let mut block = std::mem::replace(&mut self.buffer, rest);
            block.truncate(pos);
            self.scanned = 0;
            match self.parse(&block) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(e) => return (frames, Some(e)),
            }
        }
        // A delimiter may straddle the next chunk boundary.
        self.scanned = self.buffer.len().saturating_sub(delimiter.len() - 1);
        (frames, None)
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Result<Option<Frame>, ApiError> {
        self.scanned = 0;
        let block = std::mem::take(&mut self.buffer);
        if block.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.parse(&block)
    }

    fn parse(&self, block: &[u8]) -> Result<Option<Frame>, ApiError> {
        let text = std::str::from_utf8(block)
            .map_err(|e| ApiError::StreamParse(format!("invalid UTF-8 in stream: {e}")))?;
        Ok(match self.framing {
            Framing::Sse => parse_sse_block(text),
            Framing::JsonLines => {
                let line = text.trim();
                (!line.is_empty()).then(|| Frame {
                    event: None,
                    data: line.to_string(),
                })
            }
        })
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Parse one SSE block (the lines between blank lines).
fn parse_sse_block(block: &str) -> Option<Frame> {
    let mut event = None;
    let mut data_lines = Vec::new();

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }

        if let Some((field, value)) = line.split_once(':') {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => event = Some(value.to_string()),
                "data" => data_lines.push(value.to_string()),
                _ => {}
            }
        } else if line == "data" {
            data_lines.push(String::new());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(Frame {
        event,
        data: data_lines.join("\n"),
    })
}
