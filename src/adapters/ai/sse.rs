//! Buffered Server-Sent Events decoding.
//!
//! Network chunks split SSE lines at arbitrary points, and an inline image
//! frame easily spans dozens of chunks, so partial lines are buffered until
//! their newline arrives.

/// SSE decoder with a bounded line buffer.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    /// A single frame carrying a base64 panorama can run to several
    /// megabytes; anything beyond this is treated as a malformed stream.
    const MAX_BUFFER_SIZE: usize = 32 * 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the data of every completed frame.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        if self.buffer.len() > Self::MAX_BUFFER_SIZE {
            tracing::warn!(
                limit_mb = Self::MAX_BUFFER_SIZE / (1024 * 1024),
                "SSE buffer exceeded limit, dropping buffered data"
            );
            self.buffer.clear();
            return Vec::new();
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() {
                    frames.push(SseFrame {
                        data: data.to_string(),
                    });
                }
            }
        }
        frames
    }

    /// Push a string directly.
    pub fn push_str(&mut self, s: &str) -> Vec<SseFrame> {
        self.push(s.as_bytes())
    }

    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty()
    }
}

/// The payload of one `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub data: String,
}

impl SseFrame {
    /// First 200 characters, for log lines.
    pub fn preview(&self) -> String {
        if self.data.chars().count() > 200 {
            let head: String = self.data.chars().take(200).collect();
            format!("{}...", head)
        } else {
            self.data.clone()
        }
    }
}
