use std::time::Duration;

/// Bounds applied while a request is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest accepted request line, header line or chunk-size line, without its CRLF.
    pub max_line_size: usize,
    /// Most header fields accepted in one request.
    pub max_headers: usize,
    /// Largest accepted body, after removing chunk framing.
    pub max_body_size: usize,
    /// Time allowed for a line to arrive, and the idle limit while a body is read.
    pub read_timeout: Duration,
}

impl Limits {
    pub const DEFAULT_MAX_LINE_SIZE: usize = 8 * 1024;
    pub const DEFAULT_MAX_HEADERS: usize = 64;
    pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_size: Self::DEFAULT_MAX_LINE_SIZE,
            max_headers: Self::DEFAULT_MAX_HEADERS,
            max_body_size: Self::DEFAULT_MAX_BODY_SIZE,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
        }
    }
}
