use bytes::{Buf, Bytes};

/// One piece of a payload handed to a payload encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// How the body of a message is delimited on the wire.
///
/// For requests this is derived from `Content-Length` / `Transfer-Encoding`, for responses
/// it is chosen by [`Response::handle_content`](crate::protocol::Response::handle_content).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(usize),
    /// Payload using chunked transfer encoding
    Chunked,
    /// No payload
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}
