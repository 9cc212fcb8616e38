//! Message body handling.
//!
//! ## Decoders
//! - [`LengthDecoder`]: reads a body delimited by `Content-Length`
//! - [`ChunkedDecoder`]: reads a `Transfer-Encoding: chunked` body, including extensions and trailers
//! - [`PayloadDecoder`]: picks one of the above from a [`PayloadSize`](crate::protocol::PayloadSize)
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: frames response content as chunks

use bytes::Bytes;

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::{ChunkHeader, ChunkedDecoder, parse_chunk_header};
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;

/// A fully received request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Body bytes with any transfer framing removed.
    pub content: Bytes,
    /// Length of `content`; for chunked bodies the sum of the chunk sizes.
    pub content_length: usize,
    /// Bytes consumed from the connection, framing included.
    pub bytes_received: usize,
}
