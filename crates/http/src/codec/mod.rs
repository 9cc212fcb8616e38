//! Request parsing and response serialisation.
//!
//! Requests are parsed by a cascade of small parsers, each consuming a prefix of the
//! connection's [`RecvBuffer`]:
//!
//! - [`parse_request_target`]: the request-target, into a decoded [`Uri`](crate::protocol::Uri)
//! - [`parse_request_line`]: method, target and version
//! - [`parse_header_line`]: one `Name: value` field
//! - [`HeaderDecoder`]: the request line plus all header fields
//! - [`PayloadDecoder`]: the body, by length or chunked
//!
//! Responses are written by [`ResponseEncoder`], whose chunk framing comes from
//! [`ChunkedEncoder`].

mod body;
mod header;
mod recv_buffer;
mod request_line;
mod response_encoder;
mod uri;

pub use body::{ChunkHeader, ChunkedDecoder, ChunkedEncoder, LengthDecoder, Payload, PayloadDecoder, parse_chunk_header};
pub use header::{HeaderDecoder, HeaderEncoder, RequestHead, parse_header_line};
pub use recv_buffer::RecvBuffer;
pub use request_line::{RequestLine, parse_request_line};
pub use response_encoder::ResponseEncoder;
pub use uri::parse_request_target;
