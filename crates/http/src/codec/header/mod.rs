//! Header handling for both directions.
//!
//! - [`parse_header_line`]: validates a single field line
//! - [`HeaderDecoder`]: reads the request line and every field up to the blank line
//! - [`HeaderEncoder`]: writes the status line, fields and cookies of a response

mod header_decoder;
mod header_encoder;
mod header_line;

pub use header_decoder::{HeaderDecoder, RequestHead};
pub use header_encoder::HeaderEncoder;
pub use header_line::parse_header_line;
