//! Serialises the head of a [`Response`]: status line, header fields, `Set-Cookie` fields and
//! the blank line.
//!
//! Framing headers are not computed here; they are expected to be set already by
//! [`Response::handle_content`].

use crate::protocol::{Response, SendError};

use bytes::{BufMut, BytesMut};

use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<&Response> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, response: &Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);

        let version = response.version();
        if version.major != 1 {
            error!(http_version = %version, "unsupported http version");
            return Err(SendError::invalid_response(format!("can't send a HTTP/{version} response")));
        }

        let status = response.status();
        write!(FastWrite(dst), "HTTP/{version} {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or("Unknown"))?;

        for (header_name, header_value) in response.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }

        for (name, value) in response.cookies() {
            write!(FastWrite(dst), "Set-Cookie: {name}={value}\r\n")?;
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
