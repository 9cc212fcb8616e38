use crate::protocol::{PayloadItem, SendError};
use crate::utils::to_hex;
use bytes::{Buf, BytesMut};

use tokio_util::codec::Encoder;

/// Frames payload items as `size CRLF data CRLF`, closing with the zero-size chunk.
///
/// The size is written in lower-case hex. Empty chunks are skipped, since an empty chunk
/// would read as the last chunk. Items after [`PayloadItem::Eof`] are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, send_size: 0 }
    }

    /// Payload bytes written so far, framing excluded.
    pub fn send_size(&self) -> usize {
        self.send_size
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl ChunkedEncoder {
    /// Appends the framing of `item` to `dst`.
    pub fn frame<D: Buf>(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) {
        if self.eof {
            return;
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let size = bytes.remaining();
                if size == 0 {
                    return;
                }
                let size_line = to_hex(size);
                dst.reserve(size_line.len() + size + 4);
                dst.extend_from_slice(size_line.as_bytes());
                dst.extend_from_slice(b"\r\n");
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                dst.extend_from_slice(b"\r\n");
                self.send_size += size;
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
            }
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.frame(item, dst);
        Ok(())
    }
}
