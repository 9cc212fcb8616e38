use crate::codec::header::HeaderEncoder;
use crate::protocol::{Response, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

/// Writes a finalised [`Response`] in wire format.
///
/// The head is followed by either the raw content or the pre-framed chunk sequence, whichever
/// [`Response::handle_content`] left in the response.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.header_encoder.encode(&item, dst)?;

        if item.is_chunked() {
            let size = item.chunks().iter().map(|chunk| chunk.len()).sum::<usize>();
            dst.reserve(size);
            for chunk in item.chunks() {
                dst.extend_from_slice(chunk);
            }
        } else {
            dst.extend_from_slice(item.content());
        }

        trace!(status = item.status().as_u16(), len = dst.len(), "encoded response");
        Ok(())
    }
}
