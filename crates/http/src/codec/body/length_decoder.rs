//! Body delimited by `Content-Length`, see
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::RecvBuffer;
use crate::codec::body::Payload;
use crate::protocol::{Limits, ParseError};
use crate::utils::ensure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    length: usize,
}

impl LengthDecoder {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub async fn decode<R>(&self, recv: &mut RecvBuffer<R>, limits: &Limits) -> Result<Payload, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        ensure!(self.length <= limits.max_body_size, ParseError::too_large_payload(self.length, limits.max_body_size));

        let (content, consumed) = recv.extract_fixed_size(self.length, limits.read_timeout).await?;
        trace!(len = consumed, "read fixed length body");
        Ok(Payload { content, content_length: self.length, bytes_received: consumed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic() {
        let mut recv = RecvBuffer::new(&b"hello worldGET"[..]);
        let payload = LengthDecoder::new(11).decode(&mut recv, &Limits::default()).await.unwrap();

        assert_eq!(&payload.content[..], b"hello world");
        assert_eq!(payload.content_length, 11);
        assert_eq!(payload.bytes_received, 11);
        assert_eq!(recv.buffered(), b"GET");
    }

    #[tokio::test]
    async fn test_too_large() {
        let limits = Limits { max_body_size: 4, ..Limits::default() };
        let mut recv = RecvBuffer::new(&b"hello"[..]);
        let result = LengthDecoder::new(5).decode(&mut recv, &limits).await;
        assert!(matches!(result, Err(ParseError::TooLargePayload { size: 5, max_size: 4 })));
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let mut recv = RecvBuffer::new(&b"hel"[..]);
        let result = LengthDecoder::new(5).decode(&mut recv, &Limits::default()).await;
        assert!(matches!(result, Err(ParseError::ConnectionClosed)));
    }
}
