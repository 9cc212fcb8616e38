//! Unified body decoding.
//!
//! The strategy is chosen once per request from the framing headers:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Messages with no body

use tokio::io::AsyncRead;

use crate::codec::RecvBuffer;
use crate::codec::body::Payload;
use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{Limits, ParseError, PayloadSize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: usize) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub async fn decode<R>(&self, recv: &mut RecvBuffer<R>, limits: &Limits) -> Result<Payload, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        match &self.kind {
            Kind::Length(decoder) => decoder.decode(recv, limits).await,
            Kind::Chunked(decoder) => decoder.decode(recv, limits).await,
            Kind::NoBody => Ok(Payload::default()),
        }
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(size: PayloadSize) -> Self {
        match size {
            PayloadSize::Length(n) => PayloadDecoder::fix_length(n),
            PayloadSize::Chunked => PayloadDecoder::chunked(),
            PayloadSize::Empty => PayloadDecoder::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_payload_size() {
        assert!(PayloadDecoder::from(PayloadSize::Chunked).is_chunked());
        assert!(PayloadDecoder::from(PayloadSize::Empty).is_empty());

        let mut recv = RecvBuffer::new(&b"abc"[..]);
        let payload = PayloadDecoder::from(PayloadSize::Length(3)).decode(&mut recv, &Limits::default()).await.unwrap();
        assert_eq!(&payload.content[..], b"abc");
    }

    #[tokio::test]
    async fn test_no_body_reads_nothing() {
        let mut recv = RecvBuffer::new(&b"GET"[..]);
        let payload = PayloadDecoder::empty().decode(&mut recv, &Limits::default()).await.unwrap();
        assert_eq!(payload, Payload::default());
        assert!(recv.is_empty());
    }
}
