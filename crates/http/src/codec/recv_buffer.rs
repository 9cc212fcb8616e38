//! The per-connection receive buffer.
//!
//! [`RecvBuffer`] owns the read half of a connection together with the bytes received so far.
//! Parsers consume it strictly from the front. Whenever a parser needs more bytes than are
//! buffered, the buffer reads from the stream itself, bounded by the caller's time limit, so
//! there is never a second task feeding it.

use bytes::{Buf, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::trace;

use crate::protocol::ParseError;
use crate::utils::ensure;

const CRLF: &[u8; 2] = b"\r\n";

/// Initial capacity, enough for the header block of most requests.
const INIT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct RecvBuffer<R> {
    reader: R,
    buf: BytesMut,
}

impl<R> RecvBuffer<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buf: BytesMut::with_capacity(capacity) }
    }

    /// Number of buffered bytes not yet consumed by a parser.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The unconsumed bytes.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Drops a leading CRLF if there is one, returning the number of bytes removed.
    pub fn extract_leading_eol(&mut self) -> usize {
        if self.buf.starts_with(CRLF) {
            self.buf.advance(CRLF.len());
            CRLF.len()
        } else {
            0
        }
    }

    /// Removes one CRLF-terminated line from the front of the buffer.
    ///
    /// Returns the line without its terminator and the number of bytes consumed. Fails with
    /// [`ParseError::Timeout`] when no complete line arrives within `max_time`, and with
    /// [`ParseError::TooLongLine`] as soon as `max_size` bytes are buffered without a CRLF.
    pub async fn extract_single_line(
        &mut self,
        max_size: usize,
        max_time: Duration,
    ) -> Result<(String, usize), ParseError> {
        let deadline = Instant::now() + max_time;
        let mut searched = 0;

        loop {
            let window = &self.buf[..self.buf.len().min(max_size + CRLF.len())];
            if let Some(idx) = find_crlf(window, searched) {
                let line = self.buf.split_to(idx);
                self.buf.advance(CRLF.len());
                let line = String::from_utf8(line.to_vec())
                    .map_err(|_e| ParseError::bad_request("Request line is not valid UTF-8"))?;
                return Ok((line, idx + CRLF.len()));
            }

            // a CR at the very end may be completed by the next read
            let pending_cr = self.buf.len() == max_size + 1 && self.buf.ends_with(b"\r");
            ensure!(self.buf.len() <= max_size || pending_cr, ParseError::too_long_line(max_size));
            searched = self.buf.len().saturating_sub(1);

            match timeout_at(deadline, self.fill()).await {
                Ok(result) => result?,
                Err(_elapsed) => return Err(ParseError::timeout("Timeout reading line from buffer")),
            };
        }
    }

    /// Removes exactly `size` bytes from the front of the buffer.
    ///
    /// `max_time` is an idle limit: it restarts every time new bytes arrive.
    pub async fn extract_fixed_size(&mut self, size: usize, max_time: Duration) -> Result<(Bytes, usize), ParseError> {
        while self.buf.len() < size {
            self.buf.reserve(size - self.buf.len());
            match timeout(max_time, self.fill()).await {
                Ok(result) => result?,
                Err(_elapsed) => return Err(ParseError::timeout("Connection timed out on request")),
            };
        }

        Ok((self.buf.split_to(size).freeze(), size))
    }

    /// Waits until two bytes are buffered and reports whether they are CRLF.
    ///
    /// Nothing is consumed. This is how the end of a header or trailer block is detected.
    pub async fn starts_with_eol(&mut self, max_time: Duration) -> Result<bool, ParseError> {
        let deadline = Instant::now() + max_time;
        while self.buf.len() < CRLF.len() {
            if !self.buf.is_empty() && self.buf[0] != b'\r' {
                return Ok(false);
            }
            match timeout_at(deadline, self.fill()).await {
                Ok(result) => result?,
                Err(_elapsed) => return Err(ParseError::timeout("Timeout reading line from buffer")),
            };
        }
        Ok(self.buf.starts_with(CRLF))
    }

    /// Consumes a mandatory CRLF, as found after every chunk of a chunked body.
    pub async fn expect_eol(&mut self, max_time: Duration) -> Result<usize, ParseError> {
        ensure!(self.starts_with_eol(max_time).await?, ParseError::bad_request("Missing CRLF after chunk data"));
        Ok(self.extract_leading_eol())
    }

    /// Waits up to `idle` for the first byte of the next message.
    ///
    /// Returns `false` when the idle window passes without data. A peer that closes the
    /// stream while idle yields [`ParseError::ConnectionClosed`].
    pub async fn wait_for_data(&mut self, idle: Duration) -> Result<bool, ParseError> {
        if !self.buf.is_empty() {
            return Ok(true);
        }
        match timeout(idle, self.fill()).await {
            Ok(result) => result.map(|_| true),
            Err(_elapsed) => Ok(false),
        }
    }

    async fn fill(&mut self) -> Result<usize, ParseError> {
        if self.buf.capacity() == self.buf.len() {
            self.buf.reserve(INIT_BUFFER_SIZE);
        }

        let read = self.reader.read_buf(&mut self.buf).await?;
        if read == 0 {
            return Err(ParseError::ConnectionClosed);
        }
        trace!(read, buffered = self.buf.len(), "received bytes");
        Ok(read)
    }
}

fn find_crlf(window: &[u8], from: usize) -> Option<usize> {
    window.get(from..)?.windows(CRLF.len()).position(|w| w == CRLF).map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const SECOND: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_single_line() {
        let mut recv = RecvBuffer::new(&b"GET / HTTP/1.1\r\nHost: a\r\n"[..]);

        let (line, consumed) = recv.extract_single_line(8192, SECOND).await.unwrap();
        assert_eq!(line, "GET / HTTP/1.1");
        assert_eq!(consumed, 16);

        let (line, consumed) = recv.extract_single_line(8192, SECOND).await.unwrap();
        assert_eq!(line, "Host: a");
        assert_eq!(consumed, 9);
        assert!(recv.is_empty());
    }

    #[tokio::test]
    async fn test_crlf_split_across_reads() {
        let (client, server) = tokio::io::duplex(64);
        let mut recv = RecvBuffer::new(server);

        let writer = tokio::spawn(async move {
            let mut client = client;
            client.write_all(b"Host: a\r").await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(b"\nrest").await.unwrap();
            client
        });

        let (line, consumed) = recv.extract_single_line(8192, SECOND).await.unwrap();
        assert_eq!(line, "Host: a");
        assert_eq!(consumed, 9);

        let _client = writer.await.unwrap();
        assert_eq!(recv.buffered(), b"rest");
    }

    #[tokio::test]
    async fn test_line_too_long() {
        let mut recv = RecvBuffer::new(&b"0123456789abcdef\r\n"[..]);
        let result = recv.extract_single_line(8, SECOND).await;
        assert!(matches!(result, Err(ParseError::TooLongLine { max_size: 8 })));
    }

    #[tokio::test]
    async fn test_line_exactly_at_limit() {
        let mut recv = RecvBuffer::new(&b"01234567\r\n"[..]);
        let (line, _) = recv.extract_single_line(8, SECOND).await.unwrap();
        assert_eq!(line, "01234567");
    }

    #[tokio::test]
    async fn test_line_at_limit_with_crlf_split_across_reads() {
        let (client, server) = tokio::io::duplex(64);
        let mut recv = RecvBuffer::new(server);

        let writer = tokio::spawn(async move {
            let mut client = client;
            client.write_all(b"01234567\r").await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.write_all(b"\nnext").await.unwrap();
            client
        });

        let (line, consumed) = recv.extract_single_line(8, SECOND).await.unwrap();
        assert_eq!(line, "01234567");
        assert_eq!(consumed, 10);

        let _client = writer.await.unwrap();
        assert_eq!(recv.buffered(), b"next");
    }

    #[tokio::test]
    async fn test_line_over_limit_ending_in_cr() {
        let mut recv = RecvBuffer::new(&b"012345678\r"[..]);
        let result = recv.extract_single_line(8, SECOND).await;
        assert!(matches!(result, Err(ParseError::TooLongLine { max_size: 8 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_line_timeout() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(b"GET / HT").await.unwrap();

        let mut recv = RecvBuffer::new(server);
        let result = recv.extract_single_line(8192, Duration::from_secs(30)).await;
        assert!(matches!(result, Err(ParseError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_peer_closed() {
        let mut recv = RecvBuffer::new(&b"partial"[..]);
        let result = recv.extract_single_line(8192, SECOND).await;
        assert!(matches!(result, Err(ParseError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_fixed_size() {
        let mut recv = RecvBuffer::new(&b"hello worldtail"[..]);
        let (bytes, consumed) = recv.extract_fixed_size(11, SECOND).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
        assert_eq!(consumed, 11);
        assert_eq!(recv.buffered(), b"tail");

        let (bytes, _) = recv.extract_fixed_size(0, SECOND).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_size_idle_timeout() {
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(b"abc").await.unwrap();

        let mut recv = RecvBuffer::new(server);
        let result = recv.extract_fixed_size(10, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ParseError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_leading_eol() {
        let mut recv = RecvBuffer::new(&b""[..]);
        assert_eq!(recv.extract_leading_eol(), 0);

        let mut recv = RecvBuffer::new(&b"\r\nGET"[..]);
        assert!(recv.starts_with_eol(SECOND).await.unwrap());
        assert_eq!(recv.extract_leading_eol(), 2);
        assert!(!recv.starts_with_eol(SECOND).await.unwrap());
        assert_eq!(recv.extract_leading_eol(), 0);
        assert_eq!(recv.buffered(), b"GET");
    }

    #[tokio::test]
    async fn test_expect_eol() {
        let mut recv = RecvBuffer::new(&b"\r\nxy"[..]);
        assert_eq!(recv.expect_eol(SECOND).await.unwrap(), 2);
        let result = recv.expect_eol(SECOND).await;
        assert!(matches!(result, Err(ParseError::BadRequest { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_data() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut recv = RecvBuffer::new(server);

        assert!(!recv.wait_for_data(Duration::from_secs(30)).await.unwrap());

        client.write_all(b"G").await.unwrap();
        assert!(recv.wait_for_data(Duration::from_secs(30)).await.unwrap());
        assert_eq!(recv.len(), 1);

        drop(client);
        let mut recv = RecvBuffer::new(&b""[..]);
        assert!(matches!(recv.wait_for_data(SECOND).await, Err(ParseError::ConnectionClosed)));
    }
}
