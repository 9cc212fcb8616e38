//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module decodes bodies framed as specified in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1):
//!
//! ```text
//! chunked-body = *chunk last-chunk trailer-part CRLF
//! chunk        = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! ```
//!
//! Chunk extensions are parsed and validated; trailer fields are read and discarded.

use std::collections::HashMap;

use bytes::BytesMut;
use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::RecvBuffer;
use crate::codec::body::Payload;
use crate::protocol::{Limits, ParseError};
use crate::utils::{ensure, fold_case, from_hex, unquote};

/// The size line in front of every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkHeader {
    pub size: usize,
    /// Extension names mapped to their values; a name without `=` maps to an empty value.
    pub extensions: HashMap<String, String>,
}

/// Parses `hex-size[;name[=value]]*`.
///
/// Names and unquoted values are case-folded, quoted values are unquoted and keep their case.
pub fn parse_chunk_header(line: &str) -> Result<ChunkHeader, ParseError> {
    let mut parts = line.split(';');
    let size = parts.next().unwrap_or_default().trim_end_matches([' ', '\t']);
    let Some(size) = from_hex(size) else {
        return Err(ParseError::bad_request("Invalid chunk length"));
    };

    let mut extensions = HashMap::new();
    for extension in parts {
        let extension = extension.trim_matches([' ', '\t']);
        ensure!(!extension.is_empty(), ParseError::bad_request("Empty chunk extension"));

        let (name, value) = match extension.split_once('=') {
            Some((name, value)) => {
                ensure!(!name.is_empty(), ParseError::bad_request("Missing chunk extension name"));
                let value = if value.contains('"') {
                    unquote(value).ok_or_else(|| ParseError::bad_request("Invalid quoted chunk extension value"))?
                } else {
                    fold_case(value)
                };
                (fold_case(name), value)
            }
            None => (fold_case(extension), String::new()),
        };
        extensions.insert(name, value);
    }

    Ok(ChunkHeader { size, extensions })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedDecoder;

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Reads chunks until the last chunk, then consumes the trailer section.
    pub async fn decode<R>(&self, recv: &mut RecvBuffer<R>, limits: &Limits) -> Result<Payload, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = BytesMut::new();
        let mut bytes_received = 0;

        loop {
            let (line, consumed) = recv.extract_single_line(limits.max_line_size, limits.read_timeout).await?;
            bytes_received += consumed;

            let header = parse_chunk_header(&line)?;
            if header.size == 0 {
                break;
            }

            let total = content.len().saturating_add(header.size);
            ensure!(total <= limits.max_body_size, ParseError::too_large_payload(total, limits.max_body_size));

            let (chunk, consumed) = recv.extract_fixed_size(header.size, limits.read_timeout).await?;
            bytes_received += consumed;
            bytes_received += recv.expect_eol(limits.read_timeout).await?;

            trace!(len = header.size, extensions = header.extensions.len(), "read chunk");
            content.extend_from_slice(&chunk);
        }

        // trailer fields, then the final CRLF
        let mut trailer_count = 0;
        while !recv.starts_with_eol(limits.read_timeout).await? {
            trailer_count += 1;
            ensure!(trailer_count <= limits.max_headers, ParseError::too_many_headers(limits.max_headers));

            let (trailer, consumed) = recv.extract_single_line(limits.max_line_size, limits.read_timeout).await?;
            bytes_received += consumed;
            trace!(trailer = %trailer, "discard chunked trailer");
        }
        bytes_received += recv.extract_leading_eol();

        trace!(len = content.len(), "finished reading chunked data");
        let content_length = content.len();
        Ok(Payload { content: content.freeze(), content_length, bytes_received })
    }
}
