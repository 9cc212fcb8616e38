//! Request head decoding: the request line followed by header fields up to the blank line.
//!
//! The decoder pulls lines out of a [`RecvBuffer`], so a head split across any number of
//! reads is handled the same way as one that arrived at once.
//!
//! Field handling:
//! - `Cookie` may appear once; its pairs are decoded into a map
//! - any other repeated field name has its values joined with `,`
//! - at most [`Limits::max_headers`] fields are accepted

use std::collections::HashMap;

use bytes::BytesMut;
use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};
use tokio::io::AsyncRead;
use tracing::{debug, trace};

use crate::codec::RecvBuffer;
use crate::codec::header::header_line::parse_header_line;
use crate::codec::request_line::{RequestLine, parse_request_line};
use crate::protocol::{Limits, ParseError};
use crate::utils::{ensure, fold_case, percent_decode, unquote};

/// Everything in front of the message body.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub request_line: RequestLine,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    /// Bytes consumed for the head, including the terminating blank line.
    pub bytes_received: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderDecoder {
    limits: Limits,
}

impl HeaderDecoder {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub async fn decode<R>(&self, recv: &mut RecvBuffer<R>) -> Result<RequestHead, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let Limits { max_line_size, max_headers, read_timeout, .. } = self.limits;

        // a stray CRLF may precede a request line, RFC 7230 §3.5
        let mut bytes_received = recv.extract_leading_eol();

        let (line, consumed) = recv.extract_single_line(max_line_size, read_timeout).await?;
        bytes_received += consumed;
        let request_line = parse_request_line(&line)?;
        trace!(request_line = %line, "parsed request line");

        let mut headers = HeaderMap::new();
        let mut cookies = HashMap::new();
        let mut field_count = 0;

        while !recv.starts_with_eol(read_timeout).await? {
            let (line, consumed) = recv.extract_single_line(max_line_size, read_timeout).await?;
            bytes_received += consumed;

            field_count += 1;
            ensure!(field_count <= max_headers, ParseError::too_many_headers(max_headers));

            let (name, value) = parse_header_line(&line)?;
            if name == COOKIE {
                ensure!(!headers.contains_key(COOKIE), ParseError::bad_request("Invalid header, multiple Cookie headers"));
                cookies = parse_cookies(&value)?;
                headers.insert(name, value);
                continue;
            }

            match headers.get_mut(&name) {
                Some(existing) => *existing = join_values(existing, &value)?,
                None => {
                    headers.insert(name, value);
                }
            }
        }
        bytes_received += recv.extract_leading_eol();

        debug!(
            method = %request_line.method,
            uri = %request_line.uri,
            version = %request_line.version,
            headers = headers.len(),
            "decoded request head"
        );

        Ok(RequestHead { request_line, headers, cookies, bytes_received })
    }
}

fn join_values(existing: &HeaderValue, value: &HeaderValue) -> Result<HeaderValue, ParseError> {
    let mut joined = BytesMut::with_capacity(existing.len() + value.len() + 1);
    joined.extend_from_slice(existing.as_bytes());
    joined.extend_from_slice(b",");
    joined.extend_from_slice(value.as_bytes());
    HeaderValue::from_maybe_shared(joined.freeze()).map_err(|_e| ParseError::bad_request("Invalid header field value"))
}

/// Decodes `name=value; name2="quoted"` into a map with folded names.
fn parse_cookies(value: &HeaderValue) -> Result<HashMap<String, String>, ParseError> {
    let raw = value.to_str().map_err(|_e| ParseError::bad_request("Invalid characters in Cookie header"))?;
    let decoded = percent_decode(raw).ok_or_else(|| ParseError::bad_request("Invalid percent encoding in Cookie header"))?;

    let mut cookies = HashMap::new();
    for pair in decoded.split(';') {
        let pair = pair.trim();
        let Some((name, value)) = pair.split_once('=') else {
            return Err(ParseError::bad_request("Invalid cookie pair"));
        };
        ensure!(!name.is_empty() && !value.is_empty(), ParseError::bad_request("Invalid cookie pair"));

        let value = if value.contains('"') {
            unquote(value).ok_or_else(|| ParseError::bad_request("Invalid quoted cookie value"))?
        } else {
            fold_case(value)
        };
        cookies.insert(fold_case(name), value);
    }
    Ok(cookies)
}
