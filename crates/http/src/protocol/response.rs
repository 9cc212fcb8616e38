//! The response model.
//!
//! A [`Response`] is filled in by a handler, finalised once by [`Response::handle_content`]
//! and then serialised by [`ResponseEncoder`](crate::codec::ResponseEncoder).

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING, UPGRADE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_util::codec::Encoder;

use crate::codec::{ChunkedEncoder, ResponseEncoder};
use crate::protocol::{HttpVersion, Method, PayloadItem, PayloadSize, Request, SendError};
use crate::utils::escape_html;

/// Content longer than this is sent chunked, in chunks of at most this size.
pub const CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: String,
    version: HttpVersion,
    request_method: Method,
    headers: HeaderMap,
    cookies: BTreeMap<String, String>,
    content: Bytes,
    chunks: Vec<Bytes>,
    has_content: bool,
    chunked: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            reason: String::new(),
            version: HttpVersion::HTTP_11,
            request_method: Method::Get,
            headers: HeaderMap::new(),
            cookies: BTreeMap::new(),
            content: Bytes::new(),
            chunks: Vec::new(),
            has_content: false,
            chunked: false,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty `200 OK` answering `request`.
    pub fn for_request(request: &Request) -> Self {
        let mut response = Self::new();
        response.answer(request);
        response
    }

    /// An HTML error page for `status`, with `reason` as its message.
    pub fn error(status: StatusCode, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let title = format!("{} {}", status.as_str(), status.canonical_reason().unwrap_or("Unknown"));
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head><body><h1>{title}</h1><p>{}</p></body></html>\n",
            escape_html(&reason)
        );

        let mut response = Self::new();
        response.status = status;
        response.reason = reason;
        if let Ok(content_type) = HeaderValue::from_str(mime::TEXT_HTML_UTF_8.as_ref()) {
            response.headers.insert(CONTENT_TYPE, content_type);
        }
        response.set_content(body);
        response
    }

    /// `426 Upgrade Required`, pointing the client at HTTP/1.1.
    pub fn upgrade_required(reason: impl Into<String>) -> Self {
        let mut response = Self::error(StatusCode::UPGRADE_REQUIRED, reason);
        response.headers.insert(UPGRADE, HeaderValue::from_static("HTTP/1.1"));
        response
    }

    /// The error page for a request that failed to parse.
    pub fn rejecting(request: &Request) -> Self {
        let mut response = if request.status() == StatusCode::UPGRADE_REQUIRED {
            Self::upgrade_required(request.reason())
        } else {
            Self::error(request.status(), request.reason())
        };
        response.answer(request);
        response
    }

    /// Takes over the method and version of the request being answered.
    ///
    /// Versions other than 1.x are answered as HTTP/1.1.
    pub fn answer(&mut self, request: &Request) {
        self.request_method = request.method();
        self.version = if request.version().major == 1 { request.version() } else { HttpVersion::HTTP_11 };
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn request_method(&self) -> Method {
        self.request_method
    }

    pub fn set_request_method(&mut self, method: Method) {
        self.request_method = method;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn set_content_type(&mut self, mime: &mime::Mime) -> Result<(), SendError> {
        let value = HeaderValue::from_str(mime.as_ref()).map_err(|_e| SendError::invalid_response("invalid content type"))?;
        self.headers.insert(CONTENT_TYPE, value);
        Ok(())
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Adds a cookie, sent as its own `Set-Cookie` field.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Bytes>) {
        self.content = content.into();
        self.has_content = !self.content.is_empty();
    }

    /// The pre-framed chunks, filled by [`handle_content`](Self::handle_content) for long content.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// How the body goes on the wire, as decided by [`handle_content`](Self::handle_content).
    pub fn payload_size(&self) -> PayloadSize {
        if self.chunked {
            PayloadSize::Chunked
        } else if self.content.is_empty() {
            PayloadSize::Empty
        } else {
            PayloadSize::Length(self.content.len())
        }
    }

    /// Whether this response ends the connection, i.e. it carries `Connection: close`.
    pub fn closes_connection(&self) -> bool {
        self.headers
            .get(http::header::CONNECTION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.split(',').any(|t| t.trim().eq_ignore_ascii_case("close")))
    }

    /// Chooses the body framing and sets the matching headers.
    ///
    /// Content longer than [`CHUNK_SIZE`] is framed into chunks with
    /// `Transfer-Encoding: chunked`, shorter content gets a `Content-Length`. Without content,
    /// `Content-Length: 0` is sent unless the status forbids a body. A response to `HEAD`
    /// keeps the framing headers but drops the body.
    pub fn handle_content(&mut self) {
        self.chunks.clear();
        self.chunked = false;
        self.headers.remove(TRANSFER_ENCODING);

        if !self.has_content {
            self.content = Bytes::new();
            if self.allows_body() {
                self.headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
            } else {
                self.headers.remove(CONTENT_LENGTH);
            }
        } else if self.content.len() > CHUNK_SIZE {
            self.chunks = frame_chunks(&self.content);
            self.chunked = true;
            self.headers.remove(CONTENT_LENGTH);
            self.headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        } else {
            self.headers.insert(CONTENT_LENGTH, HeaderValue::from(self.content.len()));
        }

        if self.request_method == Method::Head {
            self.content = Bytes::new();
            self.chunks.clear();
        }
    }

    /// Whether a message body is permitted for this status, RFC 7230 §3.3.3.
    fn allows_body(&self) -> bool {
        let tunnel = self.request_method == Method::Connect && self.status.is_success();
        !(self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED
            || tunnel)
    }

    /// Serialises the response in wire format.
    pub fn to_bytes(self) -> Result<Bytes, SendError> {
        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(self, &mut dst)?;
        Ok(dst.freeze())
    }
}

fn frame_chunks(content: &Bytes) -> Vec<Bytes> {
    let mut encoder = ChunkedEncoder::new();
    let mut chunks = Vec::with_capacity(content.len() / CHUNK_SIZE + 2);

    let mut offset = 0;
    while offset < content.len() {
        let end = (offset + CHUNK_SIZE).min(content.len());
        let mut framed = BytesMut::with_capacity(end - offset + 8);
        encoder.frame(PayloadItem::Chunk(content.slice(offset..end)), &mut framed);
        chunks.push(framed.freeze());
        offset = end;
    }

    let mut last = BytesMut::with_capacity(5);
    encoder.frame(PayloadItem::<Bytes>::Eof, &mut last);
    chunks.push(last.freeze());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONNECTION;

    #[test]
    fn test_short_content_has_length() {
        let mut response = Response::new();
        response.set_content("Hello World!");
        response.handle_content();

        assert_eq!(response.header("content-length"), Some("12"));
        assert!(!response.is_chunked());
        assert_eq!(response.payload_size(), PayloadSize::Length(12));
        assert_eq!(&response.content()[..], b"Hello World!");
    }

    #[test]
    fn test_long_content_is_chunked() {
        let mut response = Response::new();
        response.set_content(vec![b'x'; 600]);
        response.handle_content();

        assert!(response.is_chunked());
        assert_eq!(response.header("transfer-encoding"), Some("chunked"));
        assert_eq!(response.header("content-length"), None);

        let chunks = response.chunks();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].starts_with(b"100\r\n"));
        assert_eq!(chunks[0].len(), 5 + 256 + 2);
        assert!(chunks[2].starts_with(b"58\r\n"));
        assert_eq!(&chunks[3][..], b"0\r\n\r\n");
    }

    #[test]
    fn test_exactly_chunk_size_is_not_chunked() {
        let mut response = Response::new();
        response.set_content(vec![b'x'; CHUNK_SIZE]);
        response.handle_content();
        assert!(!response.is_chunked());
        assert_eq!(response.header("content-length"), Some("256"));
    }

    #[test]
    fn test_no_content() {
        let mut response = Response::new();
        response.handle_content();
        assert_eq!(response.header("content-length"), Some("0"));

        let mut response = Response::new();
        response.set_status(StatusCode::NO_CONTENT);
        response.handle_content();
        assert_eq!(response.header("content-length"), None);

        let mut response = Response::new();
        response.set_request_method(Method::Connect);
        response.handle_content();
        assert_eq!(response.header("content-length"), None);
    }

    #[test]
    fn test_head_drops_body() {
        let mut response = Response::new();
        response.set_request_method(Method::Head);
        response.set_content(vec![b'x'; 1000]);
        response.handle_content();

        assert_eq!(response.header("transfer-encoding"), Some("chunked"));
        assert!(response.chunks().is_empty());
        assert!(response.content().is_empty());

        let mut response = Response::new();
        response.set_request_method(Method::Head);
        response.set_content("short");
        response.handle_content();
        assert_eq!(response.header("content-length"), Some("5"));
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_error_page() {
        let response = Response::error(StatusCode::NOT_FOUND, "Target <Resource> Not Found");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.reason(), "Target <Resource> Not Found");
        assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));

        let body = std::str::from_utf8(response.content()).unwrap();
        assert!(body.contains("<title>404 Not Found</title>"));
        assert!(body.contains("Target &lt;Resource&gt; Not Found"));
    }

    #[test]
    fn test_upgrade_required() {
        let response = Response::upgrade_required("HTTP version requested is not 1.1");
        assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
        assert_eq!(response.header("upgrade"), Some("HTTP/1.1"));
    }

    #[test]
    fn test_closes_connection() {
        let mut response = Response::new();
        assert!(!response.closes_connection());
        response.insert_header(CONNECTION, HeaderValue::from_static("Close"));
        assert!(response.closes_connection());
    }

    #[test]
    fn test_to_bytes() {
        let mut response = Response::new();
        response.set_status(StatusCode::CREATED);
        response.add_cookie("session", "abc");
        response.set_content("done");
        response.handle_content();

        let bytes = response.to_bytes().unwrap();
        assert_eq!(&bytes[..], b"HTTP/1.1 201 Created\r\ncontent-length: 4\r\nSet-Cookie: session=abc\r\n\r\ndone");
    }
}
