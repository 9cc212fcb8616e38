//! The request model and its construction from a receive buffer.
//!
//! [`Request::build`] drives the whole request pipeline: the head is decoded, the framing
//! headers are validated and the body, if any, is read. A request that fails on the way is
//! still returned, carrying the failure as its [`status`](Request::status), so that the
//! connection can answer it like any other request.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, StatusCode};
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::codec::{HeaderDecoder, Payload, PayloadDecoder, RecvBuffer, RequestHead};
use crate::protocol::{HttpVersion, Limits, Method, ParseError, PayloadSize, Protocol, Uri};
use crate::utils::ensure;

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    protocol: Protocol,
    version: HttpVersion,
    uri: Uri,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    content: Bytes,
    content_length: usize,
    content_received: usize,
    bytes_received: usize,
    path_params: HashMap<String, String>,
    file_path: String,
    status: StatusCode,
    reason: String,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::Get,
            protocol: Protocol::Http,
            version: HttpVersion::HTTP_11,
            uri: Uri::default(),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            content: Bytes::new(),
            content_length: 0,
            content_received: 0,
            bytes_received: 0,
            path_params: HashMap::new(),
            file_path: String::new(),
            status: StatusCode::OK,
            reason: String::new(),
        }
    }
}

impl Request {
    /// Reads one complete request from `recv`.
    ///
    /// Protocol failures are reported through the returned request's status. Only transport
    /// failures, where the peer is gone or the stream broke, are returned as `Err`.
    pub async fn build<R>(recv: &mut RecvBuffer<R>, limits: &Limits) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut request = Request::default();

        match request.read_from(recv, limits).await {
            Ok(()) => Ok(request),
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                warn!(cause = %e, bytes_received = request.bytes_received, "rejected request");
                request.fail(&e);
                Ok(request)
            }
        }
    }

    async fn read_from<R>(&mut self, recv: &mut RecvBuffer<R>, limits: &Limits) -> Result<(), ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let RequestHead { request_line, headers, cookies, bytes_received } = HeaderDecoder::new(*limits).decode(recv).await?;
        self.method = request_line.method;
        self.protocol = request_line.protocol;
        self.version = request_line.version;
        self.uri = request_line.uri;
        self.headers = headers;
        self.cookies = cookies;
        self.bytes_received = bytes_received;

        let payload_size = self.validate()?;
        let decoder = PayloadDecoder::from(payload_size);
        if decoder.is_empty() {
            return Ok(());
        }

        let payload = decoder.decode(recv, limits).await?;
        check_payload(payload_size, &payload)?;
        self.content = payload.content;
        self.content_length = payload.content_length;
        self.content_received = payload.content_length;
        self.bytes_received += payload.bytes_received;

        debug!(content_length = self.content_length, chunked = payload_size.is_chunked(), "received request body");
        Ok(())
    }

    /// Checks the version and works out how the body is framed.
    fn validate(&self) -> Result<PayloadSize, ParseError> {
        ensure!(self.version.major == 1, ParseError::upgrade_required(self.version.major, self.version.minor));

        let content_length = self.headers.get(CONTENT_LENGTH);
        if let Some(transfer_encoding) = self.headers.get(TRANSFER_ENCODING) {
            ensure!(content_length.is_none(), ParseError::bad_request("Both Transfer-Encoding and Content-Length are present"));
            let is_chunked = transfer_encoding
                .to_str()
                .ok()
                .and_then(|value| value.rsplit(',').next())
                .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
            ensure!(is_chunked, ParseError::bad_request("Unsupported Transfer-Encoding, the final coding must be chunked"));
            return Ok(PayloadSize::Chunked);
        }

        match content_length {
            None => Ok(PayloadSize::Empty),
            Some(value) => {
                let length = value
                    .to_str()
                    .ok()
                    .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| ParseError::bad_request("Invalid Content-Length value"))?;
                Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) })
            }
        }
    }

    fn fail(&mut self, e: &ParseError) {
        self.status = e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.reason = e.to_string();
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of a header field as text, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Whether the request announced a body through its framing headers.
    pub fn has_content(&self) -> bool {
        self.headers.contains_key(CONTENT_LENGTH) || self.is_chunked()
    }

    pub fn is_chunked(&self) -> bool {
        self.headers.contains_key(TRANSFER_ENCODING)
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn content_received(&self) -> usize {
        self.content_received
    }

    /// Bytes taken off the connection for this request, framing included.
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.uri.query_param(name)
    }

    pub fn add_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(name.into(), value.into());
    }

    /// Relative path collected below a filesystem resource, segments joined by `/`.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Appends one segment to [`Request::file_path`]. The segment is taken as is; the router
    /// refuses `.`, `..` and segments containing `/` before calling this.
    pub fn append_file_segment(&mut self, segment: &str) {
        if !self.file_path.is_empty() {
            self.file_path.push('/');
        }
        self.file_path.push_str(segment);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Human-readable explanation of a non-OK status.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Whether the client asked to keep the connection open after this request.
    ///
    /// HTTP/1.1 is persistent unless `Connection: close` is sent, HTTP/1.0 only with
    /// `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let has_token = |token: &str| {
            self.headers
                .get_all(CONNECTION)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .flat_map(|value| value.split(','))
                .any(|t| t.trim().eq_ignore_ascii_case(token))
        };

        if self.version.minor == 0 { has_token("keep-alive") } else { !has_token("close") }
    }
}

/// The decoded body must agree with the framing it was decoded for.
fn check_payload(size: PayloadSize, payload: &Payload) -> Result<(), ParseError> {
    ensure!(
        payload.content.len() == payload.content_length,
        ParseError::internal("Decoded content does not match its length")
    );
    if let PayloadSize::Length(expected) = size {
        ensure!(
            payload.content_length == expected,
            ParseError::internal("Decoded content does not match Content-Length")
        );
    }
    Ok(())
}
