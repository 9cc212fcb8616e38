use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use http::HeaderValue;
use http::header::{CONNECTION, DATE};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec::{RecvBuffer, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Limits, ParseError, Request, Response};

/// Default time a connection may sit idle between requests.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// One client connection, served request after request until either side closes it.
///
/// The connection owns its receive buffer exclusively; requests on one connection are
/// handled strictly in order. It ends when:
/// - no request starts within the idle timeout
/// - the peer closes the stream
/// - a response carrying `Connection: close` has been sent
/// - the shutdown token is cancelled, after the request in flight has been answered
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    recv: RecvBuffer<R>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    limits: Limits,
    idle_timeout: Duration,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_limits(reader, writer, Limits::default(), DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_limits(reader: R, writer: W, limits: Limits, idle_timeout: Duration) -> Self {
        Self {
            recv: RecvBuffer::new(reader),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            limits,
            idle_timeout,
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>, shutdown: CancellationToken) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        loop {
            let has_data = select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("server is shutting down, close idle connection");
                    return Ok(());
                }
                result = self.recv.wait_for_data(self.idle_timeout) => match result {
                    Ok(has_data) => has_data,
                    Err(ParseError::ConnectionClosed) => {
                        info!("cant read more request, break this connection down");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            if !has_data {
                info!(idle_timeout = ?self.idle_timeout, "connection idle timeout, break this connection down");
                return Ok(());
            }

            let mut request = Request::build(&mut self.recv, &self.limits).await?;

            let mut response = if request.is_ok() { handler.handle(&mut request) } else { Response::rejecting(&request) };
            let keep_alive = self.finalize(&request, &mut response);

            debug!(
                method = %request.method(),
                uri = %request.uri(),
                status = response.status().as_u16(),
                keep_alive,
                "send response"
            );
            self.framed_write.send(response).await?;

            if !keep_alive {
                info!("response closes the connection");
                return Ok(());
            }
            if shutdown.is_cancelled() {
                info!("server is shutting down, close connection after the current request");
                return Ok(());
            }
        }
    }

    /// Applies the connection and framing rules shared by every response, returning whether
    /// the connection stays open.
    fn finalize(&self, request: &Request, response: &mut Response) -> bool {
        response.answer(request);

        let keep_alive = request.is_ok() && request.keep_alive() && !response.closes_connection();
        let connection = if keep_alive { "keep-alive" } else { "close" };
        response.insert_header(CONNECTION, HeaderValue::from_static(connection));

        let mut buf = faf_http_date::get_date_buff_no_key();
        faf_http_date::get_date_no_key(&mut buf);
        if let Ok(date) = HeaderValue::from_bytes(&buf) {
            response.insert_header(DATE, date);
        }

        response.handle_content();
        keep_alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    fn hello(request: &mut Request) -> Response {
        let mut response = Response::for_request(request);
        response.set_content(format!("hello {}", request.uri().path_segments().join("/")));
        response
    }

    fn spawn_connection(
        limits: Limits,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> (DuplexStream, JoinHandle<Result<(), HttpError>>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        let connection = HttpConnection::with_limits(reader, writer, limits, idle_timeout);
        let handle = tokio::spawn(connection.process(Arc::new(make_handler(hello)), shutdown));
        (client, handle)
    }

    async fn read_all(client: &mut DuplexStream) -> String {
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_close_after_response() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        client.write_all(b"GET /World HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n").await.unwrap();

        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.contains("content-length: 11\r\n"));
        assert!(response.contains("date: "));
        assert!(response.ends_with("\r\n\r\nhello world"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_keep_alive_serves_pipelined_requests() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        let pipelined = b"GET /a HTTP/1.1\r\n\r\nHEAD /b HTTP/1.1\r\n\r\nGET /c HTTP/1.1\r\nConnection: close\r\n\r\n";
        client.write_all(pipelined).await.unwrap();

        let response = read_all(&mut client).await;
        assert_eq!(response.matches("HTTP/1.1 200 OK").count(), 3);
        assert_eq!(response.matches("connection: keep-alive").count(), 2);
        assert!(response.contains("hello a"));
        assert!(!response.contains("hello b"));
        assert!(response.ends_with("hello c"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_request_is_answered_and_closed() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        client.write_all(b"GET  / HTTP/1.1\r\n\r\n").await.unwrap();

        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.contains("content-type: text/html; charset=utf-8\r\n"));
        assert!(response.contains("Invalid whitespace between Method and Request Target"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_version() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        client.write_all(b"GET / HTTP/2.0\r\n\r\n").await.unwrap();

        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 426 Upgrade Required\r\n"));
        assert!(response.contains("upgrade: HTTP/1.1\r\n"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        client.write_all(b"BREW /pot HTTP/1.1\r\n\r\n").await.unwrap();

        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 501 Not Implemented\r\n"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unterminated_head_gets_timeout() {
        let limits = Limits { read_timeout: Duration::from_secs(5), ..Limits::default() };
        let (mut client, handle) = spawn_connection(limits, Duration::from_secs(5), CancellationToken::new());
        client.write_all(b"GET / HTTP/1.1\r\nHost: a\r\n").await.unwrap();

        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
        assert!(response.contains("connection: close\r\n"));

        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_connection_closes_silently() {
        let (mut client, handle) = spawn_connection(Limits::default(), Duration::from_secs(5), CancellationToken::new());

        let response = read_all(&mut client).await;
        assert!(response.is_empty());
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connection() {
        let shutdown = CancellationToken::new();
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, shutdown.clone());

        client.write_all(b"GET /x HTTP/1.1\r\n\r\n").await.unwrap();
        let mut buf = vec![0; 1024];
        let n = client.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_peer_closing_mid_request_is_an_error() {
        let (mut client, handle) = spawn_connection(Limits::default(), DEFAULT_IDLE_TIMEOUT, CancellationToken::new());
        client.write_all(b"GET / HTTP/1.1\r\nHo").await.unwrap();
        client.shutdown().await.unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::ConnectionClosed })));
    }

    #[tokio::test]
    async fn test_handler_may_close() {
        let (client, server) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server);
        let handler = make_handler(|request: &mut Request| {
            let mut response = Response::for_request(request);
            response.set_status(StatusCode::ACCEPTED);
            response.insert_header(CONNECTION, HeaderValue::from_static("close"));
            response
        });
        let handle = tokio::spawn(HttpConnection::new(reader, writer).process(Arc::new(handler), CancellationToken::new()));

        let mut client = client;
        client.write_all(b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi").await.unwrap();
        let response = read_all(&mut client).await;
        assert!(response.starts_with("HTTP/1.1 202 Accepted\r\n"));
        assert!(response.contains("connection: close\r\n"));
        handle.await.unwrap().unwrap();
    }
}
