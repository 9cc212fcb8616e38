//! An asynchronous HTTP/1.1 protocol core.
//!
//! This crate turns a byte stream into parsed, validated requests and turns handler responses
//! back into correctly framed bytes. It does not bind sockets or route requests; the
//! `frederick-server` crate builds on top of it for that.
//!
//! # Features
//!
//! - Incremental parsing: requests may arrive split across any number of reads
//! - Request-target decoding into host, port, path segments, query map and fragments
//! - `Content-Length` and chunked request bodies, with chunk extensions and trailers
//! - Automatic response framing: `Content-Length` for small bodies, chunked beyond
//!   [`protocol::CHUNK_SIZE`] bytes
//! - Keep-alive connections with idle and read timeouts
//! - Malformed requests answered with the matching status code and an HTML error page
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//! use tracing::{error, info, warn};
//! use frederick_http::connection::HttpConnection;
//! use frederick_http::handler::make_handler;
//! use frederick_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!     let shutdown = CancellationToken::new();
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         let shutdown = shutdown.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             match connection.process(handler, shutdown).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! fn hello_world(request: &mut Request) -> Response {
//!     let mut response = Response::for_request(request);
//!     response.set_content("Hello World!\r\n");
//!     response
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the per-connection request/response loop
//! - [`protocol`]: request, response, URI and error types
//! - [`codec`]: the parsers and encoders behind them
//! - [`handler`]: the trait a connection calls for every well-formed request
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: why a request was rejected, mapped to a status code
//! - [`protocol::SendError`]: a response that could not be serialised
//! - [`protocol::HttpError`]: what ends a connection abnormally
//!
//! # Limitations
//!
//! - HTTP/1.1 only; requests for other versions get `426 Upgrade Required`
//! - Bodies are buffered in memory, bounded by [`protocol::Limits::max_body_size`]
//! - No TLS; pass an already decrypted stream to [`connection::HttpConnection`]

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
pub use utils::{fold_case, percent_decode};
