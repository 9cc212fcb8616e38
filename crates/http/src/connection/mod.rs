//! Connection handling.
//!
//! [`HttpConnection`] drives one client stream: it waits for a request, parses it, hands it
//! to a [`Handler`](crate::handler::Handler) (or answers it with an error page when parsing
//! failed), writes the framed response and then decides whether the connection stays open.

mod http_connection;

pub use http_connection::{DEFAULT_IDLE_TIMEOUT, HttpConnection};
