//! An HTTP/1.1 server built on `frederick-http`.
//!
//! Requests are routed through a tree of [`Resource`]s, one node per path segment. A node
//! is either static (matched by name), dynamic (matches any segment and binds it as a path
//! parameter) or a filesystem node (collects the remaining segments as a relative file
//! path). Each node maps methods to [`RequestHandler`]s.
//!
//! ```no_run
//! use frederick_http::protocol::{Method, Request, Response};
//! use frederick_server::{Resource, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut root = Resource::root();
//!     root.add_route("/hello/:name")?.add_handler(Method::Get, |request: &Request, response: &mut Response| {
//!         response.set_content(format!("Hello {}!", request.path_param("name").unwrap_or("world")));
//!     });
//!
//!     let handle = Server::builder().port(8080).resource_tree(root).build()?.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! Responses that no handler produced:
//! - `404 Not Found` when no resource matches the path
//! - `400 Bad Request` for a `.`, `..` or `/`-containing segment below a filesystem node
//! - `405 Method Not Allowed`, with an `Allow` header, when the resource has no handler for
//!   the method
//! - `426 Upgrade Required` for any version other than HTTP/1.1
//! - the parse failure's status (400, 408, 413, 431, 501, ...) for malformed requests

mod config;
pub mod resource;
pub mod router;
mod server;

pub use config::ServerConfig;
pub use resource::{RequestHandler, Resource, ResourceError, ResourceKind};
pub use server::{Server, ServerBuilder, ServerError, ServerHandle};
