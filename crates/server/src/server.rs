use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use frederick_http::connection::HttpConnection;
use frederick_http::handler::Handler;
use frederick_http::protocol::{Request, Response};
use http::header::ALLOW;
use http::{HeaderValue, StatusCode};
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::select;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::resource::Resource;
use crate::router;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("resource tree must be set")]
    MissingResourceTree,

    #[error("invalid bind address {address}, expected an IP address")]
    InvalidAddress { address: String },

    #[error("failed to listen on {address}: {source}")]
    Listen {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {source}")]
    Config {
        #[from]
        source: serde_json::Error,
    },

    #[error("server task failed: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
}

#[derive(Debug)]
pub struct ServerBuilder {
    config: ServerConfig,
    resource_tree: Option<Resource>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default(), resource_tree: None }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.backlog = backlog;
        self
    }

    pub fn idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.idle_timeout_secs = secs;
        self
    }

    pub fn max_line_size(mut self, max_line_size: usize) -> Self {
        self.config.max_line_size = max_line_size;
        self
    }

    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.config.max_headers = max_headers;
        self
    }

    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.max_body_size = max_body_size;
        self
    }

    pub fn resource_tree(mut self, root: Resource) -> Self {
        self.resource_tree = Some(root);
        self
    }

    pub fn build(self) -> Result<Server, ServerError> {
        let root = self.resource_tree.ok_or(ServerError::MissingResourceTree)?;
        Ok(Server { config: self.config, root })
    }
}

/// An HTTP/1.1 server dispatching requests through a [`Resource`] tree.
///
/// The tree is fixed once the server is built; it is shared read-only by every connection.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    root: Resource,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the listening socket and spawns the accept loop.
    ///
    /// Must be called within a tokio runtime. The returned handle stops the server.
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let address = self.config.socket_addr()?;
        let listener = bind(address, self.config.backlog).map_err(|source| ServerError::Listen { address, source })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Listen { address, source })?;
        info!(%local_addr, backlog = self.config.backlog, "start listening");

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(Arc::new(self).serve(listener, shutdown.clone()));
        Ok(ServerHandle { local_addr, shutdown, task })
    }

    async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) {
        let mut connections = JoinSet::new();

        loop {
            select! {
                biased;
                () = shutdown.cancelled() => break,
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(cause = %e, "connection task failed");
                    }
                }
                accepted = listener.accept() => {
                    let (tcp_stream, remote_addr) = match accepted {
                        Ok(stream_and_addr) => stream_and_addr,
                        Err(e) => {
                            warn!(cause = %e, "failed to accept");
                            continue;
                        }
                    };
                    debug!(%remote_addr, "accepted connection");

                    let limits = self.config.limits();
                    let idle_timeout = self.config.idle_timeout();
                    let server = Arc::clone(&self);
                    let shutdown = shutdown.clone();
                    connections.spawn(async move {
                        let (reader, writer) = tcp_stream.into_split();
                        let connection = HttpConnection::with_limits(reader, writer, limits, idle_timeout);
                        match connection.process(server, shutdown).await {
                            Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                            Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                        }
                    });
                }
            }
        }

        drop(listener);
        info!(open_connections = connections.len(), "stop accepting, waiting for open connections");
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!(cause = %e, "connection task failed");
            }
        }
        info!("server stopped");
    }
}

fn bind(address: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = if address.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    socket.set_reuseaddr(true)?;
    socket.bind(address)?;
    socket.listen(backlog)
}

impl Handler for Server {
    fn handle(&self, request: &mut Request) -> Response {
        if request.version().minor != 1 {
            return Response::upgrade_required("Server is only conformant to HTTP/1.1");
        }

        let resource = match router::locate(&self.root, request) {
            Ok(resource) => resource,
            Err(e) => return Response::error(e.status(), e.to_string()),
        };

        let Some(handler) = resource.handler(request.method()) else {
            let mut response = Response::error(StatusCode::METHOD_NOT_ALLOWED, "Target resource does not support method");
            if let Ok(allow) = HeaderValue::from_str(&resource.method_list()) {
                response.insert_header(ALLOW, allow);
            }
            return response;
        };

        let mut response = Response::for_request(request);
        handler.invoke(request, &mut response);
        response
    }
}

/// A running server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address; with port `0` this carries the port the system picked.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits until every open connection has finished the
    /// request it is serving.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.cancel();
        Ok(self.task.await?)
    }

    /// Waits until the server stops, i.e. until the token from
    /// [`ServerHandle::shutdown_token`] is cancelled and open connections have finished.
    pub async fn wait(self) -> Result<(), ServerError> {
        Ok(self.task.await?)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
