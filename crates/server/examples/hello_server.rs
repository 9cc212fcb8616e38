use std::fs;

use frederick_http::protocol::{Method, Request, Response};
use frederick_server::{Resource, Server, ServerConfig};
use http::StatusCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path).expect("read config file");
            ServerConfig::from_json(&json).expect("parse config file")
        }
        None => ServerConfig::default(),
    };

    let server = match Server::builder().config(config).resource_tree(resource_tree()).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "build server error");
            return;
        }
    };

    let handle = match server.start() {
        Ok(handle) => handle,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };
    info!(address = %handle.local_addr(), "server started, press ctrl-c to stop");

    let shutdown = handle.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(cause = %e, "failed to listen for ctrl-c");
        }
        shutdown.cancel();
    });

    match handle.wait().await {
        Ok(()) => info!("server shutdown"),
        Err(e) => error!(cause = %e, "server shutdown with error"),
    }
}

fn resource_tree() -> Resource {
    let mut root = Resource::root();
    root.add_handler(Method::Get, |_request: &Request, response: &mut Response| {
        response.set_content_type(&mime::TEXT_PLAIN_UTF_8).expect("valid mime");
        response.set_content("Hello World!\r\n");
    });

    let hello = root.add_route("/hello/:name").expect("valid route");
    hello.add_handler(Method::Get, |request: &Request, response: &mut Response| {
        let name = request.path_param("name").unwrap_or("world");
        response.set_content(format!("Hello {name}!\r\n"));
    });

    let echo = root.add_route("/echo").expect("valid route");
    echo.add_handler(Method::Post, |request: &Request, response: &mut Response| {
        info!(len = request.content().len(), chunked = request.is_chunked(), "receiving request body");
        response.set_content(request.content().clone());
    });

    let files = root.add_route("/static/*files").expect("valid route");
    files.add_handler(Method::Get, |request: &Request, response: &mut Response| {
        // serving files is left to the application; report what would be served
        if request.file_path().is_empty() {
            response.set_status(StatusCode::FORBIDDEN);
        } else {
            response.set_content(format!("would serve {}\r\n", request.file_path()));
        }
    });

    root
}
