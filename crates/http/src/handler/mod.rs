//! The contract between a connection and whatever answers its requests.

use crate::protocol::{Request, Response};

/// Answers a successfully parsed request.
///
/// The connection only calls a handler for requests whose status is OK; malformed requests
/// are answered by the connection itself. The request is passed mutably so that routing can
/// record what it resolved, such as path parameters.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &mut Request) -> Response;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Request) -> Response + Send + Sync,
{
    fn handle(&self, request: &mut Request) -> Response {
        (self.f)(request)
    }
}

/// Wraps a closure as a [`Handler`].
pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Request) -> Response + Send + Sync,
{
    HandlerFn { f }
}
