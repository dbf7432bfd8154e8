//! The seam between the protocol loop and whatever answers requests.
//!
//! [`HttpConnection`](crate::connection::HttpConnection) knows nothing about
//! routing; it hands every parsed [`Request`] to a [`Dispatcher`] and maps the
//! result to a response.

use std::future::Future;

use crate::protocol::{HandlerError, Request, Response};

/// Answers one request.
///
/// `Err` is mapped to a response by the connection: [`HandlerError::Status`] keeps
/// its status and message, everything else becomes a generic `500`.
#[trait_variant::make(Dispatcher: Send)]
pub trait LocalDispatcher {
    async fn dispatch(&self, request: Request) -> Result<Response, HandlerError>;
}

#[derive(Debug)]
pub struct DispatcherFn<F> {
    f: F,
}

impl<F, Fut> Dispatcher for DispatcherFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, HandlerError>> + Send,
{
    fn dispatch(&self, request: Request) -> impl Future<Output = Result<Response, HandlerError>> + Send {
        (self.f)(request)
    }
}

/// Wraps an async function as a [`Dispatcher`].
pub fn dispatcher_fn<F, Fut>(f: F) -> DispatcherFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Result<Response, HandlerError>>,
{
    DispatcherFn { f }
}
