//! Application handlers as a tagged variant.
//!
//! Whether a handler blocks or suspends is decided once, when it is created,
//! and kept in the tag. Dispatch switches on the tag instead of inspecting the
//! callable.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use nimble_http::protocol::{HandlerError, Request, Response};

use crate::responder::IntoResponse;
use crate::PathParams;

/// What every handler and middleware layer eventually produces.
pub type HandlerResult = Result<Response, HandlerError>;

type BlockingFn = dyn Fn(Request, PathParams) -> HandlerResult + Send + Sync;
type SuspendingFn = dyn Fn(Request, PathParams) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A request handler, cheap to clone.
///
/// `Blocking` handlers run to completion inline on the connection task, so they
/// must not perform blocking I/O. `Suspending` handlers are awaited.
#[derive(Clone)]
pub enum Handler {
    Blocking(Arc<BlockingFn>),
    Suspending(Arc<SuspendingFn>),
}

impl Handler {
    /// Wraps a synchronous function.
    ///
    /// ```
    /// use nimble_web::Handler;
    ///
    /// let handler = Handler::blocking(|_req, params| format!("user {}", params.get("id").unwrap_or("?")));
    /// assert!(!handler.is_suspending());
    /// ```
    pub fn blocking<F, R>(f: F) -> Self
    where
        F: Fn(Request, PathParams) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        Handler::Blocking(Arc::new(move |request: Request, params: PathParams| f(request, params).into_response()))
    }

    /// Wraps an async function.
    ///
    /// ```
    /// use nimble_web::Handler;
    ///
    /// let handler = Handler::suspending(|req, _params| async move { req.path().to_owned() });
    /// assert!(handler.is_suspending());
    /// ```
    pub fn suspending<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Handler::Suspending(Arc::new(move |request: Request, params: PathParams| {
            let fut = f(request, params);
            async move { fut.await.into_response() }.boxed()
        }))
    }

    pub fn is_suspending(&self) -> bool {
        matches!(self, Handler::Suspending(_))
    }

    /// Invokes the handler, awaiting it only if it suspends.
    pub async fn call(&self, request: Request, params: PathParams) -> HandlerResult {
        match self {
            Handler::Blocking(f) => f(request, params),
            Handler::Suspending(f) => f(request, params).await,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Blocking(_) => f.write_str("Handler::Blocking"),
            Handler::Suspending(_) => f.write_str("Handler::Suspending"),
        }
    }
}
