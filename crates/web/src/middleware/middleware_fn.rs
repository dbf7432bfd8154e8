use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use nimble_http::protocol::Request;

use crate::handler::{Handler, HandlerResult};
use crate::middleware::Middleware;
use crate::PathParams;

/// The rest of the chain, as seen from inside a [`middleware_fn`].
#[derive(Debug, Clone)]
pub struct Next {
    handler: Handler,
}

impl Next {
    /// Runs the inner handler; a middleware may skip this to short-circuit.
    pub async fn run(self, request: Request, params: PathParams) -> HandlerResult {
        self.handler.call(request, params).await
    }
}

#[derive(Debug)]
pub struct MiddlewareFn<F> {
    f: Arc<F>,
}

/// Builds an around-middleware from an async function.
///
/// ```
/// use nimble_web::middleware::{middleware_fn, Next};
/// use nimble_web::{HandlerResult, PathParams};
/// use nimble_http::protocol::Request;
/// use http::{HeaderName, HeaderValue};
///
/// let powered_by = middleware_fn(|req: Request, params: PathParams, next: Next| async move {
///     let result: HandlerResult = next.run(req, params).await;
///     result.map(|response| response.with_header(HeaderName::from_static("x-powered-by"), HeaderValue::from_static("nimble")))
/// });
/// ```
pub fn middleware_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(Request, PathParams, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    MiddlewareFn { f: Arc::new(f) }
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(Request, PathParams, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        let f = Arc::clone(&self.f);
        Handler::Suspending(Arc::new(move |request: Request, params: PathParams| {
            f(request, params, Next { handler: next.clone() }).boxed()
        }))
    }
}
