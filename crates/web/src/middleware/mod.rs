//! Middleware composition.
//!
//! A middleware turns a [`Handler`] into another [`Handler`], usually one that
//! runs some code around the inner handler. Chains are composed once, when the
//! router is built, never per request.
//!
//! # Ordering
//!
//! [`MiddlewareChain::compose`] wraps the raw handler with the first middleware,
//! then wraps that result with the second one and so on, so the *last* pushed
//! middleware runs *first* at request time. The router composes the route chain
//! first and the global chain around it: with global middlewares `[A, B]` and
//! route middlewares `[C, D]` a request runs through
//! `B -> A -> D -> C -> handler -> C -> D -> A -> B`.

mod middleware_fn;

use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;

pub use middleware_fn::{middleware_fn, MiddlewareFn, Next};

/// Wraps a handler into a new one.
///
/// Implementations must keep the wrapped handler callable: a suspending inner
/// handler is still awaited through the returned one.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

impl<F> Middleware for F
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// An ordered list of middlewares.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.push(middleware);
        self
    }

    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// `self` followed by `other`, as used for group and route middlewares.
    #[must_use]
    pub fn concat(&self, other: &MiddlewareChain) -> Self {
        let mut middlewares = Vec::with_capacity(self.len() + other.len());
        middlewares.extend(self.middlewares.iter().cloned());
        middlewares.extend(other.middlewares.iter().cloned());
        Self { middlewares }
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Wraps `raw` with every middleware in registration order.
    pub fn compose(&self, raw: Handler) -> Handler {
        self.middlewares.iter().fold(raw, |handler, middleware| middleware.wrap(handler))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain").field("len", &self.len()).finish()
    }
}
