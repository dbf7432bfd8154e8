//! Request routing.
//!
//! Routes are collected on a [`RouterBuilder`] and frozen into an immutable
//! [`Router`] by [`RouterBuilder::build`]. Building composes each handler with
//! its middlewares exactly once; the frozen router is shared by every
//! connection without locking.
//!
//! ```
//! use nimble_web::router::Router;
//! use nimble_web::middleware::MiddlewareChain;
//! use nimble_web::Handler;
//! use http::Method;
//!
//! let router = Router::builder()
//!     .get("/", Handler::blocking(|_req, _params| "index"))
//!     .group("/api", MiddlewareChain::new(), |api| {
//!         api.get("/users/:id", Handler::suspending(|_req, params| async move {
//!             format!("user {}", params.get("id").unwrap_or_default())
//!         }))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let resolved = router.resolve(&Method::GET, "/api/users/42").unwrap();
//! assert_eq!(resolved.params().get("id"), Some("42"));
//! assert!(resolved.is_suspending());
//! ```

mod params;
mod trie;

use http::Method;
use nimble_http::protocol::Request;
use thiserror::Error;
use tracing::debug;

use crate::handler::{Handler, HandlerResult};
use crate::middleware::{Middleware, MiddlewareChain};
pub use params::PathParams;
use trie::TrieNode;

/// Rejected route registrations, reported by [`RouterBuilder::build`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("dynamic segment `:{requested}` in `{path}` conflicts with `:{existing}` registered at the same position")]
    ConflictingParam { path: String, existing: String, requested: String },

    #[error("route `{method} {path}` is registered twice")]
    DuplicateRoute { method: Method, path: String },

    #[error("dynamic segment without a name in `{path}`")]
    EmptyParamName { path: String },
}

/// A composed handler as stored in the trie.
#[derive(Debug, Clone)]
struct RouteRecord {
    handler: Handler,
    is_suspending: bool,
}

/// The immutable routing table.
#[derive(Debug)]
pub struct Router {
    root: TrieNode<RouteRecord>,
}

/// A successful lookup: the composed handler and the bound path parameters.
#[derive(Debug)]
pub struct Resolved<'router> {
    handler: &'router Handler,
    params: PathParams,
    is_suspending: bool,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Looks up `(method, path)`; `None` is answered with `404` by the server.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<Resolved<'_>> {
        self.root.resolve(method, path).map(|(record, params)| Resolved {
            handler: &record.handler,
            params,
            is_suspending: record.is_suspending,
        })
    }

    /// Number of registered `(method, path)` pairs.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'router> Resolved<'router> {
    /// The handler wrapped in all of its middlewares.
    pub fn handler(&self) -> &'router Handler {
        self.handler
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Whether the raw handler, before any middleware, was suspending.
    pub fn is_suspending(&self) -> bool {
        self.is_suspending
    }

    /// Runs the handler with the bound parameters.
    pub async fn call(self, request: Request) -> HandlerResult {
        self.handler.call(request, self.params).await
    }
}

/// A route waiting to be composed and inserted.
#[derive(Debug)]
struct RouteDef {
    path: String,
    methods: Vec<Method>,
    handler: Handler,
    middlewares: MiddlewareChain,
}

macro_rules! method_routes {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers `handler` for `", stringify!($method), " path`.")]
            pub fn $name(self, path: &str, handler: Handler) -> Self {
                self.register(path, handler, &[Method::$method], MiddlewareChain::new())
            }
        )*

        /// Registers `handler` for several methods at once.
        pub fn route(self, path: &str, methods: &[Method], handler: Handler) -> Self {
            self.register(path, handler, methods, MiddlewareChain::new())
        }
    };
}

/// Collects routes and global middlewares.
///
/// Registration never fails on its own, conflicts are reported by
/// [`build`](RouterBuilder::build).
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<RouteDef>,
    global_middlewares: MiddlewareChain,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every method in `methods`, wrapped in `middlewares`.
    pub fn register(mut self, path: &str, handler: Handler, methods: &[Method], middlewares: MiddlewareChain) -> Self {
        self.routes.push(RouteDef { path: path.to_owned(), methods: methods.to_vec(), handler, middlewares });
        self
    }

    method_routes! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// Adds a middleware applied around every route, outside the route's own middlewares.
    pub fn with_global_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.global_middlewares.push(middleware);
        self
    }

    /// Registers the routes added by `f` under `prefix`, with `middlewares` in
    /// front of each route's own middlewares.
    pub fn group<F>(mut self, prefix: &str, middlewares: MiddlewareChain, f: F) -> Self
    where
        F: FnOnce(RouteGroup) -> RouteGroup,
    {
        let group = f(RouteGroup::new(prefix, middlewares));
        self.routes.extend(group.routes);
        self
    }

    /// Composes every handler with its middlewares and freezes the routing table.
    pub fn build(self) -> Result<Router, RouteError> {
        let mut root = TrieNode::default();

        for route in self.routes {
            let is_suspending = route.handler.is_suspending();
            let handler = self.global_middlewares.compose(route.middlewares.compose(route.handler));
            root.insert(&route.path, &route.methods, RouteRecord { handler, is_suspending })?;
        }

        let router = Router { root };
        debug!(routes = router.len(), global_middlewares = self.global_middlewares.len(), "router built");
        Ok(router)
    }
}

/// Routes sharing a path prefix and a list of middlewares.
///
/// Registering through a group is the same as registering on the parent with
/// the prefix prepended and the group middlewares in front of the route's own.
#[derive(Debug)]
pub struct RouteGroup {
    prefix: String,
    middlewares: MiddlewareChain,
    routes: Vec<RouteDef>,
}

impl RouteGroup {
    fn new(prefix: &str, middlewares: MiddlewareChain) -> Self {
        Self { prefix: prefix.to_owned(), middlewares, routes: Vec::new() }
    }

    pub fn register(mut self, path: &str, handler: Handler, methods: &[Method], middlewares: MiddlewareChain) -> Self {
        self.routes.push(RouteDef {
            path: format!("{}/{}", self.prefix, path),
            methods: methods.to_vec(),
            handler,
            middlewares: self.middlewares.concat(&middlewares),
        });
        self
    }

    method_routes! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// A nested group, its prefix and middlewares come after this group's.
    pub fn group<F>(mut self, prefix: &str, middlewares: MiddlewareChain, f: F) -> Self
    where
        F: FnOnce(RouteGroup) -> RouteGroup,
    {
        let nested = RouteGroup::new(&format!("{}/{}", self.prefix, prefix), self.middlewares.concat(&middlewares));
        self.routes.extend(f(nested).routes);
        self
    }
}
