//! Routing, middleware and the acceptor of the nimble embeddable HTTP/1.1 server
//!
//! `nimble-web` sits on top of `nimble-http`: it resolves each parsed request
//! to a handler through a segment trie, runs it inside its middleware chain and
//! serves connections from a TCP listener with a bound on how many are handled
//! at once.
//!
//! # Example
//!
//! ```no_run
//! use nimble_web::router::Router;
//! use nimble_web::{Handler, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .get("/", Handler::blocking(|_req, _params| "hello world"))
//!         .get("/users/:id", Handler::suspending(|_req, params| async move {
//!             serde_json::json!({ "id": params.get("id") })
//!         }))
//!         .build()
//!         .expect("routes should not conflict");
//!
//!     let server = Server::builder()
//!         .router(router)
//!         .config(ServerConfig::default().with_address("127.0.0.1", 8080))
//!         .build()
//!         .expect("server should be configured");
//!
//!     server.start().await.expect("server should bind");
//! }
//! ```

mod config;
mod handler;
mod responder;
mod server;

pub mod middleware;
pub mod router;

pub use config::ConfigError;
pub use config::ServerConfig;
pub use handler::Handler;
pub use handler::HandlerResult;
pub use responder::IntoResponse;
pub use router::PathParams;
pub use router::RouteError;
pub use router::Router;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::ServerError;
pub use server::ShutdownHandle;

pub use nimble_http::protocol::{Body, CollaboratorError, HandlerError, Request, Response};
