//! The protocol core of the nimble embeddable HTTP/1.1 server
//!
//! This crate parses requests off a byte stream, hands them to a
//! [`handler::Dispatcher`] and writes the responses back, looping on kept-alive
//! connections. Routing, middleware and the listening socket live in
//! `nimble-web`; this crate only knows about one connection at a time.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nimble_http::connection::HttpConnection;
//! use nimble_http::handler::dispatcher_fn;
//! use nimble_http::protocol::{HandlerError, Request, Response};
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let dispatcher = Arc::new(dispatcher_fn(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let dispatcher = dispatcher.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             match connection.process(dispatcher).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, HandlerError> {
//!     info!("request path {}", request.path());
//!     Ok(Response::text("Hello World!\r\n"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request/response value objects, collaborators and errors
//! - [`codec`]: wire decoding of requests and encoding of responses
//! - [`connection`]: the per-connection protocol loop and its timeouts
//! - [`handler`]: the [`handler::Dispatcher`] seam
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, no TLS
//! - `Content-Length` bodies only, chunked transfer encoding is rejected
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
