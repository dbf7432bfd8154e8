//! HTTP connection handling module
//!
//! - [`HttpConnection`]: the per-connection protocol loop. It reads one request
//!   at a time off the stream, hands it to a
//!   [`Dispatcher`](crate::handler::Dispatcher), writes the response and loops
//!   while the connection is kept alive.
//! - [`ConnectionConfig`]: buffer size, body limit and the two timeouts.
//!
//! The connection is the error boundary: parse failures, handler errors, panics
//! and timeouts are turned into responses (or a silent close) here and never
//! reach the acceptor.

mod config;
mod http_connection;

pub use config::ConnectionConfig;
pub use http_connection::HttpConnection;
