//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - [`RequestDecoder`]: request line, headers and `Content-Length` body into a
//!   [`Request`](crate::protocol::Request)
//! - [`ResponseEncoder`]: a [`Response`](crate::protocol::Response) into wire bytes
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use nimble_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET /users/42 HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.path(), "/users/42");
//! ```

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use body::PayloadSize;
pub use header::HeaderDecoder;
pub use request_decoder::RequestDecoder;
pub use request_decoder::DEFAULT_MAX_BODY_SIZE;
pub use response_encoder::ResponseEncoder;
