//! Request line and header block decoding.
//!
//! [`HeaderDecoder`] turns the bytes up to the blank line into a
//! [`RequestHead`](crate::protocol::RequestHead) and tells the caller how many
//! body bytes follow.

mod header_decoder;

pub use header_decoder::HeaderDecoder;
