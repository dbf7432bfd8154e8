//! Request body decoding.
//!
//! Only `Content-Length` delimited bodies are supported, chunked transfer
//! encoding is rejected while the headers are parsed.

mod length_decoder;

pub use length_decoder::LengthDecoder;

/// The size of a request payload as announced by its headers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// No payload
    Empty,
}

impl PayloadSize {
    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}
