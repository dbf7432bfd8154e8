//! Decoder for request bodies delimited by the Content-Length header, as defined in
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::protocol::ParseError;

/// Buffers until the whole body is available, then yields it in one piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    length: usize,
}

impl LengthDecoder {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < self.length {
            src.reserve(self.length - src.len());
            return Ok(None);
        }

        Ok(Some(src.split_to(self.length).freeze()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"101234567890abcdef\r\n\r\n"[..]);

        let mut length_decoder = LengthDecoder::new(10);
        let bytes = length_decoder.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(&bytes[..], b"1012345678");
        assert_eq!(&buffer[..], b"90abcdef\r\n\r\n");
    }

    #[test]
    fn waits_for_whole_body() {
        let mut buffer = BytesMut::from(&b"12345"[..]);
        let mut length_decoder = LengthDecoder::new(8);

        assert!(length_decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.len(), 5);

        buffer.extend_from_slice(b"678GET");
        let bytes = length_decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&bytes[..], b"12345678");
        assert_eq!(&buffer[..], b"GET");
    }
}
