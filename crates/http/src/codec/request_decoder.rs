//! HTTP request decoder module
//!
//! Decodes whole requests, head and body, off a byte stream. Pipelined
//! requests are decoded one after another from the same buffer.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::body::{LengthDecoder, PayloadSize};
use crate::codec::header::HeaderDecoder;
use crate::ensure;
use crate::protocol::{ParseError, Request, RequestHead};

/// Default upper bound for a request body, 1 MiB.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 1024 * 1024;

/// A decoder for HTTP requests that handles both head and body
///
/// # State Machine
///
/// The decoder keeps its state in the `pending` field:
/// - `None`: parsing the request line and headers
/// - `Some((head, decoder))`: the head is parsed, waiting for the body
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    pending: Option<(RequestHead, LengthDecoder)>,
    max_body_size: u64,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_body_size(max_body_size: u64) -> Self {
        Self { max_body_size, ..Self::default() }
    }

    /// Returns true once a head has been decoded and its body is still incomplete.
    #[inline]
    pub fn is_decoding_body(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder, pending: None, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// - `Ok(Some(request))`: a complete request was consumed from `src`
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the stream is not a valid request, the connection can't be reused
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_none() {
            match self.header_decoder.decode(src)? {
                None => return Ok(None),
                Some((head, PayloadSize::Empty)) => return Ok(Some(Request::from_parts(head, Bytes::new()))),
                Some((head, PayloadSize::Length(length))) => {
                    ensure!(length <= self.max_body_size, ParseError::too_large_body(length, self.max_body_size));
                    let length = usize::try_from(length).map_err(ParseError::invalid_content_length)?;
                    self.pending = Some((head, LengthDecoder::new(length)));
                }
            }
        }

        let body = match &mut self.pending {
            Some((_, body_decoder)) => body_decoder.decode(src)?,
            None => return Ok(None),
        };

        Ok(body.and_then(|body| self.pending.take().map(|(head, _)| Request::from_parts(head, body))))
    }
}
