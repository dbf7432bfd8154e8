//! HTTP header decoder implementation for parsing HTTP request heads
//!
//! The request line (`METHOD SP TARGET SP VERSION`) and the header lines are
//! parsed with `httparse`. A header line without a `name: value` shape is a
//! fatal parse error, as are folded (continuation) header lines.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1
//! - Only `Content-Length` bodies, any `Transfer-Encoding` is rejected

use bytes::{Buf, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadSize;
use crate::ensure;
use crate::protocol::{parse_method, ParseError, RequestHead};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for the head of an HTTP request.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    /// Returns `Ok(None)` until a complete head is buffered, then consumes exactly
    /// the head from `src` and leaves the body bytes in place.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(head_size = body_offset, "parsed request head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let method = parse_method(req.method.ok_or(ParseError::InvalidMethod)?)?;
                let target = req.path.ok_or(ParseError::InvalidUri)?;

                let version = match req.version {
                    Some(0) => Version::HTTP_10,
                    Some(1) => Version::HTTP_11,
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let mut header_map = HeaderMap::with_capacity(req.headers.len());
                for header in req.headers.iter() {
                    let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_header)?;
                    let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_header)?;
                    header_map.append(name, value);
                }

                let head = RequestHead::new(method, target, version, header_map);
                let payload_size = parse_payload(&head)?;

                src.advance(body_offset);
                Ok(Some((head, payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Determines the payload size from the Content-Length header.
///
/// Repeated Content-Length headers must agree, see
/// <https://www.rfc-editor.org/rfc/rfc9112.html#name-content-length>.
fn parse_payload(head: &RequestHead) -> Result<PayloadSize, ParseError> {
    if let Some(te_value) = head.headers().get(TRANSFER_ENCODING) {
        return Err(ParseError::unsupported_transfer_encoding(te_value.to_str().unwrap_or("<opaque>")));
    }

    let mut length = None;
    for cl_value in head.headers().get_all(CONTENT_LENGTH) {
        let cl_str = cl_value.to_str().map_err(|_e| ParseError::invalid_content_length("value can't to_str"))?;
        let current =
            cl_str.trim().parse::<u64>().map_err(|_e| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

        match length {
            Some(previous) if previous != current => {
                return Err(ParseError::invalid_content_length(format!("conflicting values {previous} and {current}")));
            }
            _ => length = Some(current),
        }
    }

    Ok(match length {
        None | Some(0) => PayloadSize::Empty,
        Some(length) => PayloadSize::Length(length),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use indoc::indoc;

    #[test]
    fn test_bytes_mut_lens() {
        let str = indoc! {r##"
        POST /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 3

        123"##};

        let mut bytes = BytesMut::from(str);

        let (_, payload_size) = HeaderDecoder.decode(&mut bytes).unwrap().unwrap();

        assert_eq!(payload_size, PayloadSize::Length(3));
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html?lang=en HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let (header, payload_size) = HeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());
        assert!(buf.is_empty());

        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.path(), "/index.html");
        assert_eq!(header.query(), Some("lang=en"));

        assert_eq!(header.headers().len(), 3);
        assert_eq!(header.headers().get(http::header::ACCEPT), Some(&HeaderValue::from_static("*/*")));
        assert_eq!(header.headers().get("host"), Some(&HeaderValue::from_static("127.0.0.1:8080")));
        assert_eq!(header.headers().get(http::header::USER_AGENT), Some(&HeaderValue::from_static("curl/7.79.1")));
    }

    #[test]
    fn partial_head() {
        let raw = "GET / HTTP/1.1\r\nHost: a\r\n";
        let mut buf = BytesMut::from(raw);
        assert!(HeaderDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), raw.len());
    }

    #[test]
    fn header_without_separator() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost localhost\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn unknown_method() {
        let mut buf = BytesMut::from("BREW /pot HTTP/1.1\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidMethod)));
    }

    #[test]
    fn chunked_is_rejected() {
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::UnsupportedTransferEncoding { .. })));
    }

    #[test]
    fn conflicting_content_length() {
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidContentLength { .. })));

        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn too_large_head() {
        let mut raw = String::from("GET / HTTP/1.1\r\nX-Padding: ");
        raw.push_str(&"a".repeat(MAX_HEADER_BYTES));

        let mut buf = BytesMut::from(raw.as_str());
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn http_10() {
        let mut buf = BytesMut::from("GET / HTTP/1.0\r\n\r\n");
        let (header, _) = HeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.version(), Version::HTTP_10);
        assert!(!header.is_keep_alive());
    }
}
