//! HTTP response value object and its wire serialization.
//!
//! A [`Response`] is built by a handler (or by the connection loop for error
//! paths) and consumed once by the write path. Serialization never mutates the
//! response, so encoding it twice yields the same bytes.

use std::borrow::Cow;
use std::io;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use mime::Mime;
use serde_json::Value;

/// Initial buffer size reserved for the status line and headers
const INIT_HEADER_SIZE: usize = 512;

/// The payload of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured data, serialized as JSON on the wire.
    Json(Value),
    Text(String),
    Bytes(Bytes),
    Empty,
}

impl Body {
    /// The content type implied by the body when none is set explicitly.
    pub fn inferred_content_type(&self) -> Mime {
        match self {
            Body::Json(_) => mime::APPLICATION_JSON,
            Body::Text(text) if text.starts_with('<') => mime::TEXT_HTML,
            Body::Bytes(_) => mime::APPLICATION_OCTET_STREAM,
            Body::Text(_) | Body::Empty => mime::TEXT_PLAIN,
        }
    }

    /// The exact bytes written after the header block.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            // serializing a `Value` can't fail: its map keys are always strings
            Body::Json(value) => Bytes::from(serde_json::to_vec(value).unwrap_or_default()),
            Body::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            Body::Bytes(bytes) => bytes.clone(),
            Body::Empty => Bytes::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: Body,
    headers: HeaderMap,
    content_type: Option<HeaderValue>,
}

impl Response {
    pub fn new(body: Body) -> Self {
        Self { status: StatusCode::OK, body, headers: HeaderMap::new(), content_type: None }
    }

    pub fn json(value: impl Into<Value>) -> Self {
        Self::new(Body::Json(value.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Body::Text(text.into()))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Body::Bytes(bytes.into()))
    }

    pub fn empty() -> Self {
        Self::new(Body::Empty)
    }

    /// A response for `status` whose body is its canonical reason phrase.
    pub fn from_status(status: StatusCode) -> Self {
        Self::text(status.canonical_reason().unwrap_or_default()).with_status(status)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Overrides the content type inferred from the body.
    #[must_use]
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_bytes(&self) -> Bytes {
        self.body.to_bytes()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The content type that will be written: the override, then an explicit
    /// `Content-Type` header, then the body's inferred type.
    pub fn content_type(&self) -> Cow<'_, str> {
        let explicit = self.content_type.as_ref().or_else(|| self.headers.get(CONTENT_TYPE));
        match explicit.and_then(|value| value.to_str().ok()) {
            Some(content_type) => Cow::Borrowed(content_type),
            None => Cow::Owned(self.body.inferred_content_type().to_string()),
        }
    }

    /// Serializes the full message: status line, headers, blank line, body.
    pub fn serialize(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst);
        dst.freeze()
    }

    /// Appends the wire form of this response to `dst`.
    ///
    /// `content-type` and `content-length` are always written first and derived
    /// here; any user-supplied values for them are ignored.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let body = self.body.to_bytes();
        self.encode_head_into(dst, body.len());
        dst.put_slice(&body);
    }

    /// Like [`encode_into`](Self::encode_into) without the body, as answered to `HEAD`.
    ///
    /// `content-length` still announces the length the body would have.
    pub fn encode_without_body_into(&self, dst: &mut BytesMut) {
        self.encode_head_into(dst, self.body.to_bytes().len());
    }

    fn encode_head_into(&self, dst: &mut BytesMut, body_len: usize) {
        dst.reserve(INIT_HEADER_SIZE + body_len);
        // unknown status codes get an empty reason phrase
        let reason = self.status.canonical_reason().unwrap_or_default();
        // writing into a BytesMut can't fail
        let _ = write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", self.status.as_str(), reason);

        put_header(dst, CONTENT_TYPE.as_str(), self.content_type().as_bytes());
        let _ = write!(FastWrite(dst), "{}: {}\r\n", CONTENT_LENGTH.as_str(), body_len);

        for (name, value) in &self.headers {
            if *name == CONTENT_TYPE || *name == CONTENT_LENGTH {
                continue;
            }
            put_header(dst, name.as_str(), value.as_bytes());
        }
        dst.put_slice(b"\r\n");
    }
}

/// A response to a `HEAD` request; only the status line and headers are written.
#[derive(Debug)]
pub struct HeadResponse(pub Response);

fn put_header(dst: &mut BytesMut, name: &str, value: &[u8]) {
    dst.put_slice(name.as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(response: &Response) -> String {
        String::from_utf8(response.serialize().to_vec()).unwrap()
    }

    #[test]
    fn json_body() {
        let response = Response::json(json!({"a": 1}));
        let bytes = response.serialize();

        assert_eq!(
            wire(&response),
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 7\r\n\r\n{\"a\":1}"
        );
        assert_eq!(&bytes[bytes.len() - 7..], br#"{"a":1}"#);
        // idempotent
        assert_eq!(response.serialize(), bytes);
    }

    #[test]
    fn inferred_content_types() {
        assert_eq!(Response::json(json!([1, 2])).content_type(), "application/json");
        assert_eq!(Response::text("<h1>hi</h1>").content_type(), "text/html");
        assert_eq!(Response::text("hi <b>").content_type(), "text/plain");
        assert_eq!(Response::bytes(vec![0u8, 1, 2]).content_type(), "application/octet-stream");
        assert_eq!(Response::empty().content_type(), "text/plain");
    }

    #[test]
    fn content_type_override() {
        let response = Response::text("a,b").with_content_type(HeaderValue::from_static("text/csv"));
        assert_eq!(response.content_type(), "text/csv");

        let response = Response::text("x").with_header(CONTENT_TYPE, HeaderValue::from_static("text/x-custom"));
        assert!(wire(&response).starts_with("HTTP/1.1 200 OK\r\ncontent-type: text/x-custom\r\n"));
    }

    #[test]
    fn content_length_is_recomputed() {
        let response = Response::text("héllo").with_header(CONTENT_LENGTH, HeaderValue::from_static("999"));
        let wire = wire(&response);

        assert!(wire.contains("content-length: 6\r\n"));
        assert!(!wire.contains("999"));
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let response = Response::empty().with_status(StatusCode::from_u16(599).unwrap());
        assert!(wire(&response).starts_with("HTTP/1.1 599 \r\n"));
    }

    #[test]
    fn extra_headers_and_empty_body() {
        let response = Response::empty()
            .with_status(StatusCode::NO_CONTENT)
            .with_header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("42"));

        assert_eq!(
            wire(&response),
            "HTTP/1.1 204 No Content\r\ncontent-type: text/plain\r\ncontent-length: 0\r\nx-request-id: 42\r\n\r\n"
        );
    }

    #[test]
    fn head_keeps_content_length() {
        let response = Response::text("hello");
        let mut dst = BytesMut::new();
        response.encode_without_body_into(&mut dst);

        assert_eq!(
            String::from_utf8(dst.to_vec()).unwrap(),
            "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 5\r\n\r\n"
        );
    }

    #[test]
    fn status_response() {
        let response = Response::from_status(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), &Body::Text("Not Found".into()));
    }
}
