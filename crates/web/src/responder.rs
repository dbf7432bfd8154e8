//! Conversions from handler return values into responses.
//!
//! The [`IntoResponse`] trait lets handlers return plain values, the conversion
//! picks the body variant and with it the inferred content type.

use bytes::Bytes;
use http::StatusCode;
use nimble_http::protocol::{HandlerError, Response};
use serde_json::Value;

use crate::handler::HandlerResult;

/// A trait for types that can be converted into HTTP responses.
///
/// Types implementing this trait can be returned directly from request handlers.
pub trait IntoResponse {
    fn into_response(self) -> HandlerResult;
}

/// Implementation for Response allows passing through pre-built responses.
impl IntoResponse for Response {
    fn into_response(self) -> HandlerResult {
        Ok(self)
    }
}

/// `Err` values keep their status when they carry one, everything else is a 500.
impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Into<HandlerError>,
{
    fn into_response(self) -> HandlerResult {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => Err(e.into()),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> HandlerResult {
        Err(self)
    }
}

/// Implementation for (StatusCode, T) tuple allows setting a status code
/// along with the response content.
impl<T: IntoResponse> IntoResponse for (StatusCode, T) {
    fn into_response(self) -> HandlerResult {
        let (status, responder) = self;
        responder.into_response().map(|response| response.with_status(status))
    }
}

/// A bare status answers with its canonical reason phrase.
impl IntoResponse for StatusCode {
    fn into_response(self) -> HandlerResult {
        Ok(Response::from_status(self))
    }
}

impl IntoResponse for () {
    fn into_response(self) -> HandlerResult {
        Ok(Response::empty())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> HandlerResult {
        Ok(Response::text(self))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> HandlerResult {
        Ok(Response::text(self))
    }
}

impl IntoResponse for Value {
    fn into_response(self) -> HandlerResult {
        Ok(Response::json(self))
    }
}

impl IntoResponse for Bytes {
    fn into_response(self) -> HandlerResult {
        Ok(Response::bytes(self))
    }
}

impl IntoResponse for Vec<u8> {
    fn into_response(self) -> HandlerResult {
        Ok(Response::bytes(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimble_http::protocol::Body;
    use serde_json::json;
    use std::io;

    #[test]
    fn plain_values() {
        assert_eq!(().into_response().unwrap().body(), &Body::Empty);
        assert_eq!("hi".into_response().unwrap().content_type(), "text/plain");
        assert_eq!(String::from("<p>hi</p>").into_response().unwrap().content_type(), "text/html");
        assert_eq!(json!({"a": 1}).into_response().unwrap().content_type(), "application/json");
        assert_eq!(Bytes::from_static(b"\x00\x01").into_response().unwrap().content_type(), "application/octet-stream");
    }

    #[test]
    fn status_tuple() {
        let response = (StatusCode::CREATED, json!({"id": 1})).into_response().unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), &Body::Json(json!({"id": 1})));

        let response = StatusCode::ACCEPTED.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(&response.body_bytes()[..], b"Accepted");
    }

    #[test]
    fn results() {
        let ok: Result<&'static str, HandlerError> = Ok("fine");
        assert_eq!(ok.into_response().unwrap().status(), StatusCode::OK);

        let domain: Result<(), HandlerError> = Err(HandlerError::status(StatusCode::FORBIDDEN, "nope"));
        assert_eq!(domain.into_response().unwrap_err().status_code(), StatusCode::FORBIDDEN);

        let unhandled: Result<String, io::Error> = Err(io::Error::other("disk on fire"));
        assert_eq!(unhandled.into_response().unwrap_err().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
