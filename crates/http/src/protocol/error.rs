use std::error::Error;
use std::io;
use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Top-level error of a single connection.
///
/// Nothing in here ever reaches the acceptor as a failure of the server: the
/// connection task logs it and the connection is closed.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("timed out after {elapsed:?} waiting for {phase}")]
    Timeout { phase: TimeoutPhase, elapsed: Duration },
}

impl HttpError {
    pub fn timeout(phase: TimeoutPhase, elapsed: Duration) -> Self {
        Self::Timeout { phase, elapsed }
    }
}

/// Which wait a [`HttpError::Timeout`] interrupted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// Reading a complete request, headers and body.
    Request,
    /// Waiting for the next request on an idle keep-alive connection.
    KeepAlive,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPhase::Request => f.write_str("request"),
            TimeoutPhase::KeepAlive => f.write_str("keep-alive"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported transfer-encoding: {value}")]
    UnsupportedTransferEncoding { value: String },

    #[error("body size {size} exceed the limit {max_size}")]
    TooLargeBody { size: u64, max_size: u64 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(value: S) -> Self {
        Self::UnsupportedTransferEncoding { value: value.to_string() }
    }

    pub fn too_large_body(size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { size, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The status of the best-effort response sent before closing, `None` when the
    /// peer is gone and nothing can be written.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ParseError::Io { .. } => None,
            ParseError::TooLargeBody { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            ParseError::TooLargeHeader { .. } | ParseError::TooManyHeaders { .. } => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            ParseError::UnsupportedTransferEncoding { .. } => Some(StatusCode::NOT_IMPLEMENTED),
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// The error side of a handler invocation.
///
/// This is translated into a response in exactly one place, the connection loop.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A typed failure carrying the status the client should see.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Anything else. The client only sees a generic 500, the source goes to the log.
    #[error("unhandled handler error: {source}")]
    Unhandled { source: Box<dyn Error + Send + Sync> },
}

impl HandlerError {
    pub fn status<S: ToString>(status: StatusCode, message: S) -> Self {
        Self::Status { status, message: message.to_string() }
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn bad_request<S: ToString>(message: S) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    pub fn unhandled<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::Unhandled { source: e.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            HandlerError::Unhandled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<io::Error> for HandlerError {
    fn from(e: io::Error) -> Self {
        Self::unhandled(e)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::unhandled(e)
    }
}

impl From<CollaboratorError> for HandlerError {
    fn from(e: CollaboratorError) -> Self {
        Self::unhandled(e)
    }
}

impl From<Box<dyn Error + Send + Sync>> for HandlerError {
    fn from(source: Box<dyn Error + Send + Sync>) -> Self {
        Self::Unhandled { source }
    }
}

/// Failure of a request-reachable collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{0} is not injected into this server")]
    NotInjected(&'static str),

    #[error("template '{name}' failed to render: {reason}")]
    Render { name: String, reason: String },

    #[error("task submission rejected: {reason}")]
    Rejected { reason: String },
}

impl CollaboratorError {
    pub fn render<N: ToString, S: ToString>(name: N, reason: S) -> Self {
        Self::Render { name: name.to_string(), reason: reason.to_string() }
    }

    pub fn rejected<S: ToString>(reason: S) -> Self {
        Self::Rejected { reason: reason.to_string() }
    }
}
