use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use futures::{FutureExt, SinkExt};
use http::header::CONNECTION;
use http::{HeaderValue, Method, StatusCode};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::connection::ConnectionConfig;
use crate::handler::Dispatcher;
use crate::protocol::{Collaborators, HandlerError, HeadResponse, HttpError, ParseError, Request, Response, TimeoutPhase};

const CLOSE: HeaderValue = HeaderValue::from_static("close");

/// An HTTP connection that reads requests, dispatches them and writes responses
///
/// One connection runs the loop
/// `AwaitingRequestLine -> ParsingHeaders -> Dispatching -> WritingResponse`,
/// going back to `AwaitingRequestLine` while the client keeps the connection
/// alive. Pipelined requests are answered strictly in the order they arrived.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    read_buf: BytesMut,
    decoder: RequestDecoder,
    framed_write: FramedWrite<W, ResponseEncoder>,
    config: ConnectionConfig,
    collaborators: Collaborators,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ConnectionConfig) -> Self {
        Self {
            reader,
            read_buf: BytesMut::with_capacity(config.read_buffer_size),
            decoder: RequestDecoder::with_max_body_size(config.max_body_size),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            config,
            collaborators: Collaborators::default(),
        }
    }

    /// Collaborators attached to every request read from this connection.
    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Runs the protocol loop until the peer closes, asks to close, times out or
    /// sends something unparsable.
    ///
    /// Handler failures never end the loop: they become error responses. The
    /// returned error only describes why the connection itself went down.
    pub async fn process<D>(mut self, dispatcher: Arc<D>) -> Result<(), HttpError>
    where
        D: Dispatcher + Sync,
    {
        let mut served: usize = 0;

        loop {
            if served > 0 && !self.await_next_request().await? {
                return Ok(());
            }

            let request = match timeout(self.config.request_timeout(), self.read_request()).await {
                Ok(Ok(Some(request))) => request,

                Ok(Ok(None)) => {
                    info!(served, "cant read more request, break this connection down");
                    return Ok(());
                }

                Ok(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    if let Some(status) = e.status_code() {
                        self.send_error_response(status).await;
                    }
                    return Err(e.into());
                }

                Err(_elapsed) => {
                    let elapsed = self.config.request_timeout();
                    warn!(timeout = ?elapsed, "request was not received in time");
                    self.send_error_response(StatusCode::REQUEST_TIMEOUT).await;
                    return Err(HttpError::timeout(TimeoutPhase::Request, elapsed));
                }
            };

            let keep_alive = request.head().is_keep_alive();
            let head_only = *request.method() == Method::HEAD;
            let span = info_span!("request", method = %request.method(), path = %request.path());
            let request = request.with_collaborators(self.collaborators.clone());

            let mut response = dispatch(dispatcher.as_ref(), request).instrument(span).await;
            if !keep_alive {
                response.headers_mut().insert(CONNECTION, CLOSE);
            }

            if head_only {
                self.framed_write.send(HeadResponse(response)).await?;
            } else {
                self.framed_write.send(response).await?;
            }
            served += 1;

            if !keep_alive {
                debug!(served, "client asked to close the connection");
                return Ok(());
            }
        }
    }

    /// Waits for the first byte of the next request on a kept-alive connection.
    ///
    /// Returns `false` when the connection should be closed without a response:
    /// the peer went away or stayed idle for longer than the keep-alive timeout.
    /// Empty lines between requests don't count as a started request.
    async fn await_next_request(&mut self) -> Result<bool, HttpError> {
        let deadline = Instant::now() + self.config.keep_alive_timeout();

        loop {
            skip_empty_lines(&mut self.read_buf);
            if !self.read_buf.is_empty() {
                return Ok(true);
            }

            match timeout_at(deadline, self.fill_buffer()).await {
                Ok(Ok(0)) => {
                    debug!("peer closed idle connection");
                    return Ok(false);
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(ParseError::io(e).into()),
                Err(_elapsed) => {
                    debug!(timeout = ?self.config.keep_alive_timeout(), "keep-alive timeout, closing idle connection");
                    return Ok(false);
                }
            }
        }
    }

    /// Reads until one whole request is decoded, `None` on a clean EOF between requests.
    async fn read_request(&mut self) -> Result<Option<Request>, ParseError> {
        loop {
            if let Some(request) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(Some(request));
            }

            if self.fill_buffer().await? == 0 {
                let drained = self.read_buf.iter().all(u8::is_ascii_whitespace);
                if drained && !self.decoder.is_decoding_body() {
                    return Ok(None);
                }
                return Err(ParseError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed in the middle of a request",
                )));
            }
        }
    }

    async fn fill_buffer(&mut self) -> io::Result<usize> {
        self.read_buf.reserve(self.config.read_buffer_size);
        self.reader.read_buf(&mut self.read_buf).await
    }

    /// Best effort: the connection is closed right after, a failed write is only logged.
    async fn send_error_response(&mut self, status: StatusCode) {
        let response = Response::from_status(status).with_header(CONNECTION, CLOSE);
        if let Err(e) = self.framed_write.send(response).await {
            debug!(cause = %e, %status, "failed to send error response");
        }
    }
}

/// Invokes the dispatcher and maps every failure, panics included, to a response.
async fn dispatch<D: Dispatcher>(dispatcher: &D, request: Request) -> Response {
    match AssertUnwindSafe(dispatcher.dispatch(request)).catch_unwind().await {
        Ok(Ok(response)) => response,

        Ok(Err(HandlerError::Status { status, message })) => {
            debug!(%status, reason = %message, "handler returned an error status");
            Response::text(message).with_status(status)
        }

        Ok(Err(HandlerError::Unhandled { source })) => {
            error!(cause = %source, "handle response error");
            Response::from_status(StatusCode::INTERNAL_SERVER_ERROR)
        }

        Err(panic) => {
            error!(cause = panic_message(&*panic), "handler panicked");
            Response::from_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn skip_empty_lines(buf: &mut BytesMut) {
    let blank = buf.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
    buf.advance(blank);
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
