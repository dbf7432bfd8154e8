//! Drives `nimble-http` connections directly, without router or acceptor.

use std::sync::Arc;

use nimble_http::connection::HttpConnection;
use nimble_http::handler::dispatcher_fn;
use nimble_http::protocol::{HandlerError, Request, Response};
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let dispatcher = Arc::new(dispatcher_fn(simple_handler));
    loop {
        let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let dispatcher = dispatcher.clone();

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::new(reader, writer);
            match connection.process(dispatcher).await {
                Ok(_) => {
                    info!("finished process, connection shutdown");
                }
                Err(e) => {
                    error!("service has error, cause {}, connection shutdown", e);
                }
            }
        });
    }
}

async fn simple_handler(request: Request) -> Result<Response, HandlerError> {
    let body = std::str::from_utf8(request.body()).map_err(|_e| HandlerError::bad_request("request body is not utf8"))?;
    info!(body, "receive body");
    Ok(Response::text(format!("receive from method: {}\r\n", request.method())))
}
