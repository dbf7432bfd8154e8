//! The acceptor.
//!
//! [`Server`] owns the listening socket and spawns one task per accepted
//! connection. Each task waits for a slot of a counting semaphore before it runs
//! the protocol loop, so at most `max_connections` connections are handled at
//! once while accepting never blocks. The slot is released when the task ends,
//! whatever the reason.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use nimble_http::connection::HttpConnection;
use nimble_http::handler::Dispatcher;
use nimble_http::protocol::{Collaborators, HandlerError, Request, Response, TaskSubmitter, TemplateEngine};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{ConfigError, ServerConfig};
use crate::router::Router;

/// Pause before accepting again after a failed accept, e.g. when out of file descriptors.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct ServerBuilder {
    router: Option<Router>,
    config: ServerConfig,
    collaborators: Collaborators,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, config: ServerConfig::default(), collaborators: Collaborators::new() }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for overriding `host` and `port` of the current config.
    pub fn address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config = self.config.with_address(host, port);
        self
    }

    pub fn template_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.collaborators = self.collaborators.with_template_engine(engine);
        self
    }

    pub fn task_submitter(mut self, submitter: impl TaskSubmitter + 'static) -> Self {
        self.collaborators = self.collaborators.with_task_submitter(submitter);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        self.config.validate()?;
        Ok(Server {
            router,
            config: self.config,
            collaborators: self.collaborators,
            shutdown: CancellationToken::new(),
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Stops the accept loop of the server it was taken from.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Closes the listener; connections already accepted keep running.
    ///
    /// Calling it more than once, or before the server started, is fine.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
pub struct Server {
    router: Router,
    config: ServerConfig,
    collaborators: Collaborators,
    shutdown: CancellationToken,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { token: self.shutdown.clone() }
    }

    /// Binds the configured address and serves until [`ShutdownHandle::stop`].
    ///
    /// Installs a stdout `tracing` subscriber unless the application already set one.
    pub async fn start(self) -> Result<(), ServerError> {
        init_logging();

        let address = self.config.address();
        info!(%address, "start listening");
        let tcp_listener = match TcpListener::bind(address.as_str()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(ServerError::Bind { address, source: e });
            }
        };

        self.serve(tcp_listener).await
    }

    /// Serves connections from an already bound listener until [`ShutdownHandle::stop`].
    ///
    /// The listener is dropped, and so closed, when this returns.
    pub async fn serve(self, tcp_listener: TcpListener) -> Result<(), ServerError> {
        match tcp_listener.local_addr() {
            Ok(local_addr) => info!(%local_addr, max_connections = self.config.max_connections, "accepting connections"),
            Err(e) => warn!(cause = %e, "listener has no local address"),
        }

        let shutdown = self.shutdown.clone();
        let limiter = Arc::new(Semaphore::new(self.config.max_connections));
        let server = Arc::new(self);

        loop {
            let (tcp_stream, remote_addr) = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, backoff = ?ACCEPT_ERROR_BACKOFF, "failed to accept");
                        if backoff_after_accept_error(&shutdown).await {
                            break;
                        }
                        continue;
                    }
                },
            };

            let server = Arc::clone(&server);
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                // the permit is held until this task ends
                let Ok(_permit) = limiter.acquire_owned().await else {
                    return;
                };
                server.handle_connection(tcp_stream, remote_addr).await;
            });
        }

        info!("shutdown requested, listener closed");
        Ok(())
    }

    async fn handle_connection(self: Arc<Self>, tcp_stream: TcpStream, remote_addr: SocketAddr) {
        debug!(%remote_addr, "connection accepted");
        let (reader, writer) = tcp_stream.into_split();
        let connection = HttpConnection::with_config(reader, writer, self.config.connection.clone())
            .with_collaborators(self.collaborators.clone());

        match connection.process(self).await {
            Ok(()) => {
                info!(%remote_addr, "finished process, connection shutdown");
            }
            Err(e) => {
                error!(%remote_addr, "service has error, cause {}, connection shutdown", e);
            }
        }
    }
}

impl Dispatcher for Server {
    fn dispatch(&self, request: Request) -> impl Future<Output = Result<Response, HandlerError>> + Send {
        async move {
            let Some(resolved) = self.router.resolve(request.method(), request.path()) else {
                debug!("no route matched");
                return Err(HandlerError::not_found());
            };
            resolved.call(request).await
        }
    }
}

/// Sleeps for [`ACCEPT_ERROR_BACKOFF`]; `true` when shutdown was requested meanwhile.
async fn backoff_after_accept_error(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => false,
    }
}

/// Falls back to a stdout subscriber when none is installed.
fn init_logging() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("a global tracing subscriber is already installed");
    }
}
