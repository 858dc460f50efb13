//! The dispatch loop: accepts connections and serves one request per worker task.

use std::any::Any;
use std::net::{SocketAddr, ToSocketAddrs};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use http::{Response, StatusCode};
use listener_http::connection::HttpConnection;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use crate::binder;
use crate::body::ResponseBody;
use crate::config::ServerConfig;
use crate::date::DateService;
use crate::error::{DispatchError, ServerBuildError, ServerError};
use crate::lifecycle::{RequestInfo, RequestListener};
use crate::registry::HandlerRegistry;
use crate::request::RequestContext;
use crate::responder::text_response;
use crate::router::{RESERVED_PATH, route_name};

pub struct ServerBuilder {
    registry: Option<HandlerRegistry>,
    address: Option<std::io::Result<Vec<SocketAddr>>>,
    listeners: Vec<Arc<dyn RequestListener>>,
    shutdown_grace: Option<Duration>,
    max_body_size: Option<usize>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { registry: None, address: None, listeners: Vec::new(), shutdown_grace: None, max_body_size: None }
    }

    /// Addresses to listen on. Resolution failures are reported by [`ServerBuilder::build`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(|addrs| addrs.collect()));
        self
    }

    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a listener notified at the beginning and end of every request.
    pub fn listener(mut self, listener: impl RequestListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn shutdown_grace(mut self, shutdown_grace: Duration) -> Self {
        self.shutdown_grace = Some(shutdown_grace);
        self
    }

    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = Some(max_body_size);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let registry = self.registry.ok_or(ServerBuildError::MissingRegistry)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }

        let mut config = ServerConfig::new(address);
        if let Some(shutdown_grace) = self.shutdown_grace {
            config.shutdown_grace = shutdown_grace;
        }
        if let Some(max_body_size) = self.max_body_size {
            config.max_body_size = max_body_size;
        }

        let inner = ServerInner {
            registry,
            config,
            listeners: self.listeners,
            shutdown: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
            tcp_listener: Mutex::new(None),
            running: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        };
        Ok(Server { inner: Arc::new(inner) })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("registry", &self.registry)
            .field("address", &self.address)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// A handle to the server; clones share the same listener, workers and shutdown signal.
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    registry: HandlerRegistry,
    config: ServerConfig,
    listeners: Vec<Arc<dyn RequestListener>>,
    shutdown: CancellationToken,
    // in-flight workers, locked only to insert, prune or drain
    workers: Mutex<Vec<JoinHandle<()>>>,
    tcp_listener: Mutex<Option<TcpListener>>,
    running: AtomicBool,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Binds the listening socket ahead of [`Server::start`] and returns its local address,
    /// which is how an ephemeral port (`:0`) is discovered.
    pub async fn bind(&self) -> Result<SocketAddr, ServerError> {
        let tcp_listener = self.bind_listener().await?;
        let addr = tcp_listener.local_addr().map_err(|source| ServerError::Bind { source })?;
        *lock(&self.inner.tcp_listener) = Some(tcp_listener);
        Ok(addr)
    }

    async fn bind_listener(&self) -> Result<TcpListener, ServerError> {
        let address = self.inner.config.address.as_slice();
        let tcp_listener = TcpListener::bind(address).await.map_err(|source| {
            error!(cause = %source, "bind server error");
            ServerError::Bind { source }
        })?;
        info!(address = ?address, "start listening");
        Ok(tcp_listener)
    }

    /// Runs the accept loop until [`Server::stop`] is called.
    ///
    /// Each accepted connection is served by its own worker task. Binds first unless
    /// [`Server::bind`] was already called.
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        if self.inner.shutdown.is_cancelled() {
            debug!("server already stopped");
            return Ok(());
        }

        let bound = lock(&self.inner.tcp_listener).take();
        let tcp_listener = match bound {
            Some(tcp_listener) => tcp_listener,
            None => self.bind_listener().await.inspect_err(|_| self.inner.running.store(false, Ordering::SeqCst))?,
        };

        loop {
            let accepted = tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => break,
                accepted = tcp_listener.accept() => accepted,
            };

            let (tcp_stream, remote_addr) = match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let mut workers = lock(&self.inner.workers);
            if self.inner.shutdown.is_cancelled() {
                break;
            }
            workers.retain(|worker| !worker.is_finished());

            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            let span = info_span!("request", id, %remote_addr, method = field::Empty, path = field::Empty);
            let cancellation = self.inner.shutdown.child_token();
            let server = self.clone();
            workers.push(tokio::spawn(async move { server.serve(id, tcp_stream, cancellation).await }.instrument(span)));
        }

        info!("accept loop stopped");
        Ok(())
    }

    /// Stops accepting connections and waits for in-flight requests.
    ///
    /// Workers still running after the configured grace period are aborted. When this
    /// returns no worker is running and no new connection will be served.
    pub async fn stop(&self) {
        let mut workers = {
            let mut workers = lock(&self.inner.workers);
            self.inner.shutdown.cancel();
            std::mem::take(&mut *workers)
        };
        // close a socket bound ahead of `start`
        drop(lock(&self.inner.tcp_listener).take());
        info!(in_flight = workers.len(), "stopping server");

        let grace = self.inner.config.shutdown_grace;
        if tokio::time::timeout(grace, join_all(workers.iter_mut())).await.is_err() {
            warn!(?grace, "shutdown grace expired, aborting remaining requests");
            for worker in workers {
                if !worker.is_finished() {
                    worker.abort();
                    let _ = worker.await;
                }
            }
        }
        info!("server stopped");
    }

    /// Number of requests currently being served.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.workers).iter().filter(|worker| !worker.is_finished()).count()
    }

    async fn serve(&self, id: u64, tcp_stream: TcpStream, cancellation: CancellationToken) {
        let (reader, writer) = tcp_stream.into_split();
        let mut connection = HttpConnection::new(reader, writer);

        let request = match connection.read_request().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("connection closed before a request was received");
                return;
            }
            Err(e) => {
                warn!(cause = %e, "unable to read request");
                self.send(&mut connection, text_response(StatusCode::BAD_REQUEST, "Bad request."), &cancellation).await;
                return;
            }
        };

        let span = Span::current();
        span.record("method", field::display(request.method()));
        span.record("path", request.uri().path());

        if request.uri().path() == RESERVED_PATH {
            self.send(&mut connection, text_response(StatusCode::NOT_FOUND, "Not found."), &cancellation).await;
            return;
        }

        let info = RequestInfo { id, method: request.method().clone(), uri: request.uri().clone() };
        for listener in &self.inner.listeners {
            listener.on_begin_request(&info);
        }
        let end = EndNotifier { listeners: &self.inner.listeners, info: &info, armed: true };

        let mut ctx = RequestContext::new(id, request, cancellation, self.inner.config.max_body_size);
        let outcome = AssertUnwindSafe(self.dispatch(&mut ctx)).catch_unwind().await;
        // shutdown observed before the handler ran is answered, not abandoned
        let unavailable = matches!(outcome, Ok(Err(DispatchError::Cancelled)));
        let response = match outcome {
            Ok(Ok(())) => match ctx.take_response() {
                Some(response) => response,
                None => DispatchError::internal("the route did not write a response").into_response(),
            },
            Ok(Err(e)) => e.into_response(),
            Err(panic) => DispatchError::internal(format!("handler panicked: {}", panic_message(&*panic))).into_response(),
        };

        let status = if unavailable {
            Some(write(&mut connection, response).await)
        } else {
            self.send(&mut connection, response, ctx.cancellation()).await
        };
        debug!(elapsed = ?ctx.elapsed(), ?status, "request finished");
        end.finish(status);
    }

    async fn dispatch(&self, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let path = ctx.uri().path().to_owned();
        let name = route_name(&path)?;
        let Some(entry) = self.inner.registry.resolve(name) else {
            debug!(route = name, "no such route");
            return Err(DispatchError::bad_request("No such controller."));
        };

        entry.renderer().sanity_check(ctx)?;
        let args = binder::bind(entry.params(), ctx).await?;

        ctx.checkpoint()?;
        debug!(route = entry.name(), "invoking handler");
        let model = entry.handler().invoke(args).await?;

        entry.renderer().render(entry.name(), model, ctx)
    }

    /// Writes the response unless shutdown was requested, returning the written status.
    async fn send(
        &self,
        connection: &mut HttpConnection<OwnedWriteHalf>,
        response: Response<ResponseBody>,
        cancellation: &CancellationToken,
    ) -> Option<StatusCode> {
        if cancellation.is_cancelled() {
            debug!("server is shutting down, response abandoned");
            return None;
        }

        Some(write(connection, response).await)
    }
}

async fn write(connection: &mut HttpConnection<OwnedWriteHalf>, mut response: Response<ResponseBody>) -> StatusCode {
    DateService::get_global_instance().stamp(response.headers_mut());
    let status = response.status();
    if let Err(e) = connection.send_response(response).await {
        warn!(cause = %e, "unable to write response");
    }
    status
}

/// Reports the end of a request to every listener exactly once.
///
/// Dropped while still armed, as when a worker is aborted after the shutdown grace, it
/// reports the request as abandoned.
struct EndNotifier<'a> {
    listeners: &'a [Arc<dyn RequestListener>],
    info: &'a RequestInfo,
    armed: bool,
}

impl EndNotifier<'_> {
    fn finish(mut self, status: Option<StatusCode>) {
        self.armed = false;
        self.notify(status);
    }

    fn notify(&self, status: Option<StatusCode>) {
        for listener in self.listeners {
            listener.on_end_request(self.info, status);
        }
    }
}

impl Drop for EndNotifier<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.notify(None);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown cause"
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("stopped", &self.inner.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
