//! TCP acceptor and connection pool.

use crate::config::ServerConfig;
use crate::connection::drive;
use crate::dispatch::ServiceDispatcher;
use crate::error::ServerError;
use crate::service::HttpService;
use parking_lot::Mutex;
use pion_engine::SchedulerHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Grace period for connection tasks when the server stops.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Accepted connections keyed by a monotonic id.
///
/// The mutex guards only map mutation. Each task removes itself on
/// exit, so after all clients close the pool drains to zero.
struct ConnectionPool {
    connections: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl ConnectionPool {
    fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn insert(&self, id: u64, handle: JoinHandle<()>) {
        self.connections.lock().insert(id, handle);
    }

    fn finish(&self, id: u64) {
        self.connections.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.connections.lock().len()
    }

    fn drain(&self) -> Vec<JoinHandle<()>> {
        self.connections.lock().drain().map(|(_, h)| h).collect()
    }
}

struct ListenerState {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    acceptor: JoinHandle<()>,
}

/// One HTTP server: a listening port, its connection pool, and a
/// service dispatch table.
pub struct HttpServer {
    config: Arc<ServerConfig>,
    dispatcher: Arc<ServiceDispatcher>,
    pool: Arc<ConnectionPool>,
    state: Mutex<Option<ListenerState>>,
}

impl HttpServer {
    /// Creates a stopped server for a configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(ServiceDispatcher::new()),
            pool: Arc::new(ConnectionPool::new()),
            state: Mutex::new(None),
        }
    }

    /// Binds a service to a path prefix.
    pub fn add_service(&self, prefix: impl Into<String>, service: Arc<dyn HttpService>) {
        self.dispatcher.add_service(prefix, service);
    }

    /// Whether the server is listening.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state.lock().is_some()
    }

    /// The bound address while listening. With port 0 this is where
    /// the ephemeral port shows up.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().as_ref().map(|s| s.local_addr)
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.pool.len()
    }

    /// Opens the listening socket and starts accepting.
    ///
    /// # Errors
    ///
    /// `SERVER_ALREADY_RUNNING`, or `SERVER_IO` for bind failures.
    pub fn start(&self, scheduler: &SchedulerHandle) -> Result<SocketAddr, ServerError> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(1024)?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "server listening");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let acceptor = scheduler.spawn(accept_loop(
            listener,
            self.config.clone(),
            self.dispatcher.clone(),
            self.pool.clone(),
            scheduler.clone(),
            shutdown_rx,
        ));

        *state = Some(ListenerState {
            local_addr,
            shutdown: shutdown_tx,
            acceptor,
        });
        Ok(local_addr)
    }

    /// Stops accepting, closes pooled connections, and empties the
    /// pool.
    ///
    /// The stop signal serializes with in-flight accepts through the
    /// acceptor task; connections get a bounded grace period before
    /// they are aborted.
    pub async fn stop(&self) {
        let Some(state) = self.state.lock().take() else {
            return;
        };
        info!(addr = %state.local_addr, "server stopping");

        let _ = state.shutdown.send(true);
        let _ = state.acceptor.await;

        for mut handle in self.pool.drain() {
            if timeout(STOP_GRACE, &mut handle).await.is_err() {
                handle.abort();
                warn!("connection exceeded stop grace; aborted");
            }
        }
    }
}

async fn accept_loop(
    listener: tokio::net::TcpListener,
    config: Arc<ServerConfig>,
    dispatcher: Arc<ServiceDispatcher>,
    pool: Arc<ConnectionPool>,
    scheduler: SchedulerHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "connection accepted");
                    spawn_connection(
                        stream,
                        &config,
                        &dispatcher,
                        &pool,
                        &scheduler,
                        shutdown.clone(),
                    );
                }
                Err(err) => {
                    // transient accept failures (fd pressure, reset
                    // before accept) must not kill the acceptor
                    debug!(error = %err, "accept failed");
                }
            },
        }
    }
    // dropping the listener closes the socket
}

fn spawn_connection(
    stream: TcpStream,
    config: &Arc<ServerConfig>,
    dispatcher: &Arc<ServiceDispatcher>,
    pool: &Arc<ConnectionPool>,
    scheduler: &SchedulerHandle,
    shutdown: watch::Receiver<bool>,
) {
    let id = pool.allocate_id();
    let config = config.clone();
    let dispatcher = dispatcher.clone();
    let pool_for_task = pool.clone();

    // the task waits for its pool registration before serving, so
    // `finish` can never race ahead of `insert`
    let (registered_tx, registered_rx) = oneshot::channel::<()>();
    let handle = scheduler.spawn(async move {
        let _ = registered_rx.await;
        drive(stream, config, dispatcher, shutdown).await;
        pool_for_task.finish(id);
    });
    pool.insert(id, handle);
    let _ = registered_tx.send(());
}
