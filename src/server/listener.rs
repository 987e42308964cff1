//! Connection acceptor.
//!
//! [`Listener::bind`] opens, configures, binds and starts listening on a
//! socket, reporting which of those steps failed. [`Listener::run`] spawns
//! the accept loop and returns at once. The loop is a single task, so
//! accepts never run concurrently with each other on any runtime flavor,
//! and every accepted connection gets a task of its own. Sessions are
//! counted while they run, so a caller can wait for them with
//! [`Listener::drained`] after shutdown.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::http::connection::Connection;
use crate::router::Router;

pub const DEFAULT_BACKLOG: u32 = 1024;

/// Pause after a listener-level accept failure such as running out of
/// file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The socket setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Open,
    SetOption,
    Bind,
    Listen,
}

impl SetupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupStep::Open => "open",
            SetupStep::SetOption => "set_option",
            SetupStep::Bind => "bind",
            SetupStep::Listen => "listen",
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub struct SetupError {
    pub step: SetupStep,
    #[source]
    pub source: io::Error,
}

impl SetupError {
    fn at(step: SetupStep) -> impl FnOnce(io::Error) -> Self {
        move |source| {
            error!(op = step.as_str(), error = %source, "Listener setup failed");
            Self { step, source }
        }
    }
}

/// How the accept loop treats a failed accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFailure {
    /// The peer went away or the call was interrupted; retry at once.
    Transient,
    /// The listening socket itself is in trouble; retry after a pause.
    Listener,
}

pub fn classify(err: &io::Error) -> AcceptFailure {
    use io::ErrorKind::*;

    match err.kind() {
        ConnectionReset | ConnectionAborted | ConnectionRefused | Interrupted | WouldBlock
        | TimedOut => AcceptFailure::Transient,
        _ => AcceptFailure::Listener,
    }
}

/// Accepts incoming connections and launches a session for each.
pub struct Listener {
    listener: TcpListener,
    router: Arc<dyn Router>,
    shutdown: watch::Sender<bool>,
    accepted: AtomicU64,
    running: AtomicBool,
    sessions: Arc<watch::Sender<usize>>,
}

impl Listener {
    /// Opens a socket on `addr` with address reuse enabled and starts
    /// listening with the given backlog.
    ///
    /// Must be called from inside a tokio runtime. Nothing is retried: on
    /// error the failed step is returned and no listener exists.
    pub fn bind<R: Router>(
        addr: SocketAddr,
        router: R,
        backlog: u32,
    ) -> Result<Arc<Self>, SetupError> {
        Self::bind_shared(addr, Arc::new(router), backlog)
    }

    pub fn bind_shared(
        addr: SocketAddr,
        router: Arc<dyn Router>,
        backlog: u32,
    ) -> Result<Arc<Self>, SetupError> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(SetupError::at(SetupStep::Open))?;

        socket
            .set_reuseaddr(true)
            .map_err(SetupError::at(SetupStep::SetOption))?;

        socket
            .bind(addr)
            .map_err(SetupError::at(SetupStep::Bind))?;

        let listener = socket
            .listen(backlog)
            .map_err(SetupError::at(SetupStep::Listen))?;

        info!("Listening on {}", listener.local_addr().unwrap_or(addr));

        let (shutdown, _) = watch::channel(false);
        Ok(Arc::new(Self {
            listener,
            router,
            shutdown,
            accepted: AtomicU64::new(0),
            running: AtomicBool::new(false),
            sessions: Arc::new(watch::channel(0).0),
        }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of sessions started so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Sessions currently running.
    pub fn active_sessions(&self) -> usize {
        *self.sessions.borrow()
    }

    /// Spawns the accept loop and returns immediately.
    ///
    /// The task keeps its own handle to the listener, so the listener
    /// outlives every accept it has issued. The returned handle completes
    /// once [`shutdown`](Self::shutdown) has been observed.
    ///
    /// Only the first call starts a loop. Later calls log a warning and get
    /// a handle that completes on shutdown, like the real one.
    pub fn run(self: &Arc<Self>) -> JoinHandle<()> {
        let mut shutdown = self.shutdown.subscribe();

        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Accept loop already running");
            return tokio::spawn(async move {
                while !*shutdown.borrow_and_update() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            });
        }

        tokio::spawn(Arc::clone(self).accept_loop(shutdown))
    }

    /// Stops the accept loop. Sessions already running finish on their own.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once no session is running.
    ///
    /// Sessions are not cancelled, so wrap this in a timeout when clients
    /// may hold keep-alive connections open.
    pub async fn drained(&self) {
        let mut active = self.sessions.subscribe();
        while *active.borrow_and_update() > 0 {
            if active.changed().await.is_err() {
                break;
            }
        }
    }

    async fn accept_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let accepted = tokio::select! {
                biased;
                _ = shutdown.changed() => continue,
                res = self.listener.accept() => res,
            };

            match accepted {
                Ok((stream, peer)) => self.start_session(stream, peer),

                Err(e) => match classify(&e) {
                    AcceptFailure::Transient => {
                        debug!(op = "accept", error = %e, "Transient accept failure");
                    }
                    AcceptFailure::Listener => {
                        error!(op = "accept", error = %e, "Accept failed, retrying");
                        tokio::select! {
                            biased;
                            _ = shutdown.changed() => {}
                            _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                        }
                    }
                },
            }
        }

        debug!("Accept loop stopped");
    }

    fn start_session(&self, stream: TcpStream, peer: SocketAddr) {
        let session = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(%peer, session, "Accepted connection");

        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let router = Arc::clone(&self.router);
        let guard = SessionGuard::enter(&self.sessions);
        tokio::spawn(async move {
            let _guard = guard;
            let mut conn = Connection::new(stream, router);
            if let Err(e) = conn.run().await {
                warn!(%peer, session, error = %e, "Connection error");
            }
        });
    }
}

/// Keeps a session counted until the session task ends.
struct SessionGuard(Arc<watch::Sender<usize>>);

impl SessionGuard {
    fn enter(sessions: &Arc<watch::Sender<usize>>) -> Self {
        sessions.send_modify(|active| *active += 1);
        Self(Arc::clone(sessions))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.send_modify(|active| *active -= 1);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("accepted", &self.accepted())
            .field("active_sessions", &self.active_sessions())
            .finish_non_exhaustive()
    }
}
