use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::debug;

use crate::endpoint::Endpoints;
use crate::error::RelayError;
use crate::relay::loops;
use crate::relay::stats::{RelayStats, StatsSnapshot};
use crate::relay::LoopName;

/// Result of offering a sender address to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAddr {
    /// The sender became the session's client.
    Learned,
    /// The session already serves this client.
    Known(SocketAddr),
}

/// State shared by the loops relaying one client.
///
/// A session serves exactly one client: the sender of the first datagram on
/// the client-facing socket. Its address never changes afterwards.
pub struct RelaySession {
    endpoints: Endpoints,
    client_addr: OnceLock<SocketAddr>,
    handshake_observed: AtomicBool,
    secondary_started: AtomicBool,
    stats: RelayStats,
    failures: mpsc::UnboundedSender<RelayError>,
    shutdown: watch::Receiver<bool>,
    tasks: Mutex<JoinSet<()>>,
}

impl RelaySession {
    /// Create a session and start its ingress loop.
    pub fn start(endpoints: Endpoints) -> SessionHandle {
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = Arc::new(RelaySession {
            endpoints,
            client_addr: OnceLock::new(),
            handshake_observed: AtomicBool::new(false),
            secondary_started: AtomicBool::new(false),
            stats: RelayStats::default(),
            failures: failures_tx,
            shutdown: shutdown_rx,
            tasks: Mutex::new(JoinSet::new()),
        });

        session.spawn_loop(LoopName::Ingress, loops::ingress(session.clone()));

        SessionHandle { session, shutdown: shutdown_tx, failures: failures_rx }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// A fresh receiver of the session's stop signal.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr.get().copied()
    }

    /// Record `from` as the client unless one is already known.
    pub fn learn_client(&self, from: SocketAddr) -> ClientAddr {
        let mut learned = false;
        let client = *self.client_addr.get_or_init(|| {
            learned = true;
            from
        });

        if learned {
            ClientAddr::Learned
        } else {
            ClientAddr::Known(client)
        }
    }

    pub fn handshake_observed(&self) -> bool {
        self.handshake_observed.load(Ordering::Acquire)
    }

    pub fn secondary_started(&self) -> bool {
        self.secondary_started.load(Ordering::Acquire)
    }

    /// Mark that a handshake datagram came from the primary backend.
    ///
    /// The first caller per session starts the secondary-egress loop and gets
    /// `true`; every other caller gets `false`.
    pub fn observe_handshake(self: &Arc<Self>) -> bool {
        if self.handshake_observed.load(Ordering::Acquire) {
            return false;
        }
        self.handshake_observed.store(true, Ordering::Release);

        let won = self
            .secondary_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.spawn_loop(LoopName::SecondaryEgress, loops::secondary_egress(self.clone()));
        }
        won
    }

    /// Run one relay loop as its own task. An error ends the loop and is
    /// reported to the session's owner.
    pub fn spawn_loop<F>(&self, name: LoopName, relay: F)
    where
        F: Future<Output = Result<(), RelayError>> + Send + 'static,
    {
        let failures = self.failures.clone();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        tasks.spawn(async move {
            debug!("{} loop started", name);
            match relay.await {
                Ok(()) => debug!("{} loop stopped", name),
                Err(e) => {
                    let _ = failures.send(e);
                }
            }
        });
    }

    fn take_tasks(&self) -> JoinSet<()> {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *tasks)
    }
}

/// Owner side of a running session.
pub struct SessionHandle {
    session: Arc<RelaySession>,
    shutdown: watch::Sender<bool>,
    failures: mpsc::UnboundedReceiver<RelayError>,
}

impl SessionHandle {
    pub fn session(&self) -> &Arc<RelaySession> {
        &self.session
    }

    /// Wait for the first loop failure.
    pub async fn failure(&mut self) -> Option<RelayError> {
        self.failures.recv().await
    }

    /// Stop every loop of the session and wait until they have exited.
    pub async fn stop(self) -> StatsSnapshot {
        self.shutdown.send_replace(true);

        // a loop may still start another one while the first batch winds down
        loop {
            let mut tasks = self.session.take_tasks();
            if tasks.is_empty() {
                break;
            }
            while tasks.join_next().await.is_some() {}
        }

        self.session.stats.snapshot()
    }
}
