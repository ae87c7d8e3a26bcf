//! Relay supervisor: opens the endpoints, runs one session at a time and
//! applies the failure policy when a session's loop fails.

mod loops;
pub mod session;
pub mod stats;

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::{FailurePolicy, RelayConfig, SESSION_RESTART_DELAY};
use crate::endpoint::{Endpoints, Role};
use crate::error::RelayError;
use session::RelaySession;

/// Names the relay loop an error or log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopName {
    /// Client-facing socket to primary backend.
    Ingress,
    /// Primary backend to client or secondary backend.
    PrimaryEgress,
    /// Secondary backend to primary backend.
    SecondaryEgress,
}

impl fmt::Display for LoopName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopName::Ingress => write!(f, "ingress"),
            LoopName::PrimaryEgress => write!(f, "primary-egress"),
            LoopName::SecondaryEgress => write!(f, "secondary-egress"),
        }
    }
}

/// Loop and socket a runtime failure happened on, for log prefixes.
fn failure_site(err: &RelayError) -> String {
    match err.loop_name() {
        Some(loop_name) => format!("{}/{}", loop_name, err.role()),
        None => err.role().to_string(),
    }
}

/// The demultiplexing relay. Holds the three sockets for its whole lifetime;
/// dropping it closes them.
pub struct Relay {
    endpoints: Endpoints,
    failure_policy: FailurePolicy,
}

impl Relay {
    /// Open every endpoint. Nothing is relayed until [`Relay::run`].
    pub async fn open(config: &RelayConfig) -> Result<Self, RelayError> {
        let endpoints = Endpoints::open(config).await?;
        Ok(Self { endpoints, failure_policy: config.failure_policy })
    }

    /// Local address of one of the relay's sockets.
    pub fn local_addr(&self, role: Role) -> io::Result<SocketAddr> {
        self.endpoints.get(role).local_addr()
    }

    /// Relay until `shutdown` completes or, under [`FailurePolicy::Terminate`],
    /// until a loop fails.
    pub async fn run<S>(&self, shutdown: S) -> Result<(), RelayError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let mut session = RelaySession::start(self.endpoints.clone());

            let failure = tokio::select! {
                () = &mut shutdown => None,
                failure = session.failure() => failure,
            };

            let stats = session.stop().await;
            info!("Session ended: {}", stats);

            let Some(err) = failure else {
                return Ok(());
            };

            match self.failure_policy {
                FailurePolicy::Terminate => return Err(err),
                FailurePolicy::AwaitNewClient => {
                    warn!("[{}] {}, waiting for a new client", failure_site(&err), err);
                    tokio::select! {
                        () = &mut shutdown => return Ok(()),
                        () = tokio::time::sleep(SESSION_RESTART_DELAY) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_site_names_loop_and_socket() {
        let runtime = RelayError::Read {
            loop_name: LoopName::PrimaryEgress,
            role: Role::Primary,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(failure_site(&runtime), "primary-egress/primary");

        let setup = RelayError::Bind {
            addr: "localhost:6001".to_string(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert_eq!(failure_site(&setup), "client-facing");
    }
}
