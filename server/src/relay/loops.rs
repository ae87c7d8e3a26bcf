//! The three relay loops of a session.
//!
//! Each loop owns one receive buffer, handles one datagram per iteration and
//! returns `Ok(())` once the session is stopped, or the first I/O error.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use udpdemux_protocol::classify_datagram;

use crate::config::MAX_DATAGRAM_SIZE;
use crate::error::RelayError;
use crate::relay::session::{ClientAddr, RelaySession};
use crate::relay::stats::Route;
use crate::relay::LoopName;

/// One byte more than the largest datagram relayed, so that a datagram cut
/// by the socket can be told apart from one that fits exactly.
const RECV_BUFFER_SIZE: usize = MAX_DATAGRAM_SIZE + 1;

/// Client -> primary. Learns the client from the first datagram and starts
/// the primary-egress loop for it.
pub async fn ingress(session: Arc<RelaySession>) -> Result<(), RelayError> {
    let endpoints = session.endpoints();
    let mut shutdown = session.shutdown_signal();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let (n, from) = tokio::select! {
            () = stopped(&mut shutdown) => return Ok(()),
            received = endpoints.client_facing.recv_from(&mut buf, LoopName::Ingress) => received?,
        };
        if oversized(LoopName::Ingress, n) {
            continue;
        }

        match session.learn_client(from) {
            ClientAddr::Learned => {
                info!("New client {}", from);
                session.spawn_loop(LoopName::PrimaryEgress, primary_egress(session.clone(), from));
            }
            ClientAddr::Known(client) if client != from => {
                debug!("Datagram from {} while serving {}, forwarding anyway", from, client);
            }
            ClientAddr::Known(_) => {}
        }

        endpoints.primary.send(&buf[..n], LoopName::Ingress).await?;
        session.stats().record(Route::ClientToPrimary);
    }
}

/// Primary -> client, except handshake datagrams which go to the secondary
/// backend. The first handshake datagram starts the secondary-egress loop.
pub async fn primary_egress(session: Arc<RelaySession>, client: SocketAddr) -> Result<(), RelayError> {
    let endpoints = session.endpoints();
    let mut shutdown = session.shutdown_signal();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            () = stopped(&mut shutdown) => return Ok(()),
            received = endpoints.primary.recv(&mut buf, LoopName::PrimaryEgress) => received?,
        };
        if oversized(LoopName::PrimaryEgress, n) {
            continue;
        }
        let datagram = &buf[..n];

        let kind = classify_datagram(datagram);
        debug!("{} packet found ({}, {} bytes)", kind.protocol_name(), kind, n);

        if kind.is_handshake() {
            if session.observe_handshake() {
                info!("First {} packet from primary, relaying secondary replies", kind.protocol_name());
            }
            endpoints.secondary.send(datagram, LoopName::PrimaryEgress).await?;
            session.stats().record(Route::PrimaryToSecondary);
        } else {
            endpoints
                .client_facing
                .send_to(datagram, client, LoopName::PrimaryEgress)
                .await?;
            session.stats().record(Route::PrimaryToClient);
        }
    }
}

/// Secondary -> primary, unclassified.
pub async fn secondary_egress(session: Arc<RelaySession>) -> Result<(), RelayError> {
    let endpoints = session.endpoints();
    let mut shutdown = session.shutdown_signal();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            () = stopped(&mut shutdown) => return Ok(()),
            received = endpoints.secondary.recv(&mut buf, LoopName::SecondaryEgress) => received?,
        };
        if oversized(LoopName::SecondaryEgress, n) {
            continue;
        }

        endpoints.primary.send(&buf[..n], LoopName::SecondaryEgress).await?;
        session.stats().record(Route::SecondaryToPrimary);
    }
}

/// A datagram that filled the whole buffer was cut by the socket and is dropped.
fn oversized(loop_name: LoopName, n: usize) -> bool {
    if n > MAX_DATAGRAM_SIZE {
        warn!("[{}] Dropped datagram larger than {} bytes", loop_name, MAX_DATAGRAM_SIZE);
        return true;
    }
    false
}

/// Resolves once the session is stopped or its owner is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
