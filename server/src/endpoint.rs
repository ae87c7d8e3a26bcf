use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};

use crate::config::{HostPort, RelayConfig};
use crate::error::RelayError;
use crate::relay::LoopName;

/// Fixed purpose of one of the relay's sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Bound locally; the client sends here and replies leave from here.
    ClientFacing,
    /// Connected to the primary (media) backend.
    Primary,
    /// Connected to the secondary (handshake) backend.
    Secondary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::ClientFacing => write!(f, "client-facing"),
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}

/// One UDP socket with a fixed role.
///
/// Receive and send failures are mapped to [`RelayError::Read`] and
/// [`RelayError::Write`] tagged with the calling loop and this role.
#[derive(Debug, Clone)]
pub struct Endpoint {
    role: Role,
    socket: Arc<UdpSocket>,
}

impl Endpoint {
    /// Bind the socket clients send to.
    pub async fn client_facing(listen: &HostPort) -> Result<Self, RelayError> {
        let bind_error = |source| RelayError::Bind { addr: listen.to_string(), source };

        let addr = resolve(listen).await.map_err(bind_error)?;
        let socket = UdpSocket::bind(addr).await.map_err(bind_error)?;
        info!("Listening for client on {}", socket.local_addr().map_err(bind_error)?);

        Ok(Self { role: Role::ClientFacing, socket: Arc::new(socket) })
    }

    /// Open a socket on an ephemeral local port, connected to a backend.
    pub async fn backend(role: Role, remote: &HostPort) -> Result<Self, RelayError> {
        let connect_error = |source| RelayError::Connect { role, addr: remote.to_string(), source };

        let remote_addr = resolve(remote).await.map_err(connect_error)?;
        let local_addr: SocketAddr = if remote_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local_addr).await.map_err(connect_error)?;
        socket.connect(remote_addr).await.map_err(connect_error)?;
        debug!("{} socket connected to {}", role, remote_addr);

        Ok(Self { role, socket: Arc::new(socket) })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive one datagram together with its sender.
    pub async fn recv_from(
        &self,
        buf: &mut [u8],
        loop_name: LoopName,
    ) -> Result<(usize, SocketAddr), RelayError> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(|source| RelayError::Read { loop_name, role: self.role, source })
    }

    /// Receive one datagram from the connected peer.
    pub async fn recv(&self, buf: &mut [u8], loop_name: LoopName) -> Result<usize, RelayError> {
        self.socket
            .recv(buf)
            .await
            .map_err(|source| RelayError::Read { loop_name, role: self.role, source })
    }

    /// Send one datagram to the connected peer.
    pub async fn send(&self, datagram: &[u8], loop_name: LoopName) -> Result<(), RelayError> {
        self.socket
            .send(datagram)
            .await
            .map(drop)
            .map_err(|source| RelayError::Write { loop_name, role: self.role, source })
    }

    /// Send one datagram to `target`.
    pub async fn send_to(
        &self,
        datagram: &[u8],
        target: SocketAddr,
        loop_name: LoopName,
    ) -> Result<(), RelayError> {
        self.socket
            .send_to(datagram, target)
            .await
            .map(drop)
            .map_err(|source| RelayError::Write { loop_name, role: self.role, source })
    }
}

/// The three sockets of the relay, opened once and shared by every session.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub client_facing: Endpoint,
    pub primary: Endpoint,
    pub secondary: Endpoint,
}

impl Endpoints {
    /// Open all three sockets. Sockets opened before a failure are closed again.
    pub async fn open(config: &RelayConfig) -> Result<Self, RelayError> {
        let client_facing = Endpoint::client_facing(&config.listen).await?;
        let primary = Endpoint::backend(Role::Primary, &config.remote).await?;
        let secondary = Endpoint::backend(Role::Secondary, &config.dtls).await?;

        Ok(Self { client_facing, primary, secondary })
    }

    #[must_use]
    pub fn get(&self, role: Role) -> &Endpoint {
        match role {
            Role::ClientFacing => &self.client_facing,
            Role::Primary => &self.primary,
            Role::Secondary => &self.secondary,
        }
    }
}

async fn resolve(target: &HostPort) -> io::Result<SocketAddr> {
    lookup_host((target.host.as_str(), target.port))
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address found for {target}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_facing_binds_ephemeral_port() {
        let endpoint = Endpoint::client_facing(&HostPort::new("127.0.0.1", 0))
            .await
            .expect("bind failed");
        assert_eq!(endpoint.role(), Role::ClientFacing);
        assert_ne!(endpoint.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_to_taken_port_is_bind_error() {
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = Endpoint::client_facing(&HostPort::new("127.0.0.1", port))
            .await
            .expect_err("port is already taken");
        assert!(matches!(err, RelayError::Bind { .. }));
    }

    #[tokio::test]
    async fn unresolvable_backend_is_connect_error() {
        let err = Endpoint::backend(Role::Secondary, &HostPort::new("no-such-host.invalid", 8443))
            .await
            .expect_err("host must not resolve");
        assert!(matches!(err, RelayError::Connect { role: Role::Secondary, .. }));
    }

    #[tokio::test]
    async fn backend_sends_to_connected_peer() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();

        let endpoint = Endpoint::backend(Role::Primary, &HostPort::new("127.0.0.1", port))
            .await
            .expect("connect failed");
        endpoint.send(b"ping", LoopName::Ingress).await.expect("send failed");

        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from.port(), endpoint.local_addr().unwrap().port());
    }
}
