//! Configuration for the demultiplexing relay.

use std::time::Duration;

/// Default host of the primary (media) backend.
pub const DEFAULT_REMOTE_HOST: &str = "localhost";

/// Default port of the primary (media) backend.
pub const DEFAULT_REMOTE_PORT: u16 = 3478;

/// Default host the client-facing socket binds to.
pub const DEFAULT_LISTEN_HOST: &str = "localhost";

/// Default port the client-facing socket binds to.
pub const DEFAULT_LISTEN_PORT: u16 = 6001;

/// Default host of the secondary (DTLS handshake) backend.
pub const DEFAULT_DTLS_HOST: &str = "localhost";

/// Default port of the secondary (DTLS handshake) backend.
pub const DEFAULT_DTLS_PORT: u16 = 8443;

/// Largest datagram relayed. Larger ones are dropped, never forwarded cut short.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Pause before a new session starts after a runtime failure.
pub const SESSION_RESTART_DELAY: Duration = Duration::from_millis(100);

/// What the relay does when one of its loops fails at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop every loop and report the error to the caller.
    #[default]
    Terminate,
    /// Stop every loop of the current session and wait for a new client.
    AwaitNewClient,
}

/// A `host:port` pair, resolved when the socket is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl std::fmt::Display for HostPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Everything the relay needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Primary backend; receives all client traffic.
    pub remote: HostPort,
    /// Local address the client sends to.
    pub listen: HostPort,
    /// Secondary backend; receives the handshake traffic coming back from the primary.
    pub dtls: HostPort,
    pub failure_policy: FailurePolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            remote: HostPort::new(DEFAULT_REMOTE_HOST, DEFAULT_REMOTE_PORT),
            listen: HostPort::new(DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT),
            dtls: HostPort::new(DEFAULT_DTLS_HOST, DEFAULT_DTLS_PORT),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_ports() {
        let config = RelayConfig::default();
        assert_eq!(config.remote, HostPort::new("localhost", 3478));
        assert_eq!(config.listen, HostPort::new("localhost", 6001));
        assert_eq!(config.dtls, HostPort::new("localhost", 8443));
        assert_eq!(config.failure_policy, FailurePolicy::Terminate);
    }

    #[test]
    fn host_port_display_brackets_ipv6() {
        assert_eq!(HostPort::new("127.0.0.1", 80).to_string(), "127.0.0.1:80");
        assert_eq!(HostPort::new("::1", 80).to_string(), "[::1]:80");
    }
}
