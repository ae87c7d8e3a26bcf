//! UDP relay that separates DTLS handshakes from media traffic.
//!
//! Everything a client sends goes to the primary backend. Replies from the
//! primary are classified by their first byte: DTLS handshake records are
//! diverted to a secondary backend, everything else goes back to the client.
//! The secondary backend's own datagrams are relayed to the primary.

pub mod cli;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod relay;

pub use config::{FailurePolicy, HostPort, RelayConfig};
pub use endpoint::Role;
pub use error::RelayError;
pub use relay::{LoopName, Relay};
