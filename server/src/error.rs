//! Error types for the relay.

use std::io;
use thiserror::Error;

use crate::endpoint::Role;
use crate::relay::LoopName;

/// Errors that can occur while opening the endpoints or relaying datagrams.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("could not connect {role} socket to {addr}: {source}")]
    Connect {
        role: Role,
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{loop_name} loop could not read from {role} socket: {source}")]
    Read {
        loop_name: LoopName,
        role: Role,
        #[source]
        source: io::Error,
    },

    #[error("{loop_name} loop could not write to {role} socket: {source}")]
    Write {
        loop_name: LoopName,
        role: Role,
        #[source]
        source: io::Error,
    },
}

impl RelayError {
    /// Socket the error happened on.
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            RelayError::Bind { .. } => Role::ClientFacing,
            RelayError::Connect { role, .. }
            | RelayError::Read { role, .. }
            | RelayError::Write { role, .. } => *role,
        }
    }

    /// Loop the error happened in, `None` for setup errors.
    #[must_use]
    pub fn loop_name(&self) -> Option<LoopName> {
        match self {
            RelayError::Read { loop_name, .. } | RelayError::Write { loop_name, .. } => {
                Some(*loop_name)
            }
            RelayError::Bind { .. } | RelayError::Connect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_errors_name_loop_and_socket() {
        let err = RelayError::Write {
            loop_name: LoopName::PrimaryEgress,
            role: Role::Secondary,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let message = err.to_string();
        assert!(message.starts_with("primary-egress loop could not write to secondary socket"));
        assert_eq!(err.role(), Role::Secondary);
        assert_eq!(err.loop_name(), Some(LoopName::PrimaryEgress));
    }

    #[test]
    fn setup_errors_have_no_loop() {
        let err = RelayError::Connect {
            role: Role::Primary,
            addr: "localhost:3478".to_string(),
            source: io::Error::from(io::ErrorKind::AddrNotAvailable),
        };
        assert!(err.to_string().contains("primary socket to localhost:3478"));
        assert_eq!(err.loop_name(), None);
    }
}
