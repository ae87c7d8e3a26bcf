//! Demultiplexing of datagrams that share one UDP port.
//!
//! DTLS, RTP/RTCP and STUN can be told apart by the first byte of each
//! datagram alone, without parsing the rest of the packet.

pub mod kind;

pub use kind::{classify, classify_datagram, PacketKind};
