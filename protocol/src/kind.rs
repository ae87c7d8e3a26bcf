use std::fmt;

macro_rules! packet_kinds {
    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + packet_kinds!(@count $($tail)*) };
    ($($name:ident = $lo:literal ..= $hi:literal => $proto:literal),* $(,)?) => {
        /// Protocol family of a datagram, decided by its first byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PacketKind {
            $($name,)*
            /// Leading byte outside every known range.
            Unrecognized,
        }

        impl PacketKind {
            /// Every kind, in classification order.
            #[cfg(test)]
            pub(crate) const ALL: [PacketKind; packet_kinds!(@count $($name)*) + 1] =
                [$(PacketKind::$name,)* PacketKind::Unrecognized];

            /// Conventional name of the protocol multiplexed under this kind.
            #[must_use]
            pub const fn protocol_name(self) -> &'static str {
                match self {
                    $(PacketKind::$name => $proto,)*
                    PacketKind::Unrecognized => "unknown",
                }
            }
        }

        /// Classifies a datagram by its leading byte.
        #[must_use]
        pub const fn classify(first_byte: u8) -> PacketKind {
            match first_byte {
                $($lo..=$hi => PacketKind::$name,)*
                _ => PacketKind::Unrecognized,
            }
        }
    };
}

// RFC 5764 section 5.1.2
packet_kinds! {
    Handshake = 20..=63 => "DTLS",
    MediaOrControl = 128..=191 => "RTP/RTCP",
    Probe = 0..=1 => "STUN",
}

impl PacketKind {
    /// Whether datagrams of this kind belong to the secondary (handshake) backend.
    #[must_use]
    pub const fn is_handshake(self) -> bool {
        matches!(self, PacketKind::Handshake)
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::Handshake => write!(f, "handshake"),
            PacketKind::MediaOrControl => write!(f, "media/control"),
            PacketKind::Probe => write!(f, "probe"),
            PacketKind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Classifies a whole datagram. An empty datagram has no leading byte and is
/// `Unrecognized`.
#[must_use]
pub fn classify_datagram(datagram: &[u8]) -> PacketKind {
    datagram
        .first()
        .map_or(PacketKind::Unrecognized, |&b| classify(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(b: u8) -> PacketKind {
        if (20..=63).contains(&b) {
            PacketKind::Handshake
        } else if (128..=191).contains(&b) {
            PacketKind::MediaOrControl
        } else if b <= 1 {
            PacketKind::Probe
        } else {
            PacketKind::Unrecognized
        }
    }

    #[test]
    fn every_byte_value_maps_to_its_range() {
        for b in 0..=u8::MAX {
            assert_eq!(classify(b), expected(b), "byte {b}");
        }
    }

    #[test]
    fn range_boundaries() {
        assert_eq!(classify(0), PacketKind::Probe);
        assert_eq!(classify(1), PacketKind::Probe);
        assert_eq!(classify(2), PacketKind::Unrecognized);
        assert_eq!(classify(19), PacketKind::Unrecognized);
        assert_eq!(classify(20), PacketKind::Handshake);
        assert_eq!(classify(63), PacketKind::Handshake);
        assert_eq!(classify(64), PacketKind::Unrecognized);
        assert_eq!(classify(127), PacketKind::Unrecognized);
        assert_eq!(classify(128), PacketKind::MediaOrControl);
        assert_eq!(classify(191), PacketKind::MediaOrControl);
        assert_eq!(classify(192), PacketKind::Unrecognized);
        assert_eq!(classify(255), PacketKind::Unrecognized);
    }

    #[test]
    fn classification_is_idempotent() {
        let datagram = [22u8, 0xfe, 0xfd, 0x00];
        assert_eq!(classify_datagram(&datagram), classify_datagram(&datagram));
        assert_eq!(classify_datagram(&datagram), PacketKind::Handshake);
    }

    #[test]
    fn only_first_byte_matters() {
        assert_eq!(classify_datagram(&[0x80, 22, 22]), PacketKind::MediaOrControl);
        assert_eq!(classify_datagram(&[0x01, 0x80]), PacketKind::Probe);
        assert_eq!(classify_datagram(&[0x45]), PacketKind::Unrecognized);
    }

    #[test]
    fn empty_datagram_is_unrecognized() {
        assert_eq!(classify_datagram(&[]), PacketKind::Unrecognized);
    }

    #[test]
    fn all_lists_each_kind_once() {
        assert_eq!(PacketKind::ALL.len(), 4);
        for (i, a) in PacketKind::ALL.iter().enumerate() {
            for b in &PacketKind::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn protocol_names() {
        assert_eq!(PacketKind::Handshake.protocol_name(), "DTLS");
        assert_eq!(PacketKind::MediaOrControl.protocol_name(), "RTP/RTCP");
        assert_eq!(PacketKind::Probe.protocol_name(), "STUN");
        assert_eq!(PacketKind::Unrecognized.protocol_name(), "unknown");
    }

    #[test]
    fn only_handshake_is_diverted() {
        let diverted: Vec<_> = PacketKind::ALL.iter().filter(|k| k.is_handshake()).collect();
        assert_eq!(diverted, [&PacketKind::Handshake]);
    }
}
