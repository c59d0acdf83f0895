//! Session table: per-BIB 5-tuple entries authorizing return traffic.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::bib::BibId;
use crate::types::{ExpiryClass, Ipv6TransportAddr, L4Protocol, TcpState};

/// Default timeouts per spec §4.4, overridable via [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub udp: Duration,
    pub icmp: Duration,
    pub tcp_trans: Duration,
    pub tcp_est: Duration,
    pub tcp_incoming_syn: Duration,
}

impl Timeouts {
    #[must_use]
    pub fn get(&self, class: ExpiryClass) -> Duration {
        match class {
            ExpiryClass::Udp => self.udp,
            ExpiryClass::Icmp => self.icmp,
            ExpiryClass::TcpTrans => self.tcp_trans,
            ExpiryClass::TcpEst => self.tcp_est,
            ExpiryClass::TcpIncomingSyn => self.tcp_incoming_syn,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            udp: Duration::from_secs(5 * 60),
            icmp: Duration::from_secs(60),
            tcp_trans: Duration::from_secs(4 * 60),
            tcp_est: Duration::from_secs(2 * 60 * 60 + 4 * 60),
            tcp_incoming_syn: Duration::from_secs(6),
        }
    }
}

/// Process-wide monotonically increasing session identifier. Unique
/// regardless of which BIB a session belongs to, so expiry queues can
/// carry a bare `SessionId` and resolve it against the owning BIB's
/// session list without ambiguity.
pub type SessionId = u64;

/// A single flow entry authorizing return traffic for one remote peer of
/// a BIB.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub bib_id: BibId,
    pub protocol: L4Protocol,
    pub v6_src: Ipv6TransportAddr,
    pub v6_dst: Ipv6TransportAddr,
    pub v4_dst: Ipv4Addr,
    pub v4_dst_port: u16,
    /// TCP connection state. Non-TCP sessions stay at `Established`.
    pub state: TcpState,
    pub expiry_class: ExpiryClass,
    pub deadline: Instant,
}

impl Session {
    /// Whether this session's 5-tuple matches an IPv4-origin reply:
    /// `(v4_dst, v4_dst_port)` as seen from the IPv6 side is the peer the
    /// reply must come from.
    #[must_use]
    pub fn matches_v4_peer(&self, v4_dst: Ipv4Addr, v4_dst_port: u16) -> bool {
        self.v4_dst == v4_dst && self.v4_dst_port == v4_dst_port
    }

    /// Whether this session's 5-tuple matches an IPv6-origin packet's
    /// destination.
    #[must_use]
    pub fn matches_v6_dst(&self, v6_dst: Ipv6TransportAddr) -> bool {
        self.v6_dst == v6_dst
    }
}
