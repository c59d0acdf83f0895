//! Shared value types used across the BIB, session table, pool4, and FSM.

use std::net::{Ipv4Addr, Ipv6Addr};

/// The closed set of L4 protocol kinds this core tracks state for.
///
/// ICMP here specifically means ICMP Echo flows, keyed by the Echo
/// identifier in place of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum L4Protocol {
    Udp,
    Tcp,
    Icmp,
}

impl L4Protocol {
    /// All protocol kinds, in a fixed iteration order used anywhere the
    /// core needs to walk "every protocol" (e.g. `Pool4::register`).
    pub const ALL: [L4Protocol; 3] = [L4Protocol::Udp, L4Protocol::Tcp, L4Protocol::Icmp];

    /// The label used for this protocol in metrics and log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            L4Protocol::Udp => nat64_metrics::metrics::label_values::PROTOCOL_UDP,
            L4Protocol::Tcp => nat64_metrics::metrics::label_values::PROTOCOL_TCP,
            L4Protocol::Icmp => nat64_metrics::metrics::label_values::PROTOCOL_ICMP,
        }
    }
}

impl std::fmt::Display for L4Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An IPv6 transport address: the node's IPv6 address plus a port (or,
/// for ICMP, the Echo identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv6TransportAddr {
    pub addr: Ipv6Addr,
    pub port: u16,
}

impl Ipv6TransportAddr {
    #[must_use]
    pub fn new(addr: Ipv6Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl std::fmt::Display for Ipv6TransportAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]:{}", self.addr, self.port)
    }
}

/// An IPv4 transport address: an address plus a port (or Echo identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4TransportAddr {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Ipv4TransportAddr {
    #[must_use]
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl std::fmt::Display for Ipv4TransportAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// Which side of the translator a packet arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The packet originated on the IPv6-only network.
    FromV6,
    /// The packet originated on the IPv4 Internet.
    FromV4,
}

/// The verdict the filter/update entry point hands back to the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Drop,
}

/// The subset of TCP flags the FSM cares about. Everything else (ACK,
/// window scaling, options, ...) is the hook's problem, not ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    pub syn: bool,
    pub fin: bool,
    pub rst: bool,
}

/// One of the five timeout categories that determines which expiry
/// queue a session lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryClass {
    Udp,
    Icmp,
    TcpTrans,
    TcpEst,
    TcpIncomingSyn,
}

impl ExpiryClass {
    /// All classes, in the fixed order the expiry manager keeps its
    /// queues in.
    pub const ALL: [ExpiryClass; 5] = [
        ExpiryClass::Udp,
        ExpiryClass::Icmp,
        ExpiryClass::TcpTrans,
        ExpiryClass::TcpEst,
        ExpiryClass::TcpIncomingSyn,
    ];
}

/// The TCP connection-state FSM's states. Non-TCP sessions stay
/// permanently at `Established`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Closed,
    V6SynRcv,
    V4SynRcv,
    Established,
    /// "FOUR_MIN" in the reviewed source; a transitory state entered on
    /// RST or on idle-demotion from `Established`.
    Trans,
    V6FinRcv,
    V4FinRcv,
    V6FinV4Fin,
}
