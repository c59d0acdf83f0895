//! The IPv4 transport-address pool.
//!
//! Owns the set of usable IPv4 addresses, one independent port table per
//! L4 protocol, honoring RFC 6146 port-parity/range preservation (see
//! [`section`]).

mod node;
mod section;

pub use section::SectionKind;

use std::net::Ipv4Addr;

use dashmap::DashSet;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::types::{Ipv4TransportAddr, L4Protocol};
use node::PoolNode;

/// The IPv4 transport-address pool, one independent port table per
/// protocol.
///
/// Each protocol's node list is behind its own lock — the contract from
/// spec §5 is "read-parallel [via the registered-address set],
/// write-serialized per protocol".
#[derive(Debug)]
pub struct Pool4 {
    udp: Mutex<Vec<PoolNode>>,
    tcp: Mutex<Vec<PoolNode>>,
    icmp: Mutex<Vec<PoolNode>>,
    registered: DashSet<Ipv4Addr>,
}

impl Pool4 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pool_for(&self, proto: L4Protocol) -> &Mutex<Vec<PoolNode>> {
        match proto {
            L4Protocol::Udp => &self.udp,
            L4Protocol::Tcp => &self.tcp,
            L4Protocol::Icmp => &self.icmp,
        }
    }

    /// Add `addr` to all three per-protocol pools with all four sections
    /// freshly initialized.
    pub fn register(&self, addr: Ipv4Addr) -> Result<()> {
        if self.registered.contains(&addr) {
            return Err(Error::AlreadyPresent);
        }
        for proto in L4Protocol::ALL {
            self.pool_for(proto).lock().push(PoolNode::new(addr));
        }
        self.registered.insert(addr);
        nat64_metrics::metrics::POOL4_ADDRESSES.inc();
        log::info!("Registered {addr} in pool4");
        Ok(())
    }

    /// Remove `addr` from all three pools. Any ports currently on loan
    /// from it are silently dropped along with it — callers are expected
    /// to have reclaimed all BIB entries bound to it first.
    pub fn remove(&self, addr: Ipv4Addr) -> Result<()> {
        let present: Vec<bool> = L4Protocol::ALL
            .iter()
            .map(|proto| {
                self.pool_for(*proto)
                    .lock()
                    .iter()
                    .any(|node| node.addr == addr)
            })
            .collect();

        let present_count = present.iter().filter(|p| **p).count();
        if present_count == 0 {
            return Err(Error::NotFound);
        }
        if present_count != L4Protocol::ALL.len() {
            return Err(Error::Inconsistent);
        }

        for proto in L4Protocol::ALL {
            self.pool_for(proto).lock().retain(|node| node.addr != addr);
        }
        self.registered.remove(&addr);
        nat64_metrics::metrics::POOL4_ADDRESSES.dec();
        log::info!("Removed {addr} from pool4");
        Ok(())
    }

    /// Return a free port in the same section as `hint.port`, on the
    /// same `hint.addr`, if that specific address has capacity.
    pub fn get_similar(&self, proto: L4Protocol, hint: Ipv4TransportAddr) -> Option<Ipv4TransportAddr> {
        let kind = SectionKind::for_port(hint.port);
        let mut nodes = self.pool_for(proto).lock();
        let node = nodes.iter_mut().find(|n| n.addr == hint.addr)?;
        let port = node.section_mut(kind).allocate()?;
        Some(Ipv4TransportAddr::new(hint.addr, port))
    }

    /// Return any free port in the section matching `hint_port`, trying
    /// each registered address in list order.
    pub fn get_any(&self, proto: L4Protocol, hint_port: u16) -> Option<Ipv4TransportAddr> {
        let kind = SectionKind::for_port(hint_port);
        let mut nodes = self.pool_for(proto).lock();
        for node in nodes.iter_mut() {
            if let Some(port) = node.section_mut(kind).allocate() {
                return Some(Ipv4TransportAddr::new(node.addr, port));
            }
        }
        nat64_metrics::metrics::POOL4_EXHAUSTED
            .with_label_values(&[proto.label()])
            .inc();
        None
    }

    /// Return a previously-allocated `(addr, port)` to its owning
    /// section's free list. An unknown address is logged and ignored,
    /// per spec.
    pub fn give_back(&self, proto: L4Protocol, addr_port: Ipv4TransportAddr) {
        let kind = SectionKind::for_port(addr_port.port);
        let mut nodes = self.pool_for(proto).lock();
        match nodes.iter_mut().find(|n| n.addr == addr_port.addr) {
            Some(node) => node.section_mut(kind).free(addr_port.port),
            None => log::warn!(
                "Attempted to return {addr_port} to pool4 for protocol {proto}, but that address isn't registered"
            ),
        }
    }

    /// Whether `addr` is currently registered in the pool.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.registered.contains(&addr)
    }

    /// Enumerate all registered addresses.
    #[must_use]
    pub fn to_array(&self) -> Vec<Ipv4Addr> {
        self.registered.iter().map(|r| *r).collect()
    }
}

impl Default for Pool4 {
    fn default() -> Self {
        Self {
            udp: Mutex::new(Vec::new()),
            tcp: Mutex::new(Vec::new()),
            icmp: Mutex::new(Vec::new()),
            registered: DashSet::new(),
        }
    }
}
