//! The Binding Information Base: long-lived IPv6-transport-address ↔
//! IPv4-transport-address mappings, dual-indexed for O(1) lookup from
//! either direction.
//!
//! Per the rewrite design note in spec.md §9, BIB entries live in an
//! arena keyed by a stable index rather than being referenced by
//! pointer/`Rc` from two places at once. The two hash indices
//! (`byremote`, `bylocal`) store arena keys; each [`crate::session::Session`]
//! carries its owning [`BibId`] as a back-reference. This sidesteps
//! cyclic ownership while keeping lookup O(1).

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use slab::Slab;

use crate::error::{Error, Result};
use crate::pool4::Pool4;
use crate::session::Session;
use crate::types::{Ipv4TransportAddr, Ipv6TransportAddr, L4Protocol};

/// A stable reference to one [`Bib`] entry: which protocol's arena it
/// lives in, plus its slab key within that arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BibId {
    pub(crate) protocol: L4Protocol,
    pub(crate) key: usize,
}

/// One BIB entry: the IPv6 owner's transport address, the IPv4 transport
/// address borrowed from pool4 on its behalf, and the sessions currently
/// authorized against it.
#[derive(Debug)]
pub struct Bib {
    pub id: BibId,
    pub protocol: L4Protocol,
    pub v6_src: Ipv6TransportAddr,
    pub v4_src: Ipv4TransportAddr,
    sessions: Mutex<Vec<Session>>,
}

impl Bib {
    /// Run `f` against this BIB's session list under its own lock.
    pub fn with_sessions<R>(&self, f: impl FnOnce(&mut Vec<Session>) -> R) -> R {
        let mut guard = self.sessions.lock();
        f(&mut guard)
    }

    /// Whether this BIB currently authorizes any sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

/// Dual-indexed BIB storage, one arena + index pair per protocol.
#[derive(Debug)]
pub struct BibTable {
    arenas: [Mutex<Slab<Arc<Bib>>>; 3],
    byremote: DashMap<(L4Protocol, Ipv6TransportAddr), BibId>,
    bylocal: DashMap<(L4Protocol, Ipv4TransportAddr), BibId>,
}

impl BibTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn arena_index(protocol: L4Protocol) -> usize {
        match protocol {
            L4Protocol::Udp => 0,
            L4Protocol::Tcp => 1,
            L4Protocol::Icmp => 2,
        }
    }

    pub fn lookup_v6(&self, protocol: L4Protocol, v6_src: Ipv6TransportAddr) -> Option<Arc<Bib>> {
        let id = *self.byremote.get(&(protocol, v6_src))?;
        self.get_by_id(id)
    }

    pub fn lookup_v4(&self, protocol: L4Protocol, v4_src: Ipv4TransportAddr) -> Option<Arc<Bib>> {
        let id = *self.bylocal.get(&(protocol, v4_src))?;
        self.get_by_id(id)
    }

    pub fn get_by_id(&self, id: BibId) -> Option<Arc<Bib>> {
        let arena = self.arenas[Self::arena_index(id.protocol)].lock();
        arena.get(id.key).cloned()
    }

    /// Allocate a new BIB entry: borrows a v4 transport address from
    /// `pool4` (preferring `v6_src.port`'s parity/range), then inserts
    /// into both indices.
    pub fn create(
        &self,
        pool4: &Pool4,
        protocol: L4Protocol,
        v6_src: Ipv6TransportAddr,
    ) -> Result<Arc<Bib>> {
        let v4_src = pool4
            .get_any(protocol, v6_src.port)
            .ok_or(Error::PoolExhausted(protocol))?;

        let mut arena = self.arenas[Self::arena_index(protocol)].lock();
        let key = arena.vacant_key();
        let id = BibId { protocol, key };
        let bib = Arc::new(Bib {
            id,
            protocol,
            v6_src,
            v4_src,
            sessions: Mutex::new(Vec::new()),
        });
        arena.insert(bib.clone());
        drop(arena);

        self.byremote.insert((protocol, v6_src), id);
        self.bylocal.insert((protocol, v4_src), id);

        nat64_metrics::metrics::BIB_COUNT
            .with_label_values(&[protocol.label()])
            .inc();
        log::debug!("Created BIB entry {v6_src} <-> {v4_src} ({protocol})");

        Ok(bib)
    }

    /// Destroy a BIB entry and return its v4 transport address to
    /// `pool4`. Precondition: `bib.is_empty()`.
    pub fn remove(&self, pool4: &Pool4, bib: &Bib) {
        debug_assert!(bib.is_empty(), "removing a BIB entry with live sessions");

        self.byremote.remove(&(bib.protocol, bib.v6_src));
        self.bylocal.remove(&(bib.protocol, bib.v4_src));
        self.arenas[Self::arena_index(bib.protocol)]
            .lock()
            .remove(bib.id.key);

        pool4.give_back(bib.protocol, bib.v4_src);

        nat64_metrics::metrics::BIB_COUNT
            .with_label_values(&[bib.protocol.label()])
            .dec();
        log::debug!(
            "Destroyed BIB entry {} <-> {} ({})",
            bib.v6_src,
            bib.v4_src,
            bib.protocol
        );
    }
}

impl Default for BibTable {
    fn default() -> Self {
        Self {
            arenas: [Mutex::new(Slab::new()), Mutex::new(Slab::new()), Mutex::new(Slab::new())],
            byremote: DashMap::new(),
            bylocal: DashMap::new(),
        }
    }
}
