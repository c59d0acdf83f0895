//! C6, the filter/update entry point (spec.md §4.6): the one place that
//! ties Pool4, BIB, the session table, the expiry manager and the TCP
//! FSM together into a single `(direction, tuple) -> verdict` call, the
//! same shape a packet-handling loop dispatching by direction into a
//! per-direction handler closure would expect to drive.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ipnet::Ipv6Net;

use crate::bib::BibTable;
use crate::config::Config;
use crate::error::Error;
use crate::expiry::{ExpiryManager, SessionKey};
use crate::pool4::Pool4;
use crate::session::{Session, SessionId};
use crate::tcp;
use crate::types::{Direction, ExpiryClass, Ipv4TransportAddr, Ipv6TransportAddr, L4Protocol, TcpFlags, TcpState, Verdict};

/// One ingress packet's 5-tuple as seen on the IPv6 side, plus whatever
/// TCP flags it carries (ignored for UDP/ICMP).
#[derive(Debug, Clone, Copy)]
pub struct V6Tuple {
    pub protocol: L4Protocol,
    pub src: Ipv6TransportAddr,
    pub dst: Ipv6TransportAddr,
    pub flags: TcpFlags,
}

/// One ingress packet's 5-tuple as seen on the IPv4 side.
#[derive(Debug, Clone, Copy)]
pub struct V4Tuple {
    pub protocol: L4Protocol,
    pub src: Ipv4TransportAddr,
    pub dst: Ipv4TransportAddr,
    pub flags: TcpFlags,
}

/// Ties C1-C5 together behind the single entry point C6 describes.
///
/// Owns no packet parsing or header rewriting of its own — spec.md §1
/// places that with the kernel-hook glue this crate models only as a
/// contract (the `V6Tuple`/`V4Tuple` the caller hands in).
pub struct Nat64Core {
    bibs: BibTable,
    pool4: Pool4,
    expiry: ExpiryManager,
    config: Config,
    nat64_prefix: Ipv6Net,
    next_session_id: AtomicU64,
}

impl Nat64Core {
    /// Construct a new core over `nat64_prefix` (the RFC 6052 prefix
    /// IPv4 addresses are embedded under/extracted from) and `config`.
    pub fn new(nat64_prefix: Ipv6Net, config: Config) -> crate::error::Result<Self> {
        let timeouts = config.timeouts()?;
        Ok(Self {
            bibs: BibTable::new(),
            pool4: Pool4::new(),
            expiry: ExpiryManager::new(timeouts),
            config,
            nat64_prefix,
            next_session_id: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn pool4(&self) -> &Pool4 {
        &self.pool4
    }

    #[must_use]
    pub fn bibs(&self) -> &BibTable {
        &self.bibs
    }

    #[must_use]
    pub fn expiry(&self) -> &ExpiryManager {
        &self.expiry
    }

    fn next_id(&self) -> SessionId {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run one pass of the idle-timeout reaper. See
    /// [`crate::expiry::ExpiryManager::sweep`]; the cadence at which a
    /// caller invokes this is an implementation choice (spec.md §4.4),
    /// not something this core schedules itself.
    pub fn sweep(&self) -> crate::expiry::SweepStats {
        self.expiry.sweep(&self.bibs, &self.pool4)
    }

    fn initial_class(protocol: L4Protocol) -> ExpiryClass {
        match protocol {
            L4Protocol::Udp => ExpiryClass::Udp,
            L4Protocol::Icmp => ExpiryClass::Icmp,
            L4Protocol::Tcp => ExpiryClass::TcpTrans,
        }
    }

    /// IPv6-origin packet. spec.md §4.6 "IPv6 ingress".
    pub fn process_v6(&self, tuple: V6Tuple) -> Verdict {
        let bib = match self.bibs.lookup_v6(tuple.protocol, tuple.src) {
            Some(bib) => bib,
            None => match self.bibs.create(&self.pool4, tuple.protocol, tuple.src) {
                Ok(bib) => bib,
                Err(Error::PoolExhausted(proto)) => {
                    log::warn!("pool4 exhausted for {proto}, dropping new flow from {}", tuple.src);
                    nat64_metrics::metrics::SESSION_EVENTS
                        .with_label_values(&[proto.label(), nat64_metrics::metrics::label_values::EVENT_DROPPED])
                        .inc();
                    return Verdict::Drop;
                }
                Err(other) => {
                    log::warn!("unexpected error creating BIB entry: {other}");
                    return Verdict::Drop;
                }
            },
        };

        let v4_dst = match rfc6052::extract_ipv4_addr(tuple.dst.addr, self.nat64_prefix.prefix_len()) {
            Ok(addr) => addr,
            Err(e) => {
                log::warn!("cannot extract embedded IPv4 address: {e}");
                return Verdict::Drop;
            }
        };
        let v4_dst_port = tuple.dst.port;

        let existing = bib.with_sessions(|sessions| {
            sessions
                .iter()
                .find(|s| s.matches_v4_peer(v4_dst, v4_dst_port))
                .map(|s| s.id)
        });

        let session_id = match existing {
            Some(id) => id,
            None => self.create_session(&bib, tuple.protocol, tuple.src, tuple.dst, v4_dst, v4_dst_port),
        };

        self.apply_fsm(&bib, session_id, Direction::FromV6, tuple.protocol, tuple.flags);
        Verdict::Accept
    }

    /// IPv4-origin packet. spec.md §4.6 "IPv4 ingress".
    pub fn process_v4(&self, tuple: V4Tuple) -> Verdict {
        let Some(bib) = self.bibs.lookup_v4(tuple.protocol, tuple.dst) else {
            log::trace!("no BIB for inbound IPv4 tuple dst={}", tuple.dst);
            nat64_metrics::metrics::SESSION_EVENTS
                .with_label_values(&[tuple.protocol.label(), nat64_metrics::metrics::label_values::EVENT_DROPPED])
                .inc();
            return Verdict::Drop;
        };

        let existing = bib.with_sessions(|sessions| {
            sessions
                .iter()
                .find(|s| s.matches_v4_peer(tuple.src.addr, tuple.src.port))
                .map(|s| s.id)
        });

        let session_id = match existing {
            Some(id) => id,
            None => {
                if tuple.protocol == L4Protocol::Tcp && self.config.allow_simultaneous_open {
                    let v6_dst = Ipv6TransportAddr::new(
                        self.embed(tuple.src.addr),
                        tuple.src.port,
                    );
                    self.create_session(&bib, tuple.protocol, bib.v6_src, v6_dst, tuple.src.addr, tuple.src.port)
                } else {
                    log::trace!("no session for inbound tuple {tuple:?}, dropping");
                    return Verdict::Drop;
                }
            }
        };

        self.apply_fsm(&bib, session_id, Direction::FromV4, tuple.protocol, tuple.flags);
        Verdict::Accept
    }

    fn embed(&self, v4_addr: Ipv4Addr) -> Ipv6Addr {
        rfc6052::embed_ipv4_addr(v4_addr, self.nat64_prefix)
            .unwrap_or_else(|_| unsafe { rfc6052::embed_ipv4_addr_unchecked(v4_addr, self.nat64_prefix) })
    }

    fn create_session(
        &self,
        bib: &crate::bib::Bib,
        protocol: L4Protocol,
        v6_src: Ipv6TransportAddr,
        v6_dst: Ipv6TransportAddr,
        v4_dst: Ipv4Addr,
        v4_dst_port: u16,
    ) -> SessionId {
        let class = Self::initial_class(protocol);
        let deadline = Instant::now() + self.expiry.timeouts().get(class);
        let id = self.next_id();
        let session = Session {
            id,
            bib_id: bib.id,
            protocol,
            v6_src,
            v6_dst,
            v4_dst,
            v4_dst_port,
            state: TcpState::Closed,
            expiry_class: class,
            deadline,
        };
        bib.with_sessions(|sessions| sessions.push(session));
        self.expiry.enqueue(
            class,
            SessionKey {
                bib_id: bib.id,
                session_id: id,
            },
        );
        nat64_metrics::metrics::SESSION_COUNT.with_label_values(&[protocol.label()]).inc();
        nat64_metrics::metrics::SESSION_EVENTS
            .with_label_values(&[protocol.label(), nat64_metrics::metrics::label_values::EVENT_CREATED])
            .inc();
        log::debug!("Created session {id} on BIB {:?} ({protocol})", bib.id);
        id
    }

    /// Apply either the TCP FSM or a same-class renewal to the session
    /// identified by `session_id` on `bib`, per spec.md §4.6 step 3.
    fn apply_fsm(&self, bib: &crate::bib::Bib, session_id: SessionId, direction: Direction, protocol: L4Protocol, flags: TcpFlags) {
        if protocol != L4Protocol::Tcp {
            let class = Self::initial_class(protocol);
            let key = SessionKey {
                bib_id: bib.id,
                session_id,
            };
            let deadline = self.expiry.renew(class, class, key);
            bib.with_sessions(|sessions| {
                if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
                    session.deadline = deadline;
                }
            });
            nat64_metrics::metrics::SESSION_EVENTS
                .with_label_values(&[protocol.label(), nat64_metrics::metrics::label_values::EVENT_RENEWED])
                .inc();
            return;
        }

        let old_class = bib.with_sessions(|sessions| {
            sessions.iter().find(|s| s.id == session_id).map(|s| (s.state, s.expiry_class))
        });
        let Some((state, old_class)) = old_class else {
            return;
        };

        let transition = tcp::step(state, direction, flags);
        let key = SessionKey {
            bib_id: bib.id,
            session_id,
        };

        let new_deadline = transition.renew.map(|new_class| self.expiry.renew(old_class, new_class, key));

        bib.with_sessions(|sessions| {
            if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
                session.state = transition.new_state;
                if let Some(new_class) = transition.renew {
                    session.expiry_class = new_class;
                }
                if let Some(deadline) = new_deadline {
                    session.deadline = deadline;
                }
            }
        });

        if new_deadline.is_some() {
            nat64_metrics::metrics::SESSION_EVENTS
                .with_label_values(&[protocol.label(), nat64_metrics::metrics::label_values::EVENT_RENEWED])
                .inc();
        }
    }
}
