//! The expiry manager: five FIFO timeout queues, garbage-collecting
//! idle sessions without a per-session timer.
//!
//! This is, per spec.md §9, the single most important performance
//! decision in the whole design and must be preserved: instead of N
//! timers for N sessions, each of the five [`ExpiryClass`] queues is
//! kept in non-decreasing deadline order simply by always appending new
//! or renewed sessions at the tail (every class has one fixed timeout,
//! so later insertion implies later deadline). A sweep only ever needs
//! to look at the head of each queue.

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;

use crate::bib::{Bib, BibId, BibTable};
use crate::pool4::Pool4;
use crate::session::{SessionId, Timeouts};
use crate::tcp::tcp_timeout_demote;
use crate::types::{ExpiryClass, TcpState};

/// Identifies one live session for the purposes of queue membership:
/// which BIB owns it, and its process-wide session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey {
    pub bib_id: BibId,
    pub session_id: SessionId,
}

fn class_index(class: ExpiryClass) -> usize {
    match class {
        ExpiryClass::Udp => 0,
        ExpiryClass::Icmp => 1,
        ExpiryClass::TcpTrans => 2,
        ExpiryClass::TcpEst => 3,
        ExpiryClass::TcpIncomingSyn => 4,
    }
}

/// Statistics from one sweep pass, mostly useful for tests and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub demoted: usize,
    pub reaped_sessions: usize,
    pub reaped_bibs: usize,
}

pub struct ExpiryManager {
    queues: [Mutex<VecDeque<SessionKey>>; 5],
    timeouts: Mutex<Timeouts>,
}

impl ExpiryManager {
    #[must_use]
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            queues: [
                Mutex::new(VecDeque::new()),
                Mutex::new(VecDeque::new()),
                Mutex::new(VecDeque::new()),
                Mutex::new(VecDeque::new()),
                Mutex::new(VecDeque::new()),
            ],
            timeouts: Mutex::new(timeouts),
        }
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        *self.timeouts.lock()
    }

    pub fn set_timeouts(&self, timeouts: Timeouts) {
        *self.timeouts.lock() = timeouts;
    }

    /// Append a session to the tail of its class's queue. Callers must
    /// ensure the session's `deadline` field has already been set to
    /// `now + timeout(class)`, keeping the queue's non-decreasing-order
    /// invariant.
    pub fn enqueue(&self, class: ExpiryClass, key: SessionKey) {
        self.queues[class_index(class)].lock().push_back(key);
    }

    /// Remove a specific session from `class`'s queue (used by `renew`
    /// when a session moves to a different class, and by direct
    /// destruction paths like FIN teardown).
    ///
    /// O(n) in queue length: a production build would use an intrusive
    /// doubly-linked list per design note §9 for O(1) unlink; this
    /// reference implementation favors the simpler `VecDeque` since
    /// session churn during a renewal is dominated by the FSM lookup
    /// cost anyway.
    pub fn remove(&self, class: ExpiryClass, key: SessionKey) {
        let mut queue = self.queues[class_index(class)].lock();
        if let Some(pos) = queue.iter().position(|k| *k == key) {
            queue.remove(pos);
        }
    }

    /// Move a session from `old_class` to `new_class` with a fresh
    /// deadline of `now + timeout(new_class)`. Returns the new deadline
    /// so the caller can update the `Session` record itself.
    pub fn renew(&self, old_class: ExpiryClass, new_class: ExpiryClass, key: SessionKey) -> Instant {
        self.remove(old_class, key);
        let deadline = Instant::now() + self.timeouts().get(new_class);
        self.enqueue(new_class, key);
        deadline
    }

    /// Walk every queue from the head, reaping expired sessions (and
    /// cascading BIB/pool4 reclaim) until the first not-yet-expired
    /// entry is hit. Safe to call from a single dedicated periodic
    /// worker; correctness only requires sweep frequency <= the
    /// shortest configured timeout class.
    pub fn sweep(&self, bibs: &BibTable, pool4: &Pool4) -> SweepStats {
        let mut stats = SweepStats::default();
        let now = Instant::now();

        for class in ExpiryClass::ALL {
            loop {
                let head = { self.queues[class_index(class)].lock().front().copied() };
                let Some(key) = head else { break };

                let Some(bib) = bibs.get_by_id(key.bib_id) else {
                    // BIB already gone (e.g. removed out-of-band); drop the stale key.
                    self.queues[class_index(class)].lock().pop_front();
                    continue;
                };

                let expired = bib.with_sessions(|sessions| {
                    sessions
                        .iter()
                        .find(|s| s.id == key.session_id)
                        .map(|s| now > s.deadline)
                });

                match expired {
                    None => {
                        // Session already gone from its BIB; drop the stale key.
                        self.queues[class_index(class)].lock().pop_front();
                        continue;
                    }
                    Some(false) => break, // queue is time-ordered: nothing further has expired
                    Some(true) => {
                        self.queues[class_index(class)].lock().pop_front();
                        self.reap_one(bibs, pool4, &bib, key, class, &mut stats);
                    }
                }
            }
        }

        stats
    }

    /// Handle one expired `(bib, session)` pair: demote TCP
    /// `Established` sessions into `TcpTrans` instead of killing them,
    /// otherwise unlink the session and, if that empties the BIB,
    /// destroy the BIB (returning its pool4 port).
    fn reap_one(
        &self,
        bibs: &BibTable,
        pool4: &Pool4,
        bib: &Bib,
        key: SessionKey,
        class: ExpiryClass,
        stats: &mut SweepStats,
    ) {
        let demoted = bib.with_sessions(|sessions| {
            let Some(session) = sessions.iter_mut().find(|s| s.id == key.session_id) else {
                return None;
            };
            if tcp_timeout_demote(session) {
                session.state = TcpState::Trans;
                session.expiry_class = ExpiryClass::TcpTrans;
                session.deadline = Instant::now() + self.timeouts().get(ExpiryClass::TcpTrans);
                Some(())
            } else {
                None
            }
        });

        if demoted.is_some() {
            self.enqueue(ExpiryClass::TcpTrans, key);
            stats.demoted += 1;
            log::trace!("Idle-demoted session {:?} on BIB {:?} to TCP_TRANS", key.session_id, bib.id);
            return;
        }

        let now_empty = bib.with_sessions(|sessions| {
            if let Some(pos) = sessions.iter().position(|s| s.id == key.session_id) {
                sessions.remove(pos);
            }
            sessions.is_empty()
        });
        stats.reaped_sessions += 1;
        nat64_metrics::metrics::SESSION_EVENTS
            .with_label_values(&[bib.protocol.label(), nat64_metrics::metrics::label_values::EVENT_EXPIRED])
            .inc();
        nat64_metrics::metrics::SESSION_COUNT
            .with_label_values(&[bib.protocol.label()])
            .dec();
        log::debug!("Reaped session {:?} from class {:?}", key.session_id, class);

        if now_empty {
            bibs.remove(pool4, bib);
            stats.reaped_bibs += 1;
        }
    }
}
