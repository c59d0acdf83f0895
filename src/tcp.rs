//! The TCP state machine: updates session state and target expiry class
//! from (current state, packet direction, flags), per spec.md §4.5.
//!
//! Encoded as an explicit transition function keyed by
//! `(state, direction, flags)` rather than nested conditionals, per the
//! design note in spec.md §9 — closer to the RFC's own prose and much
//! easier to test exhaustively.

use crate::session::Session;
use crate::types::{Direction, ExpiryClass, L4Protocol, TcpFlags, TcpState};

/// The outcome of one FSM step: the session's new state, and which
/// expiry class (if any) it should be renewed into. `None` means "leave
/// the current deadline alone" (used for the FIN-received states, which
/// intentionally don't get a fresh timeout on every packet, and for a
/// CLOSED session that sees a non-SYN packet, which has nothing to
/// renew yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub new_state: TcpState,
    pub renew: Option<ExpiryClass>,
}

/// Step the TCP FSM for one packet. `session.state` is read but not
/// mutated here — callers apply the returned [`Transition`] themselves
/// so they can also update the expiry queues atomically with the state
/// change.
#[must_use]
pub fn step(state: TcpState, direction: Direction, flags: TcpFlags) -> Transition {
    use Direction::{FromV4, FromV6};
    use TcpState::{Closed, Established, Trans, V4FinRcv, V4SynRcv, V6FinRcv, V6FinV4Fin, V6SynRcv};

    // RST always drives an established session into the transitory
    // class, regardless of direction, per the table in spec.md §4.5.
    if flags.rst && state == Established {
        return Transition {
            new_state: Trans,
            renew: Some(ExpiryClass::TcpTrans),
        };
    }

    match (state, direction, flags.syn, flags.fin) {
        (Closed, FromV6, true, _) => Transition {
            new_state: V6SynRcv,
            renew: Some(ExpiryClass::TcpTrans),
        },
        // A non-SYN packet on a CLOSED session has nothing to drive a
        // transition off of; stay put without touching its deadline.
        (Closed, FromV6, false, _) => Transition {
            new_state: Closed,
            renew: None,
        },
        // CLOSED + 4-> * is handled by the caller (simultaneous-open
        // policy decision lives in crate::filter, per SPEC_FULL.md §A.8
        // Open Question 1) rather than in this pure transition table.
        (Closed, FromV4, _, _) => Transition {
            new_state: Closed,
            renew: Some(ExpiryClass::TcpIncomingSyn),
        },

        (V6SynRcv, FromV4, true, _) => Transition {
            new_state: Established,
            renew: Some(ExpiryClass::TcpEst),
        },
        // Anything else seen while waiting on the IPv4 side's SYN (a
        // retransmitted 6-> SYN, or a non-SYN packet from either side)
        // just holds the session open a while longer.
        (V6SynRcv, _, _, _) => Transition {
            new_state: V6SynRcv,
            renew: Some(ExpiryClass::TcpTrans),
        },

        (V4SynRcv, FromV6, true, _) => Transition {
            new_state: Established,
            renew: Some(ExpiryClass::TcpEst),
        },
        (V4SynRcv, _, _, _) => Transition {
            new_state: V4SynRcv,
            renew: Some(ExpiryClass::TcpTrans),
        },

        (Established, FromV6, _, true) => Transition {
            new_state: V6FinRcv,
            renew: None,
        },
        (Established, FromV4, _, true) => Transition {
            new_state: V4FinRcv,
            renew: None,
        },
        (Established, _, _, _) => Transition {
            new_state: Established,
            renew: Some(ExpiryClass::TcpEst),
        },

        (V6FinRcv, FromV4, _, true) => Transition {
            new_state: V6FinV4Fin,
            renew: Some(ExpiryClass::TcpTrans),
        },
        (V6FinRcv, FromV4, _, false) => Transition {
            new_state: V6FinRcv,
            renew: Some(ExpiryClass::TcpEst),
        },
        (V6FinRcv, FromV6, _, _) => Transition {
            new_state: V6FinRcv,
            renew: None,
        },

        (V4FinRcv, FromV6, _, true) => Transition {
            new_state: V6FinV4Fin,
            renew: Some(ExpiryClass::TcpTrans),
        },
        (V4FinRcv, FromV6, _, false) => Transition {
            new_state: V4FinRcv,
            renew: Some(ExpiryClass::TcpEst),
        },
        (V4FinRcv, FromV4, _, _) => Transition {
            new_state: V4FinRcv,
            renew: None,
        },

        // spec.md §4.5: TRANS | any ¬rst -> ESTABLISHED, TCP_EST. An RST
        // here isn't named in the table; hold the session in TRANS and
        // refresh its transitory deadline rather than inventing a new
        // state for it.
        (Trans, _, _, _) if flags.rst => Transition {
            new_state: Trans,
            renew: Some(ExpiryClass::TcpTrans),
        },
        (Trans, _, _, _) => Transition {
            new_state: Established,
            renew: Some(ExpiryClass::TcpEst),
        },

        (V6FinV4Fin, _, _, _) => Transition {
            new_state: V6FinV4Fin,
            renew: None,
        },
    }
}

/// Step 1 of the expiry sweep (spec.md §4.4): an idle `Established` TCP
/// session is demoted to `Trans` instead of being destroyed outright.
///
/// Only applies to TCP sessions. UDP and ICMP sessions are modeled with
/// a permanent `state == Established` (spec.md §3) that carries no FSM
/// meaning for them, so this must not trigger on protocol alone — doing
/// so would give every idle UDP/ICMP session an undeserved second
/// lifetime in the TCP_TRANS queue.
#[must_use]
pub fn tcp_timeout_demote(session: &mut Session) -> bool {
    session.protocol == L4Protocol::Tcp && session.state == TcpState::Established
}
