//! Integration coverage for spec.md §8's scenarios (S1-S6) and laws,
//! exercised entirely through the crate's public API rather than its
//! internals.

use std::net::{Ipv4Addr, Ipv6Addr};

use nat64_core::config::Config;
use nat64_core::filter::{Nat64Core, V4Tuple, V6Tuple};
use nat64_core::types::{Ipv4TransportAddr, Ipv6TransportAddr, L4Protocol, TcpFlags, Verdict};

fn core_with_pool(addrs: &[&str]) -> Nat64Core {
    let core = Nat64Core::new("64:ff9b::/96".parse().unwrap(), Config::default()).unwrap();
    for addr in addrs {
        core.pool4().register(addr.parse().unwrap()).unwrap();
    }
    core
}

fn v6(addr: &str, port: u16) -> Ipv6TransportAddr {
    Ipv6TransportAddr::new(addr.parse::<Ipv6Addr>().unwrap(), port)
}

fn v4(addr: &str, port: u16) -> Ipv4TransportAddr {
    Ipv4TransportAddr::new(addr.parse::<Ipv4Addr>().unwrap(), port)
}

fn syn() -> TcpFlags {
    TcpFlags {
        syn: true,
        ..Default::default()
    }
}

fn fin() -> TcpFlags {
    TcpFlags {
        fin: true,
        ..Default::default()
    }
}

/// S1: UDP happy path, both directions, with reverse translation
/// implied by the BIB/session the core builds.
#[test]
fn s1_udp_happy_path() {
    let core = core_with_pool(&["203.0.113.5"]);

    let verdict = core.process_v6(V6Tuple {
        protocol: L4Protocol::Udp,
        src: v6("2001:db8::a", 4000),
        dst: v6("64:ff9b::c633:6407", 53), // 64:ff9b::198.51.100.7
        flags: TcpFlags::default(),
    });
    assert_eq!(verdict, Verdict::Accept);

    let bib = core.bibs().lookup_v6(L4Protocol::Udp, v6("2001:db8::a", 4000)).unwrap();
    assert_eq!(bib.v4_src.addr, "203.0.113.5".parse::<Ipv4Addr>().unwrap());
    assert_eq!(bib.v4_src.port, 4000);

    // the reply from the IPv4 peer must resolve back to the same BIB
    let reply_verdict = core.process_v4(V4Tuple {
        protocol: L4Protocol::Udp,
        src: v4("198.51.100.7", 53),
        dst: bib.v4_src,
        flags: TcpFlags::default(),
    });
    assert_eq!(reply_verdict, Verdict::Accept);

    bib.with_sessions(|sessions| {
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].v4_dst, "198.51.100.7".parse::<Ipv4Addr>().unwrap());
        assert_eq!(sessions[0].v4_dst_port, 53);
    });
}

/// S2: an odd, high IPv6 source port must come back as an odd, high
/// IPv4 port.
#[test]
fn s2_port_parity_preservation() {
    let core = core_with_pool(&["203.0.113.5"]);

    core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: v6("2001:db8::a", 4001),
        dst: v6("64:ff9b::c633:6407", 443),
        flags: syn(),
    });

    let bib = core.bibs().lookup_v6(L4Protocol::Tcp, v6("2001:db8::a", 4001)).unwrap();
    assert_eq!(bib.v4_src.port % 2, 1);
    assert!(bib.v4_src.port >= 1025);
}

/// S3: pool exhaustion on the 65,535th even-high request drops the
/// packet and never allocates a BIB for it.
#[test]
fn s3_pool_exhaustion_drops() {
    let core = core_with_pool(&["203.0.113.5"]);

    // even-high section: (65534-1024)/2 + 1 = 32256 ports
    for i in 0..32256u32 {
        let addr = Ipv6Addr::from(0x2001_0db8_0000_0000_0000_0000_0000_0000u128 + i as u128);
        let verdict = core.process_v6(V6Tuple {
            protocol: L4Protocol::Tcp,
            src: Ipv6TransportAddr::new(addr, 4000),
            dst: v6("64:ff9b::c633:6407", 443),
            flags: syn(),
        });
        assert_eq!(verdict, Verdict::Accept, "allocation {i} should have succeeded");
    }

    let overflow_addr = Ipv6Addr::from(0x2001_0db8_0000_0000_0000_0000_0000_0000u128 + 32256);
    let verdict = core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: Ipv6TransportAddr::new(overflow_addr, 4000),
        dst: v6("64:ff9b::c633:6407", 443),
        flags: syn(),
    });
    assert_eq!(verdict, Verdict::Drop);
    assert!(core
        .bibs()
        .lookup_v6(L4Protocol::Tcp, Ipv6TransportAddr::new(overflow_addr, 4000))
        .is_none());
}

/// S4: 6->syn, 4->syn, 6->data, 6->fin, 4->fin drives CLOSED all the
/// way to V6_FIN_V4_FIN.
#[test]
fn s4_tcp_fsm_sequence() {
    let core = core_with_pool(&["203.0.113.5"]);
    let remote_v6 = v6("2001:db8::a", 4000);
    let remote_v4 = v4("198.51.100.7", 80);

    core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v6,
        dst: v6("64:ff9b::c633:6407", 80),
        flags: syn(),
    });
    let bib = core.bibs().lookup_v6(L4Protocol::Tcp, remote_v6).unwrap();

    core.process_v4(V4Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v4,
        dst: bib.v4_src,
        flags: syn(),
    });
    core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v6,
        dst: v6("64:ff9b::c633:6407", 80),
        flags: TcpFlags::default(),
    });
    core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v6,
        dst: v6("64:ff9b::c633:6407", 80),
        flags: fin(),
    });
    core.process_v4(V4Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v4,
        dst: bib.v4_src,
        flags: fin(),
    });

    bib.with_sessions(|sessions| {
        let session = &sessions[0];
        assert_eq!(session.state, nat64_core::types::TcpState::V6FinV4Fin);
    });
}

/// S6: an inbound IPv4 packet with no prior BIB is dropped.
#[test]
fn s6_inbound_before_outbound_is_dropped() {
    let core = core_with_pool(&["203.0.113.5"]);
    let verdict = core.process_v4(V4Tuple {
        protocol: L4Protocol::Udp,
        src: v4("198.51.100.1", 1234),
        dst: v4("203.0.113.5", 9999),
        flags: TcpFlags::default(),
    });
    assert_eq!(verdict, Verdict::Drop);
}

/// Round-trip law: an IPv6 outbound packet followed by its IPv4 reply
/// resolves to the same BIB/session, i.e. back to the originating IPv6
/// tuple under reverse translation.
#[test]
fn round_trip_law() {
    let core = core_with_pool(&["203.0.113.5"]);
    let src = v6("2001:db8::a", 5000);

    core.process_v6(V6Tuple {
        protocol: L4Protocol::Udp,
        src,
        dst: v6("64:ff9b::c633:6407", 53),
        flags: TcpFlags::default(),
    });
    let bib = core.bibs().lookup_v6(L4Protocol::Udp, src).unwrap();

    core.process_v4(V4Tuple {
        protocol: L4Protocol::Udp,
        src: v4("198.51.100.7", 53),
        dst: bib.v4_src,
        flags: TcpFlags::default(),
    });

    // the only BIB bound to this v4 address is still the original IPv6 owner
    let round_tripped = core.bibs().lookup_v4(L4Protocol::Udp, bib.v4_src).unwrap();
    assert_eq!(round_tripped.v6_src, src);
}

/// Idempotent-renew law: two renewals in the same tick (same direction,
/// same flags) leave exactly one session in one queue, with the later
/// deadline winning.
#[test]
fn idempotent_renew_law() {
    let core = core_with_pool(&["203.0.113.5"]);
    let src = v6("2001:db8::a", 6000);
    let tuple = V6Tuple {
        protocol: L4Protocol::Udp,
        src,
        dst: v6("64:ff9b::c633:6407", 53),
        flags: TcpFlags::default(),
    };

    core.process_v6(tuple);
    let bib = core.bibs().lookup_v6(L4Protocol::Udp, src).unwrap();
    let first_deadline = bib.with_sessions(|sessions| sessions[0].deadline);

    core.process_v6(tuple);
    bib.with_sessions(|sessions| {
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].deadline >= first_deadline);
    });
}

/// BIB-reclaim law: destroying the last session of a BIB returns its
/// pool4 port, and a subsequent request for the same port may receive
/// it back.
#[test]
fn bib_reclaim_law() {
    let core = core_with_pool(&["203.0.113.5"]);
    let src = v6("2001:db8::a", 7000);

    core.process_v6(V6Tuple {
        protocol: L4Protocol::Udp,
        src,
        dst: v6("64:ff9b::c633:6407", 53),
        flags: TcpFlags::default(),
    });
    let bib = core.bibs().lookup_v6(L4Protocol::Udp, src).unwrap();
    let v4_src = bib.v4_src;
    // simulate the expiry manager having already unlinked the session
    bib.with_sessions(|sessions| sessions.clear());

    core.bibs().remove(core.pool4(), &bib);
    assert!(core.bibs().lookup_v6(L4Protocol::Udp, src).is_none());

    let reallocated = core.pool4().get_any(L4Protocol::Udp, v4_src.port).unwrap();
    assert_eq!(reallocated, v4_src);
}

/// S5 via the public `sweep()` entry point: an idle ESTABLISHED TCP
/// session demotes to TRANS on its first expiry, then is destroyed
/// (reclaiming its BIB) on the next.
#[test]
fn s5_idle_demotion_then_reap() {
    use std::time::Duration;

    // zero timeouts are rejected at construction, so the default core is
    // used and the session's deadline is pushed into the past directly
    // to simulate "the sweep cadence caught up with an idle flow".
    let core = core_with_pool(&["203.0.113.5"]);
    let remote_v6 = v6("2001:db8::a", 4000);
    let remote_v4 = v4("198.51.100.7", 80);

    core.process_v6(V6Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v6,
        dst: v6("64:ff9b::c633:6407", 80),
        flags: syn(),
    });
    let bib = core.bibs().lookup_v6(L4Protocol::Tcp, remote_v6).unwrap();
    core.process_v4(V4Tuple {
        protocol: L4Protocol::Tcp,
        src: remote_v4,
        dst: bib.v4_src,
        flags: syn(),
    });

    // force the session into the past so the first sweep reaps it
    bib.with_sessions(|sessions| {
        sessions[0].deadline = std::time::Instant::now() - Duration::from_secs(1);
    });
    assert_eq!(bib.with_sessions(|s| s[0].state), nat64_core::types::TcpState::Established);

    let stats = core.sweep();
    assert_eq!(stats.demoted, 1);
    assert_eq!(bib.with_sessions(|s| s[0].state), nat64_core::types::TcpState::Trans);

    bib.with_sessions(|sessions| {
        sessions[0].deadline = std::time::Instant::now() - Duration::from_secs(1);
    });
    let stats2 = core.sweep();
    assert_eq!(stats2.reaped_sessions, 1);
    assert_eq!(stats2.reaped_bibs, 1);
    assert!(core.bibs().lookup_v6(L4Protocol::Tcp, remote_v6).is_none());
}
