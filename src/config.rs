//! The control-plane configuration surface, spec.md §6.
//!
//! This core has no file-format contract of its own (spec.md explicitly
//! leaves the config IPC wire surface out of scope) — [`Config`] is a
//! plain struct a host application builds and hands to
//! [`crate::Nat64Core::new`]. It uses a `serde` derive with
//! validate-at-construction, so an embedder that *does* want a TOML file
//! can deserialize straight into it.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::Timeouts;

fn default_udp_timeout() -> u64 {
    5 * 60
}

fn default_icmp_timeout() -> u64 {
    60
}

fn default_tcp_est_timeout() -> u64 {
    2 * 60 * 60 + 4 * 60
}

fn default_tcp_trans_timeout() -> u64 {
    4 * 60
}

fn default_tcp_incoming_syn_timeout() -> u64 {
    6
}

/// The six timeout/policy options spec.md §6 names, plus the
/// simultaneous-open policy decision recorded in SPEC_FULL.md §A.8.
///
/// Pool4 mutation (`pool4_add`/`pool4_rm`/`pool4_list`) isn't a config
/// field: those operate on the live pool inside a running
/// [`crate::Nat64Core`], not on data loaded once at startup.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Override default UDP session lifetime, in seconds.
    #[serde(default = "default_udp_timeout")]
    pub udp_timeout: u64,
    /// Override default ICMP session lifetime, in seconds.
    #[serde(default = "default_icmp_timeout")]
    pub icmp_timeout: u64,
    /// Override TCP established lifetime, in seconds.
    #[serde(default = "default_tcp_est_timeout")]
    pub tcp_est_timeout: u64,
    /// Override TCP transitory lifetime, in seconds.
    #[serde(default = "default_tcp_trans_timeout")]
    pub tcp_trans_timeout: u64,
    /// Override the incoming-SYN grace window, in seconds.
    #[serde(default = "default_tcp_incoming_syn_timeout")]
    pub tcp_incoming_syn_timeout: u64,
    /// Whether `CLOSED + 4->syn` creates a provisional
    /// `TCP_INCOMING_SYN` session (RFC 6146 §3.5.2.2 simultaneous open)
    /// instead of dropping the packet. See SPEC_FULL.md §A.8, Open
    /// Question 1. Default `false`: reject unsolicited inbound.
    #[serde(default)]
    pub allow_simultaneous_open: bool,
}

impl Config {
    /// Validate and convert into the [`Timeouts`] the expiry manager
    /// consumes. Zero-second timeouts are rejected at load time: a
    /// zero-length queue timeout would race the sweep worker against
    /// in-flight FSM updates.
    pub fn timeouts(&self) -> Result<Timeouts> {
        let fields = [
            ("udp_timeout", self.udp_timeout),
            ("icmp_timeout", self.icmp_timeout),
            ("tcp_est_timeout", self.tcp_est_timeout),
            ("tcp_trans_timeout", self.tcp_trans_timeout),
            ("tcp_incoming_syn_timeout", self.tcp_incoming_syn_timeout),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be nonzero")));
            }
        }

        Ok(Timeouts {
            udp: Duration::from_secs(self.udp_timeout),
            icmp: Duration::from_secs(self.icmp_timeout),
            tcp_trans: Duration::from_secs(self.tcp_trans_timeout),
            tcp_est: Duration::from_secs(self.tcp_est_timeout),
            tcp_incoming_syn: Duration::from_secs(self.tcp_incoming_syn_timeout),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            udp_timeout: default_udp_timeout(),
            icmp_timeout: default_icmp_timeout(),
            tcp_est_timeout: default_tcp_est_timeout(),
            tcp_trans_timeout: default_tcp_trans_timeout(),
            tcp_incoming_syn_timeout: default_tcp_incoming_syn_timeout(),
            allow_simultaneous_open: false,
        }
    }
}
