//! # nat64-core
//!
//! The filtering-and-updating core of a stateful NAT64 translator: the
//! Binding Information Base, the Session Table, the IPv4
//! transport-address pool, the TCP state machine, and the expiry
//! manager that reclaims idle flows without per-session timers.
//!
//! This crate models packet *state*, not packet *bytes* — header
//! parsing/rewriting, checksum recomputation, the kernel hook glue,
//! SIIT, ICMP-error translation, and DNS64 are all external
//! collaborators a host application supplies; see
//! [`filter::Nat64Core::process_v6`]/[`filter::Nat64Core::process_v4`]
//! for the contract a hook is expected to drive this crate through.

#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod bib;
pub mod config;
pub mod error;
pub mod expiry;
pub mod filter;
pub mod logging;
pub mod pool4;
pub mod session;
pub mod tcp;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{Nat64Core, V4Tuple, V6Tuple};
pub use types::{Direction, Ipv4TransportAddr, Ipv6TransportAddr, L4Protocol, TcpFlags, Verdict};
