//! Prometheus counters and gauges shared by the nat64 core's components.
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod metrics;

#[macro_use]
pub mod macros;
