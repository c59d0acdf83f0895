//! Crate-wide error type.
//!
//! Data-plane variants (`PoolExhausted`, `AllocFail`, `NoBinding`) are
//! never allowed to propagate out of [`crate::filter::process`] — the
//! filter entry point matches on them internally and turns them into a
//! [`crate::types::Verdict::Drop`] plus a metrics counter bump. They're
//! still part of this enum because the components beneath the entry
//! point (`Pool4`, `BibTable`) need a real error to return to their
//! direct callers, including tests.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No IPv4 transport address was available for a new BIB entry.
    #[error("pool4 exhausted for protocol {0}")]
    PoolExhausted(crate::types::L4Protocol),

    /// An internal allocator refused an otherwise-valid request (e.g. a
    /// free-list node could not be pushed).
    #[error("internal allocator failure: {0}")]
    AllocFail(String),

    /// An IPv4-origin packet arrived with no matching BIB entry.
    #[error("no binding for inbound IPv4 tuple")]
    NoBinding,

    /// A pool4 configuration operation referenced an address that isn't
    /// registered.
    #[error("address not found in pool4")]
    NotFound,

    /// A pool4 address was present in a strict subset of the
    /// per-protocol pools it should be present in uniformly.
    #[error("pool4 internal state inconsistent for this address")]
    Inconsistent,

    /// An address was already registered; `register` is not idempotent.
    #[error("address already present in pool4")]
    AlreadyPresent,

    /// A control-plane configuration value was invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
