use lazy_static::lazy_static;

pub mod label_values {
    /// UDP protocol
    pub const PROTOCOL_UDP: &str = "udp";
    /// TCP protocol
    pub const PROTOCOL_TCP: &str = "tcp";
    /// ICMP protocol
    pub const PROTOCOL_ICMP: &str = "icmp";

    /// A session was newly created
    pub const EVENT_CREATED: &str = "created";
    /// A session was renewed (its deadline pushed out)
    pub const EVENT_RENEWED: &str = "renewed";
    /// A session/BIB entry was reaped by the expiry sweep
    pub const EVENT_EXPIRED: &str = "expired";
    /// A packet was dropped by the filtering subsystem
    pub const EVENT_DROPPED: &str = "dropped";
}

lazy_static! {
    /// Number of BIB entries currently alive, per protocol
    pub static ref BIB_COUNT: prometheus::IntGaugeVec = prometheus::register_int_gauge_vec!(
        "nat64_bib_entries",
        "Number of live BIB entries",
        &["protocol"]
    ).unwrap();

    /// Number of session table entries currently alive, per protocol
    pub static ref SESSION_COUNT: prometheus::IntGaugeVec = prometheus::register_int_gauge_vec!(
        "nat64_session_entries",
        "Number of live session table entries",
        &["protocol"]
    ).unwrap();

    /// Counter for session lifecycle events
    pub static ref SESSION_EVENTS: prometheus::IntCounterVec = prometheus::register_int_counter_vec!(
        "nat64_session_events",
        "Number of session lifecycle events",
        &["protocol", "event"]
    ).unwrap();

    /// Counter for pool4 allocation failures
    pub static ref POOL4_EXHAUSTED: prometheus::IntCounterVec = prometheus::register_int_counter_vec!(
        "nat64_pool4_exhausted",
        "Number of times a pool4 section had no free port to hand out",
        &["protocol"]
    ).unwrap();

    /// Gauge for the number of IPv4 addresses registered in the pool
    pub static ref POOL4_ADDRESSES: prometheus::IntGauge = prometheus::register_int_gauge!(
        "nat64_pool4_addresses",
        "Number of IPv4 addresses registered in the pool"
    ).unwrap();
}
