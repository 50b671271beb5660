pub mod blocklist;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod relay;

pub use blocklist::Blocklist;
pub use config::{Config, Opt};
pub use error::Error;
pub use forwarder::{Forwarder, UPSTREAM_PORT};
pub use relay::{FailurePolicy, Relay, Verdict};

pub use dnsparse::{
    parse_header, query_name, refuse, server_failure, write_query, DnsHeader, DnsQuery,
    DnsQuestion, QueryType, ResponseCode,
};

// Largest datagram read from a client or from the upstream resolver.
pub const MAX_PACKET_SIZE: usize = 1024;
