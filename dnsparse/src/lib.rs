mod parser;
mod types;
mod writer;

pub use types::{
    DnsHeader, DnsQuery, DnsQuestion, QueryType, ResponseCode, HEADER_LEN, REFUSED_FLAGS,
    RESPONSE_FLAG,
};

pub use parser::{parse_header, query_name};
pub use writer::{refuse, server_failure, write_query};
