use typed_builder::TypedBuilder;

// Size of the fixed header that starts every message.
pub const HEADER_LEN: usize = 12;
// QR bit, lives in the first flag byte (offset 2).
pub const RESPONSE_FLAG: u8 = 0x80;
// REFUSED in the RCODE nibble of the second flag byte (offset 3).
pub const REFUSED_FLAGS: u8 = ResponseCode::REFUSED as u8;

// A query as this crate writes it: a header followed by exactly one question. The relay never
// builds one of these for traffic it forwards, it only inspects and patches raw bytes.
//
//     +---------------------+
//     |        Header       |
//     +---------------------+
//     |       Question      | the question for the name server
//     +---------------------+
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct DnsQuery {
    pub header: DnsHeader,
    pub question: DnsQuestion,
}

// The header contains the following fields:
//                                  1  1  1  1  1  1
//    0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                      ID                       |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                    QDCOUNT                    |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                    ANCOUNT                    |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                    NSCOUNT                    |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                    ARCOUNT                    |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
// Only the fields this crate reads or writes are kept; AA, TC, Z, AD, CD and the answer,
// authority and additional counts are written as zero and skipped when parsing.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct DnsHeader {
    // Copied verbatim into the response, so clients can pair answers with questions.
    pub id: u16,

    // 0 for queries, 1 for responses.
    #[builder(default = false)]
    pub response: bool,

    // Kind of query: 0 QUERY, 1 IQUERY, 2 STATUS, 3-15 reserved.
    #[builder(default = 0)]
    pub opcode: u8,
    // Recursion Desired - set in a query and copied into the response.
    #[builder(default = false)]
    pub recursion_desired: bool,

    #[builder(default = false)]
    pub recursion_available: bool,
    #[builder(default = ResponseCode::NOERROR)]
    pub rescode: ResponseCode, // 4 bits

    #[builder(default = 0)]
    pub questions: u16,
}

impl DnsHeader {
    pub fn flags(&self) -> u16 {
        (self.rescode as u16)
            | ((self.recursion_available as u16) << 7)
            | ((self.recursion_desired as u16) << 8)
            | (((self.opcode & 0x0F) as u16) << 11)
            | ((self.response as u16) << 15)
    }
}

//  Response code - this 4 bit field is set as part of responses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    NOERROR = 0,
    // The name server was unable to interpret the query.
    FORMERR = 1,
    // The name server was unable to process this query due to a problem with the name server.
    SERVFAIL = 2,
    NXDOMAIN = 3,
    NOTIMP = 4,
    // The name server refuses to perform the specified operation for policy reasons.
    REFUSED = 5,
    //  6-15  Reserved for future use.
}

impl ResponseCode {
    pub fn from_num(num: u8) -> ResponseCode {
        match num & 0x0F {
            1 => ResponseCode::FORMERR,
            2 => ResponseCode::SERVFAIL,
            3 => ResponseCode::NXDOMAIN,
            4 => ResponseCode::NOTIMP,
            5 => ResponseCode::REFUSED,
            _ => ResponseCode::NOERROR,
        }
    }
}

// The question section carries the parameters that define what is being asked:
//                                  1  1  1  1  1  1
//    0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  /                     QNAME                     /
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                     QTYPE                     |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//  |                     QCLASS                    |
//  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    // Dotted name without the trailing dot
    pub name: String,
    pub qtype: QueryType,
    // The class is always IN (1), so we will not represent it here
}

#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum QueryType {
    UNKNOWN(u16),
    A,
    CNAME,
    NS,
    MX,
    AAAA,
}

impl QueryType {
    pub fn to_num(self) -> u16 {
        match self {
            QueryType::UNKNOWN(x) => x,
            QueryType::A => 1,
            QueryType::CNAME => 5,
            QueryType::NS => 2,
            QueryType::MX => 15,
            QueryType::AAAA => 28,
        }
    }
}
