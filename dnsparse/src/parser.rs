use crate::types::{DnsHeader, ResponseCode, HEADER_LEN};
use log::trace;
use nom::{
    bytes::complete::{tag, take as take_bytes},
    error::ParseError,
    multi::many_till,
    number::complete::{be_u16, be_u8},
    IResult,
};

const ROOT_LABEL: &[u8] = &[0x00];

// A single length-prefixed label. Lengths with the top two bits set (compression pointers) are
// not special-cased here, they are read as plain lengths. Reads never go past the input slice.
// Label octets are kept as they are; DNS does not promise UTF-8.
fn domain_fragment<'a, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], &'a [u8], E>
where
    E: ParseError<&'a [u8]>,
{
    |input| {
        let (rest, size) = be_u8(input)?;
        take_bytes(size as usize)(rest)
    }
}

fn domain_name<'a, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], Vec<u8>, E>
where
    E: ParseError<&'a [u8]>,
{
    |input| {
        let (rest, (fragments, _root)) =
            many_till(domain_fragment::<E>(), tag(ROOT_LABEL))(input)?;
        trace!("fragments: {:x?}", fragments);

        Ok((rest, fragments.join(&b'.')))
    }
}

fn header<'a, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], DnsHeader, E>
where
    E: ParseError<&'a [u8]>,
{
    |input| {
        // network order is big endian
        let (rest, id) = be_u16(input)?;

        let (rest, a) = be_u8(rest)?;
        let (rest, b) = be_u8(rest)?;

        let recursion_desired = (a & (1 << 0)) > 0;
        let opcode = (a >> 3) & 0x0F;
        let response = (a & (1 << 7)) > 0;
        let rescode = ResponseCode::from_num(b & 0x0F);
        let recursion_available = (b & (1 << 7)) > 0;

        let (rest, questions) = be_u16(rest)?;
        // answer, authority and additional counts
        let (rest, _counts) = take_bytes(6usize)(rest)?;

        let dns_header = DnsHeader {
            id,

            response,
            opcode,
            recursion_desired,

            recursion_available,
            rescode,

            questions,
        };

        Ok((rest, dns_header))
    }
}

// QNAME of the first question; QTYPE/QCLASS are left unread.
fn question_name<'a, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], Vec<u8>, E>
where
    E: ParseError<&'a [u8]>,
{
    |input| {
        let (rest, _header) = take_bytes(HEADER_LEN)(input)?;
        domain_name::<E>()(rest)
    }
}

/// Extracts the requested domain from a raw query, dot-joined and without the trailing dot.
/// The name comes back as the raw label octets; decode it only for display.
///
/// The slice is the hard bound: a label running past it or a missing terminator is an error,
/// never a read beyond the datagram.
pub fn query_name(packet: &[u8]) -> Result<Vec<u8>, String> {
    match question_name::<nom::error::Error<&[u8]>>()(packet) {
        Ok((_rest, name)) => Ok(name),
        Err(e) => Err(format!("Parsing Error: {:?}", e)),
    }
}

pub fn parse_header(packet: &[u8]) -> Result<DnsHeader, String> {
    match header::<nom::error::Error<&[u8]>>()(packet) {
        Ok((_rest, header)) => Ok(header),
        Err(e) => Err(format!("Parsing Error: {:?}", e)),
    }
}
