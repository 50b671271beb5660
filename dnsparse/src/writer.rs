use crate::types::{DnsHeader, DnsQuery, DnsQuestion, ResponseCode, REFUSED_FLAGS, RESPONSE_FLAG};

struct BytePacketBuffer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BytePacketBuffer<'a> {
    pub fn new(buffer: &'a mut [u8]) -> BytePacketBuffer<'a> {
        BytePacketBuffer {
            buf: buffer,
            pos: 0,
        }
    }

    fn write(&mut self, val: u8) -> anyhow::Result<()> {
        if self.pos >= self.buf.len() {
            anyhow::bail!("End of buffer")
        }
        self.buf[self.pos] = val;
        self.pos += 1;
        Ok(())
    }

    fn write_u8(&mut self, val: u8) -> anyhow::Result<()> {
        self.write(val)?;

        Ok(())
    }

    fn write_u16(&mut self, val: u16) -> anyhow::Result<()> {
        self.write((val >> 8) as u8)?;
        self.write((val & 0xFF) as u8)?;

        Ok(())
    }

    fn write_qname(&mut self, qname: &str) -> anyhow::Result<()> {
        for label in qname.split('.').filter(|label| !label.is_empty()) {
            let len = label.len();
            if len > 0x3f {
                anyhow::bail!("Single label exceeds 63 characters")
            }

            self.write_u8(len as u8)?;
            for b in label.as_bytes() {
                self.write_u8(*b)?;
            }
        }

        self.write_u8(0)?;

        Ok(())
    }
}

/// Encodes a single-question query into `buf`, returning the number of bytes written.
pub fn write_query(buf: &mut [u8], query: &DnsQuery) -> anyhow::Result<usize> {
    let mut buffer = BytePacketBuffer::new(buf);

    write_header(&query.header, &mut buffer)?;
    write_question(&query.question, &mut buffer)?;

    Ok(buffer.pos)
}

fn write_header(header: &DnsHeader, buffer: &mut BytePacketBuffer) -> anyhow::Result<()> {
    buffer.write_u16(header.id)?;
    buffer.write_u16(header.flags())?;
    buffer.write_u16(header.questions)?;
    // answer, authority and additional counts: a query carries none
    for _ in 0..3 {
        buffer.write_u16(0)?;
    }

    Ok(())
}

fn write_question(question: &DnsQuestion, buffer: &mut BytePacketBuffer) -> anyhow::Result<()> {
    buffer.write_qname(&question.name)?;
    buffer.write_u16(question.qtype.to_num())?;
    buffer.write_u16(1)?;

    Ok(())
}

/// Turns a query into a REFUSED response in place.
///
/// Only bits are set (QR in byte 2, 0x05 in byte 3); anything the client already had set stays
/// set, including stray RCODE bits. Applying it twice gives the same bytes.
pub fn refuse(packet: &mut [u8]) -> anyhow::Result<()> {
    if packet.len() < 4 {
        anyhow::bail!("Packet too short to carry flags: {} bytes", packet.len())
    }
    packet[2] |= RESPONSE_FLAG;
    packet[3] |= REFUSED_FLAGS;

    Ok(())
}

/// Turns a query into a SERVFAIL response in place. Unlike [`refuse`] the RCODE nibble is
/// replaced, not merged.
pub fn server_failure(packet: &mut [u8]) -> anyhow::Result<()> {
    if packet.len() < 4 {
        anyhow::bail!("Packet too short to carry flags: {} bytes", packet.len())
    }
    packet[2] |= RESPONSE_FLAG;
    packet[3] = (packet[3] & 0xF0) | ResponseCode::SERVFAIL as u8;

    Ok(())
}
