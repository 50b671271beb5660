use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use log::{debug, trace};

use crate::{error::Error, MAX_PACKET_SIZE};

pub const UPSTREAM_PORT: u16 = 53;

/// Relays raw queries to one upstream resolver.
///
/// Every call opens its own socket on an ephemeral port, sends once and blocks on a single
/// receive with no timeout. The reply is taken as-is: its id and sender are not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forwarder {
    upstream: SocketAddrV4,
}

impl Forwarder {
    pub fn new(upstream: SocketAddrV4) -> Forwarder {
        Forwarder { upstream }
    }

    pub fn upstream(&self) -> SocketAddrV4 {
        self.upstream
    }

    pub fn forward(&self, query: &[u8]) -> Result<Vec<u8>, Error> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(Error::socket("Binding forwarding socket"))?;

        socket
            .send_to(query, self.upstream)
            .map_err(Error::socket("Request sending failed"))?;
        trace!("Sent {} bytes to {}", query.len(), self.upstream);

        let mut response = vec![0u8; MAX_PACKET_SIZE];
        let (size, src) = socket
            .recv_from(&mut response)
            .map_err(Error::socket("Waiting for upstream response"))?;
        debug!("Received {} bytes from {}", size, src);

        if size == 0 {
            return Err(Error::EmptyResponse(self.upstream));
        }
        response.truncate(size);

        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    fn fake_upstream(reply: Vec<u8>) -> (SocketAddrV4, thread::JoinHandle<Vec<u8>>) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = match socket.local_addr().unwrap() {
            std::net::SocketAddr::V4(addr) => addr,
            other => panic!("unexpected address {}", other),
        };

        let handle = thread::spawn(move || {
            let mut buf = [0u8; MAX_PACKET_SIZE];
            let (size, src) = socket.recv_from(&mut buf).unwrap();
            socket.send_to(&reply, src).unwrap();
            buf[..size].to_vec()
        });

        (addr, handle)
    }

    #[test]
    fn default_port_is_dns() {
        assert_eq!(UPSTREAM_PORT, 53);
    }

    #[test]
    fn query_is_sent_unmodified_and_reply_returned() {
        let query = vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0, 1, b'a', 0, 0, 1, 0, 1];
        let reply = vec![0x12, 0x34, 0x81, 0x80, 0xde, 0xad, 0xbe, 0xef];
        let (addr, upstream) = fake_upstream(reply.clone());

        let response = Forwarder::new(addr).forward(&query).unwrap();

        assert_eq!(response, reply);
        assert_eq!(upstream.join().unwrap(), query);
    }

    #[test]
    fn empty_reply_is_an_error() {
        let (addr, upstream) = fake_upstream(vec![]);

        let error = Forwarder::new(addr).forward(&[0u8; 12]).unwrap_err();

        assert!(matches!(error, Error::EmptyResponse(a) if a == addr));
        upstream.join().unwrap();
    }
}
