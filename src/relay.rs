use std::{
    net::{SocketAddr, UdpSocket},
    str::FromStr,
};

use dnsparse::{query_name, refuse, server_failure};
use log::{debug, error, info, trace, warn};

use crate::{
    blocklist::Blocklist, config::Config, error::Error, forwarder::Forwarder, MAX_PACKET_SIZE,
};

/// What to do when a query cannot be forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the relay with an internal error.
    Exit,
    /// Answer that client with SERVFAIL and keep serving.
    ServFail,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exit" => Ok(FailurePolicy::Exit),
            "servfail" => Ok(FailurePolicy::ServFail),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Verdict<'a> {
    Blocked(&'a [u8]),
    // No terminated QNAME inside the datagram; refused without asking upstream.
    Malformed,
    Forward,
}

/// Single-threaded filtering relay. One datagram is served at a time: while a query is out
/// upstream, no other client is read.
#[derive(Debug)]
pub struct Relay {
    socket: UdpSocket,
    blocklist: Blocklist,
    forwarder: Forwarder,
    policy: FailurePolicy,
}

impl Relay {
    pub fn bind(config: &Config, blocklist: Blocklist) -> Result<Relay, Error> {
        let socket =
            UdpSocket::bind(config.listen).map_err(Error::socket("Socket binding failed"))?;

        Ok(Relay::new(
            socket,
            blocklist,
            Forwarder::new(config.upstream),
            config.on_forward_error,
        ))
    }

    pub fn new(
        socket: UdpSocket,
        blocklist: Blocklist,
        forwarder: Forwarder,
        policy: FailurePolicy,
    ) -> Relay {
        Relay {
            socket,
            blocklist,
            forwarder,
            policy,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.socket
            .local_addr()
            .map_err(Error::socket("Reading listening address"))
    }

    pub fn decide(&self, query: &[u8]) -> Verdict<'_> {
        match query_name(query) {
            Ok(domain) => match self.blocklist.matching_pattern(&domain) {
                Some(pattern) => {
                    info!(
                        "Blocked {} (pattern {:?})",
                        String::from_utf8_lossy(&domain),
                        String::from_utf8_lossy(pattern)
                    );
                    Verdict::Blocked(pattern)
                }
                None => {
                    debug!(
                        "Forwarding {} to {}",
                        String::from_utf8_lossy(&domain),
                        self.forwarder.upstream()
                    );
                    Verdict::Forward
                }
            },
            Err(e) => {
                warn!("Refusing query with unreadable name: {}", e);
                Verdict::Malformed
            }
        }
    }

    /// Builds the reply for one client datagram. `None` means the datagram is dropped.
    pub fn handle(&self, query: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        match self.decide(query) {
            Verdict::Blocked(_) | Verdict::Malformed => Ok(patched(query, refuse)),
            Verdict::Forward => match self.forwarder.forward(query) {
                Ok(response) => Ok(Some(response)),
                Err(e) if self.policy == FailurePolicy::ServFail => {
                    error!("Forwarding failed, answering SERVFAIL: {}", e);
                    Ok(patched(query, server_failure))
                }
                Err(e) => Err(e),
            },
        }
    }

    pub fn serve_one(&self) -> Result<(), Error> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let (size, client) = match self.socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(e) => {
                warn!("Receive on listening socket failed: {}", e);
                return Ok(());
            }
        };
        trace!("Received {} bytes from {}", size, client);

        if let Some(response) = self.handle(&buffer[..size])? {
            self.socket
                .send_to(&response, client)
                .map_err(Error::socket("Response sending failed"))?;
        }

        Ok(())
    }

    pub fn run(&self) -> Result<(), Error> {
        loop {
            self.serve_one()?;
        }
    }
}

fn patched(query: &[u8], patch: fn(&mut [u8]) -> anyhow::Result<()>) -> Option<Vec<u8>> {
    let mut response = query.to_vec();

    match patch(&mut response) {
        Ok(()) => Some(response),
        Err(e) => {
            warn!("Dropping datagram: {}", e);
            None
        }
    }
}
