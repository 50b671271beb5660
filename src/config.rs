use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs},
    path::PathBuf,
};

use log::debug;
use structopt::StructOpt;
use typed_builder::TypedBuilder;

use crate::{error::Error, forwarder::UPSTREAM_PORT, relay::FailurePolicy};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dnsfilter",
    about = "Filtering DNS relay: refuses queries for blocked domains and forwards the rest"
)]
pub struct Opt {
    /// IP address or domain name of the DNS server (resolver) requests are sent to
    #[structopt(short, long)]
    pub server: String,

    /// Port number where the relay awaits requests
    #[structopt(short, long, default_value = "53")]
    pub port: u16,

    /// Filter file listing unwanted domains, one pattern per line
    #[structopt(short, long, parse(from_os_str))]
    pub filter_file: PathBuf,

    /// Port of the upstream resolver
    #[structopt(long, default_value = "53")]
    pub upstream_port: u16,

    /// What to do when forwarding fails: `exit` or `servfail`
    #[structopt(
        long,
        default_value = "exit",
        possible_values = &["exit", "servfail"],
        case_insensitive = true
    )]
    pub on_forward_error: FailurePolicy,

    /// Log filter, in env_logger syntax; RUST_LOG takes precedence
    #[structopt(short, long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct Config {
    pub upstream: SocketAddrV4,
    #[builder(default = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 53))]
    pub listen: SocketAddrV4,
    pub filter_file: PathBuf,
    #[builder(default = FailurePolicy::Exit)]
    pub on_forward_error: FailurePolicy,
}

impl Config {
    pub fn from_opt(opt: &Opt) -> Result<Config, Error> {
        let upstream = resolve_upstream(&opt.server)?;

        Ok(Config::builder()
            .upstream(SocketAddrV4::new(upstream, opt.upstream_port))
            .listen(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, opt.port))
            .filter_file(opt.filter_file.clone())
            .on_forward_error(opt.on_forward_error)
            .build())
    }
}

fn resolve_upstream(server: &str) -> Result<Ipv4Addr, Error> {
    if server.is_empty() {
        return Err(Error::Args("You must input server IP address".to_string()));
    }
    if let Ok(ip) = server.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    debug!("Resolving upstream host {}", server);
    let addrs = (server, UPSTREAM_PORT).to_socket_addrs().map_err(|e| {
        Error::Args(format!("Enter valid IP address or host name ({}): {}", server, e))
    })?;

    last_ipv4(addrs).ok_or_else(|| Error::Args(format!("{} has no IPv4 address", server)))
}

// A host with several A records resolves to the last one listed.
fn last_ipv4<I: IntoIterator<Item = SocketAddr>>(addrs: I) -> Option<Ipv4Addr> {
    addrs
        .into_iter()
        .filter_map(|addr| match addr {
            SocketAddr::V4(addr) => Some(*addr.ip()),
            SocketAddr::V6(_) => None,
        })
        .last()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opt(args: &[&str]) -> Result<Opt, structopt::clap::Error> {
        Opt::from_iter_safe(std::iter::once("dnsfilter").chain(args.iter().cloned()))
    }

    #[test]
    fn defaults_are_filled_in() {
        let opt = opt(&["-s", "8.8.8.8", "-f", "blocked.txt"]).unwrap();

        let config = Config::from_opt(&opt).unwrap();

        assert_eq!(
            config,
            Config::builder()
                .upstream(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 53))
                .filter_file(PathBuf::from("blocked.txt"))
                .build()
        );
        assert_eq!(opt.log_level, "info");
    }

    #[test]
    fn all_options_are_read() {
        let opt = opt(&[
            "--server",
            "1.1.1.1",
            "--port",
            "5353",
            "--filter-file",
            "list.txt",
            "--upstream-port",
            "5300",
            "--on-forward-error",
            "ServFail",
        ])
        .unwrap();

        let config = Config::from_opt(&opt).unwrap();

        assert_eq!(config.upstream, SocketAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 5300));
        assert_eq!(config.listen, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 5353));
        assert_eq!(config.filter_file, PathBuf::from("list.txt"));
        assert_eq!(config.on_forward_error, FailurePolicy::ServFail);
    }

    #[test]
    fn server_and_filter_file_are_required() {
        assert!(opt(&["-f", "blocked.txt"]).is_err());
        assert!(opt(&["-s", "8.8.8.8"]).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(opt(&["-s", "8.8.8.8", "-f", "blocked.txt", "-p", "http"]).is_err());
        assert!(opt(&["-s", "8.8.8.8", "-f", "blocked.txt", "-p", "70000"]).is_err());
    }

    #[test]
    fn last_ipv4_address_is_used() {
        let v4 = |a, b, c, d| SocketAddr::from((Ipv4Addr::new(a, b, c, d), UPSTREAM_PORT));
        let v6 = SocketAddr::from((std::net::Ipv6Addr::LOCALHOST, UPSTREAM_PORT));

        assert_eq!(
            last_ipv4(vec![v4(1, 1, 1, 1), v6, v4(2, 2, 2, 2), v6]),
            Some(Ipv4Addr::new(2, 2, 2, 2))
        );
        assert_eq!(last_ipv4(vec![v6]), None);
    }

    #[test]
    fn empty_server_is_an_argument_error() {
        let opt = opt(&["-s", "", "-f", "blocked.txt"]).unwrap();

        assert_eq!(Config::from_opt(&opt).unwrap_err().exit_code(), 1);
    }
}
