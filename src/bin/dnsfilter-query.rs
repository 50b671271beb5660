use log::debug;
use std::{
    net::{Ipv4Addr, UdpSocket},
    time::Duration,
};
use structopt::StructOpt;

use dnsfilter::{
    parse_header, write_query, DnsHeader, DnsQuery, DnsQuestion, QueryType, ResponseCode,
    MAX_PACKET_SIZE,
};

fn mk_query(qname: &str, qtype: QueryType) -> DnsQuery {
    let header = DnsHeader::builder()
        .id(rand::random())
        .questions(1)
        .recursion_desired(true)
        .build();

    let question = DnsQuestion {
        name: qname.to_string(),
        qtype,
    };

    DnsQuery::builder().header(header).question(question).build()
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dnsfilter-query",
    about = "Send one A query through a dnsfilter relay and print the response header"
)]
struct Opt {
    #[structopt(short, long, default_value = "google.com")]
    query: String,

    #[structopt(short, long, default_value = "127.0.0.1")]
    server: Ipv4Addr,

    #[structopt(short, long, default_value = "53")]
    port: u16,

    /// Seconds to wait for the response
    #[structopt(short, long, default_value = "5")]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    debug!("parsing args");

    let opt = Opt::from_args();
    debug!("args {:?}", opt);

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_read_timeout(Some(Duration::from_secs(opt.timeout)))?;

    let request = mk_query(&opt.query, QueryType::A);
    debug!("Request: {:#?}", request);

    let mut req_buffer = vec![0u8; MAX_PACKET_SIZE];
    let size = write_query(&mut req_buffer, &request)?;

    socket.send_to(&req_buffer[..size], (opt.server, opt.port))?;

    let mut response_buffer = vec![0u8; MAX_PACKET_SIZE];
    let (size, _src) = socket.recv_from(&mut response_buffer)?;

    let header = parse_header(&response_buffer[..size]).map_err(anyhow::Error::msg)?;
    println!("{:#?}", header);

    if header.rescode == ResponseCode::REFUSED {
        println!("{} is blocked", opt.query);
    } else {
        println!("{} bytes of answer for {}", size, opt.query);
    }

    Ok(())
}
