use std::process;

use dnsfilter::{Blocklist, Config, Error, Opt, Relay};
use log::{error, info};
use structopt::{clap::ErrorKind, StructOpt};

fn run(opt: &Opt) -> Result<(), Error> {
    let config = Config::from_opt(opt)?;

    let blocklist = Blocklist::load(&config.filter_file)?;
    info!(
        "Loaded {} patterns from {}",
        blocklist.len(),
        config.filter_file.display()
    );

    let relay = Relay::bind(&config, blocklist)?;
    info!(
        "Relaying DNS on {} via {} (on forward error: {:?})",
        relay.local_addr()?,
        config.upstream,
        config.on_forward_error
    );

    relay.run()
}

fn main() {
    let opt = match Opt::from_iter_safe(std::env::args_os()) {
        Ok(opt) => opt,
        Err(e) if e.kind == ErrorKind::HelpDisplayed || e.kind == ErrorKind::VersionDisplayed => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{}", e.message);
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&opt.log_level))
        .init();

    if let Err(e) = run(&opt) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}
