//! ring-peer: One peer of a self-organizing token ring.
//!
//! Usage: `ring-peer <NAME> <PORT> <NEXT> <HAS_TOKEN> <TRANSPORT>`
//!
//! Exits 0 after a Quit token; every failure exits with its own code
//! (see `ring_peer::exit_code`).

use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use ring_peer::{exit_code, init_tracing, Args, Peer, PeerConfig, PeerError};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exit_code::NOT_ENOUGH_ARGS);
        }
    };

    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), PeerError> {
    let config = PeerConfig::from_args(&args)?;
    info!("Starting ring peer\n{}", config.banner());

    let listener = Peer::bind(&config).await?;
    let peer = Peer::start(config, listener).await?;
    peer.run().await
}
