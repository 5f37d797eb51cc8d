//! ring-ctl: Hand tokens to running ring peers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ring_core::{Address, Token};
use ring_peer::{deliver, init_tracing};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ring-ctl")]
#[command(about = "Deliver control tokens to ring peers")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stop a peer
    Quit {
        /// Peer address (host:port)
        address: Address,
    },
    /// Inject a Message token into the ring at a peer
    Message {
        /// Peer address (host:port)
        address: Address,
        /// Payload value
        #[arg(allow_negative_numbers = true)]
        payload: i64,
        /// Author of the token. Must be a ring member: the message travels
        /// from the receiving peer until it reaches its author.
        #[arg(long)]
        author: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Quit { address } => {
            deliver(address, &Token::quit(address))
                .await
                .with_context(|| format!("Failed to deliver Quit to {}", address))?;
            info!("Quit delivered to {}", address);
        }
        Command::Message {
            address,
            payload,
            author,
        } => {
            let token = Token::message(author, payload);
            deliver(address, &token)
                .await
                .with_context(|| format!("Failed to deliver Message to {}", address))?;
            info!("Delivered {} to {}", token, address);
        }
    }

    Ok(())
}
