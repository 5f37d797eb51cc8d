//! Peer configuration.
//!
//! Positional arguments, in order:
//! `ring-peer <NAME> <PORT> <NEXT> <HAS_TOKEN> <TRANSPORT>`. They are taken
//! as raw strings and validated by [`PeerConfig::from_args`] so that each kind
//! of mistake gets its own exit code.

use crate::error::ConfigError;
use clap::Parser;
use ring_core::Address;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Payload carried by the initial Message when none is given.
pub const DEFAULT_PAYLOAD: i64 = 42;

/// Bound on tokens decoded but not yet processed.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Parser, Debug, Clone)]
#[command(name = "ring-peer")]
#[command(about = "Token ring peer")]
pub struct Args {
    /// Name used to label this peer's logs
    pub name: String,

    /// Port to listen on
    pub port: String,

    /// Successor address (host:port)
    pub next: String,

    /// Whether this peer starts holding the payload token ("true" or "false")
    pub has_token: String,

    /// Transport to use ("tcp" or "udp")
    pub transport: String,

    /// Host to bind and announce
    #[arg(long, default_value = "127.0.0.1", env = "RING_HOST")]
    pub host: String,

    /// Payload value of the initial Message token
    #[arg(long, default_value_t = DEFAULT_PAYLOAD, env = "RING_PAYLOAD", allow_negative_numbers = true)]
    pub payload: i64,

    /// Delay after each processed token, in milliseconds
    #[arg(long, default_value_t = 0, env = "RING_ACCEPT_DELAY_MS")]
    pub accept_delay_ms: u64,

    /// Maximum number of received tokens waiting to be processed
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

/// Transport between peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    /// Recognized but not implemented
    Udp,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(ConfigError::InvalidTransport(other.to_string())),
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// Validated startup configuration for one peer.
#[derive(Debug, Clone, Serialize)]
pub struct PeerConfig {
    pub name: String,
    /// Our listen address, which is also our identity on the ring
    pub address: Address,
    /// Successor to connect to at startup
    pub next: Address,
    pub has_token: bool,
    pub transport: Transport,
    pub payload: i64,
    pub accept_delay_ms: u64,
    /// Inbound queue bound, at least 1
    pub queue_depth: usize,
}

impl PeerConfig {
    /// Configuration with defaults: TCP, no initial token, no delay.
    pub fn new(name: impl Into<String>, address: Address, next: Address) -> Self {
        Self {
            name: name.into(),
            address,
            next,
            has_token: false,
            transport: Transport::Tcp,
            payload: DEFAULT_PAYLOAD,
            accept_delay_ms: 0,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }

    /// Hold the initial payload token.
    pub fn with_token(mut self, payload: i64) -> Self {
        self.has_token = true;
        self.payload = payload;
        self
    }

    /// Bound the inbound queue. Zero is raised to 1.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Validate raw command-line arguments.
    ///
    /// Checks run in argument order: own address, successor, token flag,
    /// transport.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let host = Address::parse_host(&args.host).map_err(ConfigError::InvalidAddress)?;
        let port = Address::parse_port(&args.port).map_err(ConfigError::InvalidAddress)?;
        let next: Address = args.next.parse().map_err(ConfigError::InvalidNext)?;
        let has_token = parse_flag(&args.has_token)?;
        let transport: Transport = args.transport.parse()?;

        let config = Self {
            name: args.name.clone(),
            address: Address::new(host, port),
            next,
            has_token,
            transport,
            payload: args.payload,
            accept_delay_ms: args.accept_delay_ms,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        };
        Ok(config.with_queue_depth(args.queue_depth))
    }

    /// Payload to send at startup, if this peer holds the token.
    pub fn initial_payload(&self) -> Option<i64> {
        self.has_token.then_some(self.payload)
    }

    pub fn accept_delay(&self) -> Duration {
        Duration::from_millis(self.accept_delay_ms)
    }

    /// Startup banner: the configuration as pretty JSON.
    pub fn banner(&self) -> String {
        serde_json::to_string_pretty(self).expect("PeerConfig serialization should not fail")
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::InvalidInitialToken(other.to_string())),
    }
}
