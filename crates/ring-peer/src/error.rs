//! Peer errors and process exit codes.
//!
//! Every failure is a typed value returned up to `main`, which is the only
//! place that turns one into a process exit.

use crate::config::Transport;
use ring_core::{Address, AddressError, TokenError, TransportError};
use std::net::SocketAddr;
use thiserror::Error;

/// Process exit codes for `ring-peer`.
pub mod exit_code {
    pub const NOT_ENOUGH_ARGS: u8 = 1;
    pub const INVALID_NEXT: u8 = 2;
    pub const INVALID_ADDRESS: u8 = 3;
    pub const INVALID_INITIAL_TOKEN: u8 = 4;
    pub const INVALID_TRANSPORT: u8 = 5;
    pub const SOCKET: u8 = 6;
    pub const BIND: u8 = 7;
    pub const LISTEN: u8 = 8;
    pub const ACCEPT: u8 = 9;
    pub const UNIMPLEMENTED_TRANSPORT: u8 = 10;
    pub const CONNECT: u8 = 11;
    pub const RECEIVE: u8 = 12;
    pub const SEND: u8 = 13;
}

/// Startup configuration problems, detected before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Not enough arguments: {0}")]
    NotEnoughArgs(String),

    #[error("Invalid successor address: {0}")]
    InvalidNext(#[source] AddressError),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(#[source] AddressError),

    #[error("Invalid initial token flag {0:?}: expected 'true' or 'false'")]
    InvalidInitialToken(String),

    #[error("Invalid transport {0:?}: expected 'tcp' or 'udp'")]
    InvalidTransport(String),
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotEnoughArgs(_) => exit_code::NOT_ENOUGH_ARGS,
            Self::InvalidNext(_) => exit_code::INVALID_NEXT,
            Self::InvalidAddress(_) => exit_code::INVALID_ADDRESS,
            Self::InvalidInitialToken(_) => exit_code::INVALID_INITIAL_TOKEN,
            Self::InvalidTransport(_) => exit_code::INVALID_TRANSPORT,
        }
    }
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create socket: {0}")]
    Socket(#[source] std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: Address,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to listen on {address}: {source}")]
    Listen {
        address: Address,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("The {0} transport is not implemented")]
    UnimplementedTransport(Transport),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to read token from {peer}: {source}")]
    Receive {
        peer: SocketAddr,
        #[source]
        source: TokenError,
    },
}

impl PeerError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(e) => e.exit_code(),
            Self::Socket(_) => exit_code::SOCKET,
            Self::Bind { .. } => exit_code::BIND,
            Self::Listen { .. } => exit_code::LISTEN,
            Self::Accept(_) => exit_code::ACCEPT,
            Self::UnimplementedTransport(_) => exit_code::UNIMPLEMENTED_TRANSPORT,
            Self::Transport(TransportError::ConnectFailed { .. }) => exit_code::CONNECT,
            Self::Transport(_) => exit_code::SEND,
            Self::Receive { .. } => exit_code::RECEIVE,
        }
    }
}
