//! SuccessorLink trait: the one outbound connection a peer owns.
//!
//! Implementations:
//! - TCP stream (ring-peer)
//! - In-memory recorders (tests)

use crate::{Address, Token};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection to {address} failed: {source}")]
    ConnectFailed {
        address: Address,
        #[source]
        source: std::io::Error,
    },

    #[error("Send to {address} failed: {source}")]
    SendFailed {
        address: Address,
        #[source]
        source: std::io::Error,
    },

    #[error("Successor link to {0} is closed")]
    Closed(Address),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Outbound link to the current successor.
///
/// `replace` closes the old connection before opening the new one and only
/// returns once the new one is usable. Methods take `&mut self`, so a
/// `forward` can never run while a `replace` is in progress.
#[async_trait]
pub trait SuccessorLink: Send {
    /// Address this link currently writes to
    fn target(&self) -> Address;

    /// Write one token to the successor
    async fn forward(&mut self, token: &Token) -> Result<()>;

    /// Close the current connection, then connect to `successor`
    async fn replace(&mut self, successor: Address) -> Result<()>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}
