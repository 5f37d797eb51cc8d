//! ring-peer library: Exposes the peer's components for the binaries and tests.
//!
//! This is a thin library layer over the peer process,
//! allowing integration tests to run real peers in-process.

pub mod config;
pub mod connection;
pub mod error;
pub mod peer;

// Re-export key types for convenience
pub use config::{Args, PeerConfig, Transport};
pub use connection::{acquire_listening, connect_successor, deliver, ListenHandle, TcpSuccessor};
pub use error::{exit_code, ConfigError, PeerError};
pub use peer::{Peer, PeerEvent};

use tracing_subscriber::EnvFilter;

/// Set up logging: `RUST_LOG` wins, otherwise info (or debug with `verbose`).
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "debug,ring_peer=debug,ring_core=debug"
    } else {
        "info,ring_peer=info,ring_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
