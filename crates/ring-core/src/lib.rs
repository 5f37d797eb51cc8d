//! ring-core: Membership and forwarding protocol for a self-organizing token ring.
//!
//! This crate provides:
//! - `Address`, the identity and endpoint of a peer
//! - The fixed-layout `Token` wire codec
//! - `RingEngine`, the per-token decision procedure (stop / forward / rewire)
//! - The `SuccessorLink` transport trait and `RingDriver`, which applies
//!   engine decisions to a link
//!
//! Socket handling lives in `ring-peer`.

pub mod address;
pub mod driver;
pub mod engine;
pub mod protocol;
pub mod transport;

pub use address::{Address, AddressError};
pub use driver::RingDriver;
pub use engine::{Action, DropReason, Flow, RingEngine};
pub use protocol::{Token, TokenError, TokenKind, TOKEN_SIZE, WIRE_VERSION};
pub use transport::{SuccessorLink, TransportError};
