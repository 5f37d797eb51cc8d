//! Wire protocol for the ring.
//!
//! - Token types and constructors
//! - Fixed-layout binary codec

pub mod codec;
pub mod token;

pub use codec::{TokenError, TOKEN_SIZE, WIRE_VERSION};
pub use token::{Token, TokenKind};
