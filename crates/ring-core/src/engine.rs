//! Ring protocol engine.
//!
//! Decides, for each inbound token, whether the ring stops propagating it,
//! forwards it unchanged, or rewires the successor link first. The engine is
//! pure state: it never touches a socket. [`crate::RingDriver`] applies its
//! decisions to a [`crate::SuccessorLink`].
//!
//! # Decision procedure
//!
//! **Join**
//! 1. Authored by us: the announcement has come full circle. Stop.
//! 2. `target_next` equals our successor: we are the predecessor of the
//!    insertion point. Our successor becomes the joining peer and the Join is
//!    forwarded on the new link, where its author stops it one hop later.
//! 3. Otherwise forward unchanged and let the Join keep searching.
//!
//! **Message**: stop if authored by us, otherwise forward.
//!
//! **Quit**: stop this peer. Never forwarded.

use crate::{Address, Token, TokenKind};

/// Why a token was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Our own Join came back: insertion is confirmed
    JoinCompleted,
    /// Our own Message came back after a full circuit
    CircuitCompleted,
}

/// What the peer must do with an inbound token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Stop propagation
    Drop(DropReason),
    /// Forward on the current successor link
    Forward(Token),
    /// Replace the successor link with `successor`, then forward on it
    Rewire { successor: Address, token: Token },
    /// Stop the peer
    Shutdown,
}

/// Whether the peer loop keeps running after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Action {
    /// The token that goes out on the successor link, if any.
    pub fn forwarded(&self) -> Option<&Token> {
        match self {
            Self::Forward(token) | Self::Rewire { token, .. } => Some(token),
            Self::Drop(_) | Self::Shutdown => None,
        }
    }

    pub fn flow(&self) -> Flow {
        match self {
            Self::Shutdown => Flow::Stop,
            _ => Flow::Continue,
        }
    }
}

/// Per-peer protocol state.
#[derive(Debug, Clone)]
pub struct RingEngine {
    self_address: Address,
    successor: Address,
}

impl RingEngine {
    pub fn new(self_address: Address, successor: Address) -> Self {
        Self {
            self_address,
            successor,
        }
    }

    pub fn self_address(&self) -> Address {
        self.self_address
    }

    /// Current successor. The only protocol state that changes after startup.
    pub fn successor(&self) -> Address {
        self.successor
    }

    /// Decide what to do with one inbound token.
    ///
    /// Updates the successor when the result is [`Action::Rewire`]. Never
    /// returns a forwarded token authored by this peer.
    pub fn decide(&mut self, token: Token) -> Action {
        if token.kind() == TokenKind::Quit {
            return Action::Shutdown;
        }

        if token.is_authored_by(self.self_address) {
            return Action::Drop(match token.kind() {
                TokenKind::Join => DropReason::JoinCompleted,
                _ => DropReason::CircuitCompleted,
            });
        }

        let relayed = token.relayed_by(self.self_address);
        if token.kind() == TokenKind::Join && token.target_next() == self.successor {
            self.successor = token.author();
            return Action::Rewire {
                successor: token.author(),
                token: relayed,
            };
        }

        Action::Forward(relayed)
    }
}
