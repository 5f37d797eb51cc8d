//! RingDriver: applies engine decisions to a successor link.
//!
//! Owns the [`RingEngine`] and the [`SuccessorLink`] together so the
//! successor address and the connection behind it can never disagree.

use crate::engine::{Action, RingEngine};
use crate::transport::{Result, SuccessorLink};
use crate::{Address, Token};
use tracing::{debug, info};

pub struct RingDriver<L> {
    engine: RingEngine,
    link: L,
}

impl<L: SuccessorLink> RingDriver<L> {
    /// Announce this peer on an already-connected link.
    ///
    /// Sends `Join { author: self, target_next: successor }` and, when the
    /// peer holds the initial payload, one `Message` authored by it.
    pub async fn start(engine: RingEngine, mut link: L, initial_payload: Option<i64>) -> Result<Self> {
        debug_assert_eq!(link.target(), engine.successor());

        let join = Token::join(engine.self_address(), engine.successor());
        link.forward(&join).await?;
        info!(
            "Announced {} in front of {}",
            engine.self_address(),
            engine.successor()
        );

        if let Some(payload) = initial_payload {
            link.forward(&Token::message(engine.self_address(), payload))
                .await?;
            info!("Sent initial payload {}", payload);
        }

        Ok(Self { engine, link })
    }

    pub fn engine(&self) -> &RingEngine {
        &self.engine
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn self_address(&self) -> Address {
        self.engine.self_address()
    }

    pub fn successor(&self) -> Address {
        self.engine.successor()
    }

    /// Process one inbound token and carry out the decision.
    pub async fn handle(&mut self, token: Token) -> Result<Action> {
        let action = self.engine.decide(token);

        match &action {
            Action::Drop(reason) => {
                debug!("Dropped {} ({:?})", token, reason);
            }
            Action::Forward(out) => {
                self.link.forward(out).await?;
                debug!("Forwarded {} to {}", out, self.link.target());
            }
            Action::Rewire { successor, token: out } => {
                let previous = self.link.target();
                self.link.replace(*successor).await?;
                info!("Rewired successor {} -> {}", previous, successor);
                self.link.forward(out).await?;
                debug!("Forwarded {} to {}", out, successor);
            }
            Action::Shutdown => {
                info!("Quit received from {}", token.sender());
            }
        }

        Ok(action)
    }

    /// Close the successor link.
    pub async fn shutdown(mut self) -> Result<()> {
        self.link.close().await
    }
}
