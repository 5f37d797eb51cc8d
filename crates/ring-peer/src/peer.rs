//! The peer process loop.
//!
//! Startup connects to the configured successor and announces the peer with
//! a Join (plus the initial Message when holding the token). The loop then
//! accepts inbound connections and processes their tokens one at a time until
//! a Quit arrives.
//!
//! Each accepted connection gets a reader task that decodes records in order
//! and pushes them into a bounded queue. The loop is the queue's only
//! consumer and the only owner of the engine and the successor link, so
//! protocol state is never shared.

use crate::config::{PeerConfig, Transport};
use crate::connection::{self, Inbound, ListenHandle, TcpSuccessor};
use crate::error::PeerError;
use ring_core::{Action, Address, Flow, RingDriver, RingEngine, Token};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};

/// Progress reported to an observer while the peer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// The loop is running
    Started { address: Address, successor: Address },
    /// A token was processed
    Received { token: Token, action: Action },
    /// The loop exited cleanly
    Stopped { address: Address },
}

pub struct Peer {
    name: String,
    listener: ListenHandle,
    driver: RingDriver<TcpSuccessor>,
    inbound_tx: mpsc::Sender<Inbound>,
    inbound_rx: mpsc::Receiver<Inbound>,
    readers: Vec<JoinHandle<()>>,
    accept_delay: Duration,
    observer: Option<mpsc::UnboundedSender<PeerEvent>>,
}

impl Peer {
    /// Acquire the listening endpoint described by `config`.
    ///
    /// Fails fast on transports other than TCP.
    pub async fn bind(config: &PeerConfig) -> Result<ListenHandle, PeerError> {
        ensure_supported(config.transport)?;
        connection::acquire_listening(config.address).await
    }

    /// Connect to the successor and announce this peer.
    ///
    /// The peer's identity is the listener's address, which matters when the
    /// listener was bound to port 0.
    pub async fn start(config: PeerConfig, listener: ListenHandle) -> Result<Self, PeerError> {
        ensure_supported(config.transport)?;

        let address = listener.local_address();
        let span = info_span!("peer", name = %config.name, %address);

        let driver = async {
            let link = connection::connect_successor(config.next).await?;
            let engine = RingEngine::new(address, config.next);
            RingDriver::start(engine, link, config.initial_payload()).await
        }
        .instrument(span)
        .await?;

        let (inbound_tx, inbound_rx) = mpsc::channel(config.queue_depth);

        Ok(Self {
            name: config.name.clone(),
            listener,
            driver,
            inbound_tx,
            inbound_rx,
            readers: Vec::new(),
            accept_delay: config.accept_delay(),
            observer: None,
        })
    }

    /// Report progress on `observer`.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<PeerEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn address(&self) -> Address {
        self.driver.self_address()
    }

    pub fn successor(&self) -> Address {
        self.driver.successor()
    }

    /// Run until a Quit token (or Ctrl+C) arrives.
    pub async fn run(self) -> Result<(), PeerError> {
        let span = info_span!("peer", name = %self.name, address = %self.address());
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> Result<(), PeerError> {
        info!("Peer running, successor {}", self.successor());
        self.emit(PeerEvent::Started {
            address: self.address(),
            successor: self.successor(),
        });

        loop {
            tokio::select! {
                accepted = self.listener.accept_one() => {
                    let inbound = accepted?;
                    let reader = inbound.spawn_reader(self.inbound_tx.clone());
                    self.readers.retain(|r| !r.is_finished());
                    self.readers.push(reader);
                }

                Some(inbound) = self.inbound_rx.recv() => {
                    match inbound {
                        Inbound::Token { from, token } => {
                            debug!("Received {} via {}", token, from);
                            let action = self.driver.handle(token).await?;
                            let flow = action.flow();
                            self.emit(PeerEvent::Received { token, action });

                            if flow == Flow::Stop {
                                break;
                            }
                            if !self.accept_delay.is_zero() {
                                tokio::time::sleep(self.accept_delay).await;
                            }
                        }
                        Inbound::Failed { from, error } => {
                            error!("Connection from {} broke mid-token: {}", from, error);
                            return Err(PeerError::Receive { peer: from, source: error });
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    async fn shutdown(mut self) -> Result<(), PeerError> {
        let address = self.address();
        for reader in self.readers.drain(..) {
            reader.abort();
        }

        let observer = self.observer.take();
        self.driver.shutdown().await?;
        // The listener closes when dropped with the rest of self

        info!("Peer stopped");
        if let Some(observer) = observer {
            let _ = observer.send(PeerEvent::Stopped { address });
        }
        Ok(())
    }

    fn emit(&self, event: PeerEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }
}

fn ensure_supported(transport: Transport) -> Result<(), PeerError> {
    match transport {
        Transport::Tcp => Ok(()),
        Transport::Udp => Err(PeerError::UnimplementedTransport(transport)),
    }
}
