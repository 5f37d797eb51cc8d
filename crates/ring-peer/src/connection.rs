//! TCP connection management.
//!
//! A peer owns one listening endpoint and exactly one outbound connection to
//! its successor. Inbound connections come from predecessors (current or
//! past), from joining peers announcing themselves, and from `ring-ctl`.

use crate::error::PeerError;
use async_trait::async_trait;
use ring_core::transport::Result as TransportResult;
use ring_core::{Address, SuccessorLink, Token, TokenError, TransportError};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pending-connection backlog for the listening socket.
const LISTEN_BACKLOG: u32 = 128;

/// Something a reader task hands to the peer loop.
#[derive(Debug)]
pub enum Inbound {
    /// One decoded token
    Token { from: SocketAddr, token: Token },
    /// The stream broke mid-record; fatal for the peer
    Failed { from: SocketAddr, error: TokenError },
}

/// Bound and listening endpoint.
pub struct ListenHandle {
    listener: TcpListener,
    address: Address,
}

/// Create, bind and listen, reporting each step's failure separately.
pub async fn acquire_listening(address: Address) -> Result<ListenHandle, PeerError> {
    let socket = TcpSocket::new_v4().map_err(PeerError::Socket)?;
    socket.set_reuseaddr(true).map_err(PeerError::Socket)?;
    socket
        .bind(address.into())
        .map_err(|source| PeerError::Bind { address, source })?;
    let listener = socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| PeerError::Listen { address, source })?;

    // Port 0 binds resolve to a real port here
    let address = listener
        .local_addr()
        .ok()
        .and_then(|local| Address::try_from(local).ok())
        .unwrap_or(address);

    debug!("Listening on {}", address);
    Ok(ListenHandle { listener, address })
}

impl ListenHandle {
    /// The address peers reach us on.
    pub fn local_address(&self) -> Address {
        self.address
    }

    /// Wait for exactly one inbound connection.
    pub async fn accept_one(&self) -> Result<InboundStream, PeerError> {
        let (stream, peer) = self.listener.accept().await.map_err(PeerError::Accept)?;
        debug!("Accepted connection from {}", peer);
        Ok(InboundStream { stream, peer })
    }
}

/// One accepted connection carrying a sequence of token records.
pub struct InboundStream {
    stream: TcpStream,
    peer: SocketAddr,
}

impl InboundStream {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Read the next token. `Ok(None)` means the sender closed cleanly.
    pub async fn next_token(&mut self) -> Result<Option<Token>, TokenError> {
        Token::read_from(&mut self.stream).await
    }

    /// Drain this stream on its own task, pushing tokens into `queue` in
    /// arrival order.
    ///
    /// Records are fixed-size, so a malformed one is skipped and the next
    /// record is read as usual. The stream is retired at a clean EOF or when
    /// the peer loop has gone away.
    pub fn spawn_reader(mut self, queue: mpsc::Sender<Inbound>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.next_token().await {
                    Ok(Some(token)) => {
                        let item = Inbound::Token {
                            from: self.peer,
                            token,
                        };
                        if queue.send(item).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Connection from {} closed", self.peer);
                        break;
                    }
                    Err(e) if e.is_anomaly() => {
                        warn!("Dropping malformed token from {}: {}", self.peer, e);
                    }
                    Err(e) => {
                        let _ = queue
                            .send(Inbound::Failed {
                                from: self.peer,
                                error: e,
                            })
                            .await;
                        break;
                    }
                }
            }
        })
    }
}

/// Outbound TCP link to the current successor.
pub struct TcpSuccessor {
    target: Address,
    stream: Option<TcpStream>,
}

/// Open the outbound link. No retry: a refused connection is an error.
pub async fn connect_successor(address: Address) -> TransportResult<TcpSuccessor> {
    let stream = open(address).await?;
    debug!("Connected to successor {}", address);
    Ok(TcpSuccessor {
        target: address,
        stream: Some(stream),
    })
}

async fn open(address: Address) -> TransportResult<TcpStream> {
    TcpStream::connect(SocketAddr::from(address))
        .await
        .map_err(|source| TransportError::ConnectFailed { address, source })
}

/// Connect to `address`, write one token and close.
///
/// Used to hand a token to a peer from outside the ring.
pub async fn deliver(address: Address, token: &Token) -> TransportResult<()> {
    let mut stream = open(address).await?;
    token
        .write_to(&mut stream)
        .await
        .map_err(|source| TransportError::SendFailed { address, source })?;
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of connection to {} failed: {}", address, e);
    }
    Ok(())
}

impl TcpSuccessor {
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[async_trait]
impl SuccessorLink for TcpSuccessor {
    fn target(&self) -> Address {
        self.target
    }

    async fn forward(&mut self, token: &Token) -> TransportResult<()> {
        let address = self.target;
        let stream = self
            .stream
            .as_mut()
            .ok_or(TransportError::Closed(address))?;
        token
            .write_to(stream)
            .await
            .map_err(|source| TransportError::SendFailed { address, source })
    }

    async fn replace(&mut self, successor: Address) -> TransportResult<()> {
        self.close().await?;
        self.target = successor;
        self.stream = Some(open(successor).await?);
        debug!("Connected to new successor {}", successor);
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        if let Some(mut stream) = self.stream.take() {
            // The successor sees a clean EOF on a record boundary
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of link to {} failed: {}", self.target, e);
            }
        }
        Ok(())
    }
}
