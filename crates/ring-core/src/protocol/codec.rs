//! Fixed-layout binary encoding for tokens.
//!
//! Every token is exactly [`TOKEN_SIZE`] bytes on the wire, with no length
//! prefix or delimiter. A reader always consumes one whole record per token.
//!
//! Layout (bincode fixed-int, little-endian):
//!
//! | offset | field       | type      |
//! |--------|-------------|-----------|
//! | 0      | version     | u8        |
//! | 1      | kind        | u8        |
//! | 2      | reserved    | u16       |
//! | 4      | payload     | i64       |
//! | 12     | target_next | address   |
//! | 20     | sender      | address   |
//! | 28     | author      | address   |
//!
//! An address is four IPv4 octets, a u16 port and a reserved u16.

use super::token::{Token, TokenKind};
use crate::Address;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Current wire version.
///
/// Increment when the record layout changes.
pub const WIRE_VERSION: u8 = 1;

/// Size of one encoded token in bytes.
pub const TOKEN_SIZE: usize = 36;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Unsupported wire version {0} (expected {WIRE_VERSION})")]
    UnsupportedVersion(u8),

    #[error("Unknown token kind tag {0}")]
    UnknownKind(u8),

    #[error("Malformed token: {0}")]
    Malformed(&'static str),

    #[error("Truncated token: got {got} of {TOKEN_SIZE} bytes")]
    Truncated { got: usize },

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// A well-framed record with contents this peer does not understand.
    ///
    /// Anomalies are survivable; truncation and I/O failures are not.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion(_) | Self::UnknownKind(_) | Self::Malformed(_) | Self::Codec(_)
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAddress {
    octets: [u8; 4],
    port: u16,
    reserved: u16,
}

impl From<Address> for WireAddress {
    fn from(addr: Address) -> Self {
        Self {
            octets: addr.host().octets(),
            port: addr.port(),
            reserved: 0,
        }
    }
}

impl TryFrom<WireAddress> for Address {
    type Error = TokenError;

    fn try_from(wire: WireAddress) -> Result<Self, Self::Error> {
        if wire.reserved != 0 {
            return Err(TokenError::Malformed("reserved address bytes are not zero"));
        }
        Ok(Address::new(Ipv4Addr::from(wire.octets), wire.port))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToken {
    version: u8,
    kind: u8,
    reserved: u16,
    payload: i64,
    target_next: WireAddress,
    sender: WireAddress,
    author: WireAddress,
}

impl Token {
    /// Encode to one fixed-size record.
    pub fn encode(&self) -> [u8; TOKEN_SIZE] {
        let wire = WireToken {
            version: WIRE_VERSION,
            kind: self.kind().tag(),
            reserved: 0,
            payload: self.payload(),
            target_next: self.target_next().into(),
            sender: self.sender().into(),
            author: self.author().into(),
        };
        let bytes = bincode::serialize(&wire).expect("Token serialization should not fail");

        let mut record = [0u8; TOKEN_SIZE];
        record.copy_from_slice(&bytes);
        record
    }

    /// Decode one record.
    ///
    /// Only the first [`TOKEN_SIZE`] bytes are read. Unknown versions or kinds,
    /// nonzero reserved bytes, and populated fields the kind does not use are
    /// all rejected.
    pub fn decode(data: &[u8]) -> Result<Self, TokenError> {
        if data.len() < TOKEN_SIZE {
            return Err(TokenError::Truncated { got: data.len() });
        }
        let wire: WireToken = bincode::deserialize(&data[..TOKEN_SIZE])?;

        if wire.version != WIRE_VERSION {
            return Err(TokenError::UnsupportedVersion(wire.version));
        }
        let kind = TokenKind::from_tag(wire.kind).ok_or(TokenError::UnknownKind(wire.kind))?;
        if wire.reserved != 0 {
            return Err(TokenError::Malformed("reserved header bytes are not zero"));
        }

        let target_next = Address::try_from(wire.target_next)?;
        let sender = Address::try_from(wire.sender)?;
        let author = Address::try_from(wire.author)?;

        if kind != TokenKind::Message && wire.payload != 0 {
            return Err(TokenError::Malformed("payload set on a non-Message token"));
        }
        if kind != TokenKind::Join && !target_next.is_unspecified() {
            return Err(TokenError::Malformed("target set on a non-Join token"));
        }

        Ok(Token::from_parts(kind, wire.payload, target_next, sender, author))
    }

    /// Read exactly one token from a stream.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a record boundary.
    /// Ending part-way through a record is [`TokenError::Truncated`].
    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, TokenError>
    where
        R: AsyncRead + Unpin,
    {
        let mut record = [0u8; TOKEN_SIZE];
        let mut filled = 0;
        while filled < TOKEN_SIZE {
            let n = reader.read(&mut record[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(TokenError::Truncated { got: filled });
            }
            filled += n;
        }
        Self::decode(&record).map(Some)
    }

    /// Write this token as one record and flush.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(port: u16) -> Address {
        Address::localhost(port)
    }

    #[test]
    fn test_record_size_is_fixed() {
        assert_eq!(Token::join(p(1), p(2)).encode().len(), TOKEN_SIZE);
        assert_eq!(Token::message(p(1), i64::MIN).encode().len(), TOKEN_SIZE);
        assert_eq!(Token::quit(p(1)).encode().len(), TOKEN_SIZE);
    }

    #[test]
    fn test_wire_layout() {
        let token = Token::message(p(8001), 42).relayed_by(p(8002));
        let record = token.encode();

        assert_eq!(record[0], WIRE_VERSION);
        assert_eq!(record[1], TokenKind::Message.tag());
        assert_eq!(&record[2..4], &[0, 0]);
        assert_eq!(&record[4..12], &42i64.to_le_bytes());
        // Unused target is all zero
        assert_eq!(&record[12..20], &[0u8; 8]);
        // Sender: 127.0.0.1, port 8002, reserved
        assert_eq!(&record[20..24], &[127, 0, 0, 1]);
        assert_eq!(&record[24..26], &8002u16.to_le_bytes());
        assert_eq!(&record[26..28], &[0, 0]);
        // Author
        assert_eq!(&record[28..32], &[127, 0, 0, 1]);
        assert_eq!(&record[32..34], &8001u16.to_le_bytes());
    }

    #[test]
    fn test_decode_preserves_provenance() {
        let token = Token::join(p(8004), p(8002)).relayed_by(p(8003));
        let decoded = Token::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(decoded.sender(), p(8003));
        assert_eq!(decoded.author(), p(8004));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let mut record = Token::quit(p(1)).encode();
        record[1] = 9;
        let err = Token::decode(&record).unwrap_err();
        assert!(matches!(err, TokenError::UnknownKind(9)));
        assert!(err.is_anomaly());
    }

    #[test]
    fn test_decode_unknown_version() {
        let mut record = Token::quit(p(1)).encode();
        record[0] = 2;
        let err = Token::decode(&record).unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedVersion(2)));
        assert!(err.is_anomaly());
    }

    #[test]
    fn test_decode_rejects_reserved_bytes() {
        let mut record = Token::quit(p(1)).encode();
        record[3] = 1;
        assert!(matches!(
            Token::decode(&record),
            Err(TokenError::Malformed(_))
        ));

        let mut record = Token::quit(p(1)).encode();
        record[35] = 1;
        assert!(matches!(
            Token::decode(&record),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_populated_unused_fields() {
        // Payload on a Join
        let mut record = Token::join(p(1), p(2)).encode();
        record[4] = 1;
        assert!(matches!(
            Token::decode(&record),
            Err(TokenError::Malformed(_))
        ));

        // Target on a Message
        let mut record = Token::message(p(1), 5).encode();
        record[12] = 10;
        assert!(matches!(
            Token::decode(&record),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_short_input() {
        let record = Token::quit(p(1)).encode();
        let err = Token::decode(&record[..10]).unwrap_err();
        assert!(matches!(err, TokenError::Truncated { got: 10 }));
        assert!(!err.is_anomaly());
    }

    #[tokio::test]
    async fn test_read_consecutive_records() {
        let first = Token::join(p(1), p(2));
        let second = Token::message(p(1), 42);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&first.encode());
        bytes.extend_from_slice(&second.encode());

        let mut reader = bytes.as_slice();
        assert_eq!(Token::read_from(&mut reader).await.unwrap(), Some(first));
        assert_eq!(Token::read_from(&mut reader).await.unwrap(), Some(second));
        assert_eq!(Token::read_from(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_truncated_record() {
        let record = Token::message(p(1), 42).encode();
        let mut reader = &record[..TOKEN_SIZE - 1];
        let err = Token::read_from(&mut reader).await.unwrap_err();
        assert!(matches!(err, TokenError::Truncated { got } if got == TOKEN_SIZE - 1));
    }

    #[tokio::test]
    async fn test_write_to_emits_one_record() {
        let token = Token::message(p(1), -3);
        let mut out = Vec::new();
        token.write_to(&mut out).await.unwrap();
        assert_eq!(out.len(), TOKEN_SIZE);
        assert_eq!(Token::decode(&out).unwrap(), token);
    }
}
