//! The token: the only message that travels the ring.

use crate::Address;
use std::fmt::{self, Display, Formatter};

/// Event carried by a token.
///
/// Discriminants are the on-wire tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// A peer announcing that it is inserting itself in front of `target_next`
    Join = 1,
    /// Application payload circulating once around the ring
    Message = 2,
    /// Locally delivered shutdown signal
    Quit = 3,
}

impl TokenKind {
    /// Wire tag for this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a kind by wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Join),
            2 => Some(Self::Message),
            3 => Some(Self::Quit),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Join => "Join",
            Self::Message => "Message",
            Self::Quit => "Quit",
        };
        f.write_str(name)
    }
}

/// A token with author/sender provenance.
///
/// Fields a kind does not use are always zero: construct tokens through
/// [`Token::join`], [`Token::message`] and [`Token::quit`], and the codec
/// rejects records that violate this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    payload: i64,
    target_next: Address,
    sender: Address,
    author: Address,
}

impl Token {
    /// Announce that `author` is inserting itself in front of `target_next`.
    pub fn join(author: Address, target_next: Address) -> Self {
        Self {
            kind: TokenKind::Join,
            payload: 0,
            target_next,
            sender: author,
            author,
        }
    }

    /// Application payload authored by `author`.
    pub fn message(author: Address, payload: i64) -> Self {
        Self {
            kind: TokenKind::Message,
            payload,
            target_next: Address::UNSPECIFIED,
            sender: author,
            author,
        }
    }

    /// Shutdown signal for the receiving peer.
    pub fn quit(author: Address) -> Self {
        Self {
            kind: TokenKind::Quit,
            payload: 0,
            target_next: Address::UNSPECIFIED,
            sender: author,
            author,
        }
    }

    /// Reassemble a token from decoded fields. Callers have validated that
    /// unused fields are zero.
    pub(crate) fn from_parts(
        kind: TokenKind,
        payload: i64,
        target_next: Address,
        sender: Address,
        author: Address,
    ) -> Self {
        Self {
            kind,
            payload,
            target_next,
            sender,
            author,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Message value (zero for other kinds).
    pub fn payload(&self) -> i64 {
        self.payload
    }

    /// Join insertion target (unspecified for other kinds).
    pub fn target_next(&self) -> Address {
        self.target_next
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn author(&self) -> Address {
        self.author
    }

    /// Whether `address` created this token.
    pub fn is_authored_by(&self, address: Address) -> bool {
        self.author == address
    }

    /// The same token, stamped as last relayed by `address`.
    pub fn relayed_by(self, address: Address) -> Self {
        Self {
            sender: address,
            ..self
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Join => write!(
                f,
                "Join(author={}, sender={}, target={})",
                self.author, self.sender, self.target_next
            ),
            TokenKind::Message => write!(
                f,
                "Message(author={}, sender={}, payload={})",
                self.author, self.sender, self.payload
            ),
            TokenKind::Quit => write!(f, "Quit(author={})", self.author),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(port: u16) -> Address {
        Address::localhost(port)
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(TokenKind::Join.tag(), 1);
        assert_eq!(TokenKind::Message.tag(), 2);
        assert_eq!(TokenKind::Quit.tag(), 3);

        for kind in [TokenKind::Join, TokenKind::Message, TokenKind::Quit] {
            assert_eq!(TokenKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(TokenKind::from_tag(0), None);
        assert_eq!(TokenKind::from_tag(4), None);
    }

    #[test]
    fn test_join_zeroes_payload() {
        let token = Token::join(p(1), p(2));
        assert_eq!(token.kind(), TokenKind::Join);
        assert_eq!(token.payload(), 0);
        assert_eq!(token.target_next(), p(2));
        assert_eq!(token.sender(), p(1));
        assert_eq!(token.author(), p(1));
    }

    #[test]
    fn test_message_zeroes_target() {
        let token = Token::message(p(1), 42);
        assert_eq!(token.payload(), 42);
        assert!(token.target_next().is_unspecified());
    }

    #[test]
    fn test_quit_zeroes_everything_but_provenance() {
        let token = Token::quit(p(1));
        assert_eq!(token.payload(), 0);
        assert!(token.target_next().is_unspecified());
        assert_eq!(token.author(), p(1));
    }

    #[test]
    fn test_relayed_by_keeps_author() {
        let token = Token::message(p(1), 7).relayed_by(p(2)).relayed_by(p(3));
        assert_eq!(token.sender(), p(3));
        assert_eq!(token.author(), p(1));
        assert!(token.is_authored_by(p(1)));
        assert!(!token.is_authored_by(p(3)));
    }

    #[test]
    fn test_display() {
        let join = Token::join(p(1), p(2));
        assert_eq!(
            join.to_string(),
            "Join(author=127.0.0.1:1, sender=127.0.0.1:1, target=127.0.0.1:2)"
        );
        assert_eq!(Token::quit(p(9)).to_string(), "Quit(author=127.0.0.1:9)");
    }
}
