// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Compact byte encoding of positions, used whenever a position crosses a process boundary.
//!
//! ```text
//! +-------+--------------+------+--------------+------+-----
//! |  len  |  ident (BE)  | site |  ident (BE)  | site | ...
//! +-------+--------------+------+--------------+------+-----
//!   1 B        2 B         1 B
//! ```
//!
//! `len` counts identifiers, so a position can be at most 255 identifiers deep to be encoded.
use super::{Identifier, Identifiers, Position};
use std::fmt;

const LEN_BYTES: usize = 1;
const IDENTIFIER_BYTES: usize = 3;

/// Error returned when a [`Position`] cannot be encoded or decoded.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum CodecError {
    /// The encoding announces zero identifiers.
    Empty,

    /// The position is deeper than the length byte can express.
    TooLong { len: usize },

    /// Fewer bytes are available than the length byte announces.
    Truncated { expected: usize, actual: usize },

    /// Bytes remain after a complete position.
    TrailingBytes { extra: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Empty => write!(f, "position has no identifiers"),
            CodecError::TooLong { len } => {
                write!(f, "position of {len} identifiers exceeds {}", u8::MAX)
            }
            CodecError::Truncated { expected, actual } => {
                write!(f, "expected {expected} bytes, found {actual}")
            }
            CodecError::TrailingBytes { extra } => {
                write!(f, "{extra} trailing bytes after position")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl Position {
    /// Number of bytes [`encode`](Self::encode) produces for this position.
    pub fn encoded_len(&self) -> usize {
        LEN_BYTES + IDENTIFIER_BYTES * self.depth()
    }

    /// Encodes this position into its wire format.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Appends the wire format of this position to `buf`.
    ///
    /// `buf` is left untouched on error.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = u8::try_from(self.depth()).map_err(|_| CodecError::TooLong {
            len: self.depth(),
        })?;
        buf.reserve(self.encoded_len());
        buf.push(len);
        for id in self.as_raw() {
            buf.extend_from_slice(&id.ident.to_be_bytes());
            buf.push(id.site);
        }
        Ok(())
    }

    /// Decodes a position that occupies all of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Position, CodecError> {
        let (position, rest) = Position::decode_prefix(bytes)?;
        if !rest.is_empty() {
            return Err(CodecError::TrailingBytes { extra: rest.len() });
        }
        Ok(position)
    }

    /// Decodes the position at the start of `bytes` and returns it along with the remaining
    /// bytes.
    ///
    /// Useful when several positions are concatenated in one buffer.
    pub fn decode_prefix(bytes: &[u8]) -> Result<(Position, &[u8]), CodecError> {
        let Some((&len, body)) = bytes.split_first() else {
            return Err(CodecError::Truncated {
                expected: LEN_BYTES,
                actual: 0,
            });
        };
        if len == 0 {
            return Err(CodecError::Empty);
        }

        let body_len = IDENTIFIER_BYTES * usize::from(len);
        if body.len() < body_len {
            return Err(CodecError::Truncated {
                expected: LEN_BYTES + body_len,
                actual: bytes.len(),
            });
        }
        let (body, rest) = body.split_at(body_len);

        let ids: Identifiers = body
            .chunks_exact(IDENTIFIER_BYTES)
            .map(|chunk| Identifier::new(u16::from_be_bytes([chunk[0], chunk[1]]), chunk[2]))
            .collect();
        Ok((Position(ids), rest))
    }
}
