// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Position identifiers and their total order.
//!
//! A [`Position`] names a slot in a [`Document`](crate::Document). It is a non-empty sequence
//! of [`Identifier`]s compared lexicographically: the first differing [`Identifier`] decides,
//! and if one position is a strict prefix of the other, the shorter one sorts first.
//!
//! Positions are dense in the sense that matters for editing: between two positions minted by
//! [`Position::between`] there is (almost) always room for another one, since a position can
//! always grow one level deeper when the gap at the current depth is exhausted. Note that nothing
//! ever shrinks a position again, so pathological editing patterns (for example, always typing at
//! the same boundary from two sites with interleaved site ids) can produce arbitrarily long
//! positions.
use smallvec::SmallVec;
use std::{cmp::Ordering, fmt, ops::Deref};

mod codec;
mod generate;

pub use codec::CodecError;

/// Largest representable [`Identifier::ident`] value.
///
/// Used by the [`End`](Position::end) sentinel, which therefore bounds every other position.
pub const MAX_IDENT: u16 = u16::MAX;

/// The atomic unit of a [`Position`].
///
/// `ident` gives the coarse ordering. `site` is the id of the replica that minted the identifier
/// and breaks ties between identifiers with the same `ident`, so that two replicas never
/// independently mint the same identifier at the same depth.
///
/// The derived [`Ord`] compares `ident` first and `site` second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Identifier {
    pub ident: u16,
    pub site: u8,
}

impl Identifier {
    pub const fn new(ident: u16, site: u8) -> Self {
        Self { ident, site }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ident, self.site)
    }
}

impl From<(u16, u8)> for Identifier {
    fn from((ident, site): (u16, u8)) -> Self {
        Self { ident, site }
    }
}

// four levels covers everything but heavily contended boundaries without spilling to the heap.
pub(crate) type Identifiers = SmallVec<[Identifier; 4]>;

/// A position in a [`Document`](crate::Document).
///
/// Always holds at least one [`Identifier`]. Derefs to `[Identifier]` for read access.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Position(pub(crate) Identifiers);

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.0, &other.0)
    }
}

/// Compares two identifier sequences.
///
/// The first differing identifier decides (`ident`, then `site`). If all shared entries are
/// equal, the longer sequence is the greater one.
pub(crate) fn compare(left: &[Identifier], right: &[Identifier]) -> Ordering {
    for (l, r) in left.iter().zip(right) {
        match l.cmp(r) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    left.len().cmp(&right.len())
}

impl Deref for Position {
    type Target = [Identifier];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Position {
    /// The first position of every document: `[(0, 0)]`.
    pub fn start() -> Self {
        Self(smallvec::smallvec![Identifier::new(0, 0)])
    }

    /// The last position of every document: `[(MAX_IDENT, 0)]`.
    pub fn end() -> Self {
        Self(smallvec::smallvec![Identifier::new(MAX_IDENT, 0)])
    }

    /// Builds a position from a sequence of identifiers.
    ///
    /// Returns `None` if `ids` is empty.
    pub fn new<I>(ids: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let ids: Identifiers = ids.into_iter().map(Into::into).collect();
        (!ids.is_empty()).then_some(Self(ids))
    }

    /// Creates a `Position` from a raw identifier slice.
    ///
    /// Returns `None` if the slice is empty.
    pub fn from_raw(ids: &[Identifier]) -> Option<Self> {
        (!ids.is_empty()).then(|| Self(SmallVec::from_slice(ids)))
    }

    /// Returns the identifiers making up this position.
    pub fn as_raw(&self) -> &[Identifier] {
        &self.0
    }

    /// Number of identifiers in this position. Never zero.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this is the [`start`](Self::start) or [`end`](Self::end) sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [Identifier { ident: 0, site: 0 }] | [Identifier { ident: MAX_IDENT, site: 0 }]
        )
    }
}

#[cfg(feature = "serde")]
impl ::serde::Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        let bytes = self.encode().map_err(::serde::ser::Error::custom)?;
        ::serde::Serialize::serialize(serde_bytes::Bytes::new(&bytes), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> ::serde::Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        let bytes = <serde_bytes::ByteBuf as ::serde::Deserialize>::deserialize(deserializer)?;
        Position::decode(&bytes).map_err(::serde::de::Error::custom)
    }
}
