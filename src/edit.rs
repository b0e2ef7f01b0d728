// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Edits exchanged between replicas.
//!
//! An [`Edit`] is what a replica broadcasts after changing its own [`Document`](crate::Document),
//! and what every other replica feeds into [`Document::apply`](crate::Document::apply). Edits
//! carry fully resolved positions, so applying one never needs to generate anything.
//!
//! Applying edits is convergent regardless of delivery order or duplication:
//!
//! - inserts at different positions commute, and a repeated insert is a no-op, even after its
//!   position was deleted,
//! - a repeated delete is a no-op,
//! - an insert and a delete of different positions commute.
//!
//! Delivering a delete before the insert it removes is the transport's problem: the delete is
//! dropped and the later insert sticks.
use crate::Position;
use std::fmt;

/// A single change to a [`Document`](crate::Document).
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Edit {
    /// Insert `atom` at `position`.
    Insert { position: Position, atom: String },
    /// Delete whatever is at `position`.
    Delete { position: Position },
}

impl Edit {
    pub fn insert(position: Position, atom: impl Into<String>) -> Self {
        Self::Insert {
            position,
            atom: atom.into(),
        }
    }

    pub fn delete(position: Position) -> Self {
        Self::Delete { position }
    }

    /// The position this edit targets.
    pub fn position(&self) -> &Position {
        match self {
            Self::Insert { position, .. } | Self::Delete { position } => position,
        }
    }
}

impl fmt::Debug for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert { position, atom } => write!(f, "+{atom:?}@{position:?}"),
            Self::Delete { position } => write!(f, "-@{position:?}"),
        }
    }
}
