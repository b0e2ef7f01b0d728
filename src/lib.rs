// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Logoot: a sequence CRDT for collaborative text
//!
//! This crate provides a Rust implementation of **Logoot**, a Conflict-Free Replicated Datatype
//! (CRDT) for ordered sequences such as the characters of a text. It is based on the paper
//! ["Logoot: A Scalable Optimistic Replication Algorithm for Collaborative Editing on P2P
//! Networks"][paper].
//!
//! Independent replicas edit their own copy of the sequence without coordination. Every edit
//! names the atom it touches by a [`Position`], an identifier that is unique across replicas
//! and totally ordered. Since the order of atoms is fully determined by their positions, replicas
//! that have seen the same inserts and deletes hold the same sequence, regardless of the order in
//! which those edits arrived or how often.
//!
//! [paper]: https://hal.inria.fr/inria-00432368/document
//!
//! ## Core Concepts
//!
//! - [`Identifier`]: an `(ident, site)` pair. `ident` orders, `site` is the id of the replica
//!   that minted the identifier and breaks ties.
//! - [`Position`]: a non-empty sequence of identifiers, compared lexicographically. There is
//!   (practically) always room for a new position between two existing ones, since a position
//!   can grow one level deeper when its current level is exhausted. See
//!   [`Position::between`].
//! - [`Document`]: the ordered `(Position, atom)` pairs of one replica, bounded by the
//!   [`Position::start`] and [`Position::end`] sentinels.
//! - [`Edit`]: an insert or delete with a resolved position, as broadcast to other replicas.
//!
//! ## Getting Started: Concurrent Edits
//!
//! ```rust
//! use logoot::Document;
//! use rand::SeedableRng;
//!
//! // 1. SETUP: TWO REPLICAS
//! // Alice creates the document, Bob starts from a copy of it.
//! let mut alice = Document::with_content(1, ["a", "b", "c"]);
//! let mut bob = alice.fork(2, rand::rngs::StdRng::from_os_rng());
//!
//! // 2. CONCURRENT EDITS
//! // Alice inserts "d" before "c", Bob deletes "a".
//! let c = alice.positions().nth(3).cloned().unwrap();
//! let from_alice = alice.local_insert_left(&c, "d").unwrap();
//!
//! let b = bob.positions().nth(2).cloned().unwrap();
//! let from_bob = bob.local_delete_left(&b).unwrap();
//!
//! // 3. SYNC
//! assert!(alice.apply(from_bob));
//! assert!(bob.apply(from_alice));
//!
//! // Both replicas hold the same sequence.
//! assert_eq!(alice, bob);
//! assert_eq!(alice.text(), "bdc");
//! ```
//!
//! ## Scope of this Crate
//!
//! This crate provides the data structure and the algorithms only. **It does not include any
//! networking.** You are responsible for shipping [`Edit`]s between replicas; positions have a
//! compact byte encoding for that purpose (see [`Position::encode`] and [`Position::decode`]),
//! and with the `serde` feature edits can be serialized directly.
//!
//! The transport must deliver an insert before any delete of the same position. A delete that
//! arrives first finds nothing to remove and is dropped, after which the insert sticks. Beyond
//! that, no ordering is required and duplicates are harmless: a document remembers the positions
//! it deleted, so a late copy of their insert changes nothing, and local edits never mint a
//! deleted position again.
//!
//! ## Features
//!
//! - `serde`: Provides `serde` support for [`Identifier`], [`Position`] and [`Edit`]. Positions
//!   serialize as their compact byte encoding.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for [`Identifier`] and [`Position`], useful
//!   for property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod document;
pub use document::Document;
pub mod edit;
pub use edit::Edit;
pub mod position;
pub use position::{CodecError, Identifier, MAX_IDENT, Position};
/// Macros usable for tests and initialization
pub mod macros;

#[cfg(any(test, feature = "arbitrary"))]
mod test_util;
