// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The replicated sequence itself.
//!
//! A [`Document`] is an ordered list of `(Position, atom)` pairs, bounded by the
//! [`start`](Position::start) and [`end`](Position::end) sentinels. Local edits are expressed
//! relative to an existing anchor position (see [`Document::insert_left`] and friends), which
//! mints a fresh position for the new atom. Remote edits arrive with their positions already
//! fixed and are applied with [`Document::insert`], [`Document::delete`] or
//! [`Document::apply`].
use crate::{Edit, Position};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::BTreeSet, fmt};
use tracing::{debug, trace};

/// A Logoot sequence of atoms (usually characters), replicated across sites.
///
/// Each replica owns one `Document` with its own `site` id. Replicas that receive the same set of
/// [`Edit`]s converge to the same sequence of pairs, no matter in which order (inserts before the
/// deletes that target them) or how many times the edits arrive.
///
/// A document remembers every position it has deleted. Such a position is never taken again,
/// neither by a late duplicate of its insert nor by a local insert at the same spot, which mints
/// a fresh position past it instead. This set only grows.
///
/// The document is a plain value without interior synchronization. To share one replica between
/// threads, guard it with a single lock (for example, `Mutex<Document>`) around every operation.
///
/// The random source `R` is used to pick new positions inside gaps. It defaults to an OS-seeded
/// [`StdRng`]; use [`Document::with_rng`] with a seeded generator for reproducible positions.
///
/// ```rust
/// # use logoot::{Document, Position};
/// let mut doc = Document::with_content(1, ["a", "c"]);
/// let c = doc.positions().nth(2).cloned().unwrap();
/// doc.insert_left(&c, "b").unwrap();
/// assert_eq!(doc.text(), "abc");
/// ```
#[derive(Clone)]
pub struct Document<R = StdRng> {
    site: u8,
    /// Always sorted, with no duplicate positions. The sentinels are the first and last entries.
    pairs: Vec<(Position, String)>,
    deleted: BTreeSet<Position>,
    rng: R,
}

impl Document<StdRng> {
    /// Creates an empty document for the replica `site`.
    pub fn new(site: u8) -> Self {
        Self::with_rng(site, StdRng::from_os_rng())
    }

    /// Creates a document for the replica `site` holding `atoms` in order.
    pub fn with_content<I>(site: u8, atoms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut doc = Self::new(site);
        doc.extend(atoms);
        doc
    }
}

impl<R> Document<R> {
    /// The id this replica mints identifiers with.
    pub fn site(&self) -> u8 {
        self.site
    }

    /// Number of atoms, not counting the sentinels.
    pub fn len(&self) -> usize {
        self.pairs.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of `p` among all pairs, sentinels included.
    ///
    /// Returns `Err` with the index `p` would be inserted at if it is not present.
    pub fn index(&self, p: &Position) -> Result<usize, usize> {
        self.pairs.binary_search_by(|(q, _)| q.cmp(p))
    }

    /// Returns the atom at `p`, if any.
    ///
    /// The sentinels hold the empty atom.
    pub fn get(&self, p: &Position) -> Option<&str> {
        let i = self.index(p).ok()?;
        Some(&self.pairs[i].1)
    }

    /// Returns true if `p` is stored in this document.
    pub fn contains(&self, p: &Position) -> bool {
        self.index(p).is_ok()
    }

    /// Inserts `atom` at `p`.
    ///
    /// Returns false, without changing anything, if `p` is already taken or was deleted before
    /// (which makes repeated delivery of the same insert harmless) or if `p` does not sort
    /// strictly between the sentinels.
    pub fn insert(&mut self, p: Position, atom: impl Into<String>) -> bool {
        let Some(i) = self.insertion_index(&p) else {
            return false;
        };
        let atom = atom.into();
        trace!(position = ?p, %atom, "insert");
        self.pairs.insert(i, (p, atom));
        true
    }

    fn insertion_index(&self, p: &Position) -> Option<usize> {
        match self.index(p) {
            Ok(_) => {
                debug!(position = ?p, "position already taken");
                None
            }
            // before start, or at/after end
            Err(_) if self.deleted.contains(p) => {
                debug!(position = ?p, "position was deleted before");
                None
            }
            Err(i) if i == 0 || i == self.pairs.len() => {
                debug!(position = ?p, "position outside document bounds");
                None
            }
            Err(i) => Some(i),
        }
    }

    /// Deletes the atom at `p`.
    ///
    /// Returns false, without changing anything, if `p` is absent (which makes repeated delivery
    /// of the same delete harmless) or is one of the sentinels.
    pub fn delete(&mut self, p: &Position) -> bool {
        match self.index(p) {
            Ok(i) if i == 0 || i == self.pairs.len() - 1 => {
                debug!(position = ?p, "sentinels cannot be deleted");
                false
            }
            Ok(i) => {
                let (position, atom) = self.pairs.remove(i);
                trace!(?position, %atom, "delete");
                self.deleted.insert(position);
                true
            }
            Err(_) => {
                debug!(position = ?p, "no atom to delete");
                false
            }
        }
    }

    /// The position immediately before `p`.
    ///
    /// Returns `None` if `p` is not stored or is the start sentinel. May return the start
    /// sentinel itself, which is a valid left bound for generating positions.
    pub fn left(&self, p: &Position) -> Option<&Position> {
        match self.index(p) {
            Ok(i) if i > 0 => Some(&self.pairs[i - 1].0),
            _ => None,
        }
    }

    /// The position immediately after `p`.
    ///
    /// Returns `None` if `p` is not stored or is the end sentinel. May return the end sentinel
    /// itself, which is a valid right bound for generating positions.
    pub fn right(&self, p: &Position) -> Option<&Position> {
        match self.index(p) {
            Ok(i) if i + 1 < self.pairs.len() => Some(&self.pairs[i + 1].0),
            _ => None,
        }
    }

    /// The atoms between the sentinels, in order.
    pub fn content(&self) -> impl Iterator<Item = &str> + '_ {
        self.pairs[1..self.pairs.len() - 1]
            .iter()
            .map(|(_, atom)| atom.as_str())
    }

    /// The atoms concatenated.
    pub fn text(&self) -> String {
        self.content().collect()
    }

    /// All pairs in order, sentinels included.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, &str)> + '_ {
        self.pairs.iter().map(|(p, atom)| (p, atom.as_str()))
    }

    /// All positions in order, sentinels included.
    pub fn positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.pairs.iter().map(|(p, _)| p)
    }

    /// Applies an edit received from another replica.
    ///
    /// Returns false if the edit changed nothing, see [`insert`](Self::insert) and
    /// [`delete`](Self::delete).
    pub fn apply(&mut self, edit: Edit) -> bool {
        match edit {
            Edit::Insert { position, atom } => self.insert(position, atom),
            Edit::Delete { position } => self.delete(&position),
        }
    }

    /// Starts a new replica `site` from the current state of this one.
    pub fn fork<S>(&self, site: u8, rng: S) -> Document<S> {
        Document {
            site,
            pairs: self.pairs.clone(),
            deleted: self.deleted.clone(),
            rng,
        }
    }
}

impl<R> Document<R>
where
    R: Rng,
{
    /// Creates an empty document for the replica `site` that draws positions from `rng`.
    pub fn with_rng(site: u8, rng: R) -> Self {
        Self {
            site,
            pairs: vec![(Position::start(), String::new()), (Position::end(), String::new())],
            deleted: BTreeSet::new(),
            rng,
        }
    }

    /// Mints a position between `left` and `right` for this replica.
    ///
    /// See [`Position::between`].
    pub fn generate(&mut self, left: &Position, right: &Position) -> Option<Position> {
        Position::between(left, right, self.site, &mut self.rng)
    }

    /// Inserts `atom` immediately before `anchor`, returning the new position.
    ///
    /// Returns `None` if `anchor` is not stored or is the start sentinel.
    pub fn insert_left(&mut self, anchor: &Position, atom: impl Into<String>) -> Option<Position> {
        let left = self.left(anchor)?.clone();
        self.insert_between(&left, anchor, atom)
    }

    /// Inserts `atom` immediately after `anchor`, returning the new position.
    ///
    /// Returns `None` if `anchor` is not stored or is the end sentinel.
    pub fn insert_right(&mut self, anchor: &Position, atom: impl Into<String>) -> Option<Position> {
        let right = self.right(anchor)?.clone();
        self.insert_between(anchor, &right, atom)
    }

    fn insert_between(
        &mut self,
        left: &Position,
        right: &Position,
        atom: impl Into<String>,
    ) -> Option<Position> {
        let mut position = self.generate(left, right)?;
        // some gaps always yield the same position, which may already have been deleted
        while self.deleted.contains(&position) {
            debug!(?position, "minted a deleted position, minting past it");
            position = self.generate(&position, right)?;
        }
        // nothing is stored between two neighbors, so the fresh position is free
        self.insert(position.clone(), atom).then_some(position)
    }

    /// Appends `atom` at the end of the document, returning its position.
    pub fn push(&mut self, atom: impl Into<String>) -> Option<Position> {
        self.insert_left(&Position::end(), atom)
    }

    /// Deletes the atom immediately before `anchor`, returning its position.
    ///
    /// Returns `None` if there is no such atom.
    pub fn delete_left(&mut self, anchor: &Position) -> Option<Position> {
        let left = self.left(anchor)?.clone();
        self.delete(&left).then_some(left)
    }

    /// Deletes the atom immediately after `anchor`, returning its position.
    ///
    /// Returns `None` if there is no such atom.
    pub fn delete_right(&mut self, anchor: &Position) -> Option<Position> {
        let right = self.right(anchor)?.clone();
        self.delete(&right).then_some(right)
    }

    /// Like [`insert_left`](Self::insert_left), but returns the [`Edit`] to broadcast.
    pub fn local_insert_left(
        &mut self,
        anchor: &Position,
        atom: impl Into<String>,
    ) -> Option<Edit> {
        let atom = atom.into();
        let position = self.insert_left(anchor, atom.clone())?;
        Some(Edit::insert(position, atom))
    }

    /// Like [`insert_right`](Self::insert_right), but returns the [`Edit`] to broadcast.
    pub fn local_insert_right(
        &mut self,
        anchor: &Position,
        atom: impl Into<String>,
    ) -> Option<Edit> {
        let atom = atom.into();
        let position = self.insert_right(anchor, atom.clone())?;
        Some(Edit::insert(position, atom))
    }

    /// Like [`delete_left`](Self::delete_left), but returns the [`Edit`] to broadcast.
    pub fn local_delete_left(&mut self, anchor: &Position) -> Option<Edit> {
        self.delete_left(anchor).map(Edit::delete)
    }

    /// Like [`delete_right`](Self::delete_right), but returns the [`Edit`] to broadcast.
    pub fn local_delete_right(&mut self, anchor: &Position) -> Option<Edit> {
        self.delete_right(anchor).map(Edit::delete)
    }
}

impl<R, A> Extend<A> for Document<R>
where
    R: Rng,
    A: Into<String>,
{
    fn extend<I: IntoIterator<Item = A>>(&mut self, atoms: I) {
        for atom in atoms {
            let pushed = self.push(atom);
            debug_assert!(pushed.is_some(), "there is always room before the end sentinel");
        }
    }
}

/// Documents are equal if they hold the same pairs. The site and random source are local to
/// each replica and not compared.
impl<R, S> PartialEq<Document<S>> for Document<R> {
    fn eq(&self, other: &Document<S>) -> bool {
        self.pairs == other.pairs
    }
}

impl<R> Eq for Document<R> {}

impl<R> fmt::Debug for Document<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("site", &self.site)
            .field("pairs", &self.pairs)
            .finish_non_exhaustive()
    }
}

impl<R> fmt::Display for Document<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.content().try_for_each(|atom| f.write_str(atom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_IDENT, pos};
    use rand::seq::SliceRandom;

    type Doc = Document<StdRng>;

    fn doc(site: u8, content: &str) -> Doc {
        let mut doc = Document::with_rng(site, StdRng::seed_from_u64(u64::from(site)));
        doc.extend(content.chars().map(String::from));
        doc
    }

    fn nth(doc: &Doc, i: usize) -> Position {
        doc.positions().nth(i).cloned().unwrap()
    }

    #[test]
    fn new_document_holds_only_sentinels() {
        let doc = Document::new(3);
        assert!(doc.is_empty());
        assert_eq!(doc.site(), 3);
        assert_eq!(
            doc.positions().cloned().collect::<Vec<_>>(),
            [Position::start(), Position::end()]
        );
        assert_eq!(doc.text(), "");
        assert_eq!(doc.get(&Position::start()), Some(""));
    }

    #[test]
    fn content_construction() {
        let doc = doc(1, "abc");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.content().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(doc.to_string(), "abc");

        let positions: Vec<_> = doc.positions().cloned().collect();
        assert_eq!(positions.first(), Some(&Position::start()));
        assert_eq!(positions.last(), Some(&Position::end()));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn with_content_keeps_order() {
        let doc = Document::with_content(9, ["he", "ll", "o"]);
        assert_eq!(doc.text(), "hello");
    }

    #[test]
    fn insert_get_round_trip() {
        let mut doc = doc(1, "");
        let p = pos![(400, 2)];
        assert!(doc.insert(p.clone(), "x"));
        assert_eq!(doc.get(&p), Some("x"));
        assert!(!doc.insert(p.clone(), "y"));
        assert_eq!(doc.get(&p), Some("x"));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn insert_outside_sentinels_is_rejected() {
        let mut doc = doc(1, "");
        assert!(!doc.insert(Position::start(), "x"));
        assert!(!doc.insert(Position::end(), "x"));
        assert!(!doc.insert(pos![(MAX_IDENT, 0), (1, 1)], "x"));
        assert!(!doc.insert(pos![(MAX_IDENT, 1)], "x"));
        assert!(doc.is_empty());

        assert!(doc.insert(pos![(0, 0), (1, 1)], "x"));
        assert!(doc.insert(pos![(MAX_IDENT - 1, 255), (MAX_IDENT, 255)], "y"));
        assert_eq!(doc.text(), "xy");
    }

    #[test]
    fn delete_is_idempotent() {
        let mut doc = doc(1, "abc");
        let b = nth(&doc, 2);
        assert!(doc.delete(&b));
        assert_eq!(doc.len(), 2);
        assert!(!doc.delete(&b));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.text(), "ac");
        assert_eq!(doc.get(&b), None);
    }

    #[test]
    fn sentinels_are_immutable() {
        let mut doc = doc(1, "");
        assert!(!doc.delete(&Position::start()));
        assert!(!doc.delete(&Position::end()));
        assert_eq!(doc.positions().count(), 2);
        assert_eq!(doc.delete_left(&Position::end()), None);
        assert_eq!(doc.delete_right(&Position::start()), None);
        assert_eq!(doc.positions().count(), 2);
    }

    #[test]
    fn index_reports_insertion_point() {
        let doc = doc(1, "abc");
        let b = nth(&doc, 2);
        assert_eq!(doc.index(&b), Ok(2));
        assert_eq!(doc.index(&Position::start()), Ok(0));
        assert_eq!(doc.index(&Position::end()), Ok(4));
        let before_everything = pos![(0, 0), (0, 0)];
        assert_eq!(doc.index(&before_everything), Err(1));
        assert!(!doc.contains(&before_everything));
    }

    #[test]
    fn neighbors() {
        let doc = doc(1, "ab");
        let (start, a, b, end) = (nth(&doc, 0), nth(&doc, 1), nth(&doc, 2), nth(&doc, 3));
        assert_eq!(doc.left(&start), None);
        assert_eq!(doc.left(&a), Some(&start));
        assert_eq!(doc.right(&a), Some(&b));
        assert_eq!(doc.right(&b), Some(&end));
        assert_eq!(doc.right(&end), None);

        let missing = pos![(7, 7)];
        assert_eq!(doc.left(&missing), None);
        assert_eq!(doc.right(&missing), None);
    }

    #[test]
    fn insert_relative_to_anchor() {
        let mut doc = doc(1, "ac");
        let a = nth(&doc, 1);
        let c = nth(&doc, 2);
        let b = doc.insert_left(&c, "b").unwrap();
        assert!(a < b && b < c);
        let d = doc.insert_right(&c, "d").unwrap();
        assert!(c < d && d < Position::end());
        assert_eq!(doc.text(), "abcd");

        assert_eq!(doc.insert_left(&Position::start(), "x"), None);
        assert_eq!(doc.insert_right(&Position::end(), "x"), None);
        assert_eq!(doc.insert_left(&pos![(7, 7)], "x"), None);
        assert_eq!(doc.text(), "abcd");
    }

    #[test]
    fn delete_relative_to_anchor() {
        let mut doc = doc(1, "abc");
        let (a, b, c) = (nth(&doc, 1), nth(&doc, 2), nth(&doc, 3));
        assert_eq!(doc.delete_left(&b), Some(a.clone()));
        assert_eq!(doc.delete_right(&b), Some(c));
        assert_eq!(doc.text(), "b");
        assert_eq!(doc.delete_left(&a), None);
    }

    #[test]
    fn local_edits_replay_on_other_replicas() {
        let mut a = doc(1, "ac");
        let mut b = a.fork(2, StdRng::seed_from_u64(2));
        assert_eq!(a, b);

        let c = nth(&a, 2);
        let insert = a.local_insert_left(&c, "b").unwrap();
        let delete = a.local_delete_right(insert.position()).unwrap();
        assert_eq!(delete, Edit::delete(c));
        assert!(b.apply(insert.clone()));
        assert!(b.apply(delete.clone()));
        assert!(!b.apply(insert));
        assert!(!b.apply(delete));
        assert_eq!(a, b);
        assert_eq!(b.text(), "ab");
    }

    #[test]
    fn deleted_position_is_never_minted_again() {
        let mut a = doc(2, "");
        assert!(a.insert(pos![(3, 1)], "a"));
        assert!(a.insert(pos![(4, 1)], "c"));
        let mut b = a.fork(1, StdRng::seed_from_u64(1));
        let c = pos![(4, 1)];

        // this gap always yields (3, 2) for site 2
        let x = a.local_insert_left(&c, "x").unwrap();
        assert_eq!(x.position(), &pos![(3, 2)]);
        let delete = a.local_delete_left(&c).unwrap();
        assert_eq!(delete, Edit::delete(pos![(3, 2)]));
        let y = a.local_insert_left(&c, "y").unwrap();
        assert_ne!(y.position(), x.position());
        assert!(x.position() < y.position() && y.position() < &c);
        assert_eq!(a.text(), "ayc");

        // both inserts arrive before the delete
        assert!(b.apply(x));
        assert!(b.apply(y));
        assert!(b.apply(delete));
        assert_eq!(a, b);
        assert_eq!(b.text(), "ayc");
    }

    #[test]
    fn deleted_position_is_not_revived_by_a_late_duplicate() {
        let mut doc = doc(1, "ab");
        let b = nth(&doc, 2);
        let insert = Edit::insert(b.clone(), "b");
        assert!(doc.delete(&b));
        assert!(!doc.apply(insert));
        assert!(!doc.insert(b.clone(), "z"));
        assert_eq!(doc.text(), "a");
        assert_eq!(doc.get(&b), None);

        // forks remember it too
        let mut other = doc.fork(2, StdRng::seed_from_u64(2));
        assert!(!other.insert(b, "z"));
    }

    #[test]
    fn retyping_in_place_keeps_minting_fresh_positions() {
        let mut doc = doc(2, "");
        assert!(doc.insert(pos![(3, 1)], "a"));
        assert!(doc.insert(pos![(4, 1)], "c"));
        let c = pos![(4, 1)];
        let mut seen = BTreeSet::new();
        for i in 0..100 {
            let atom = char::from(b'a' + (i % 26) as u8);
            let p = doc.insert_left(&c, atom).unwrap();
            assert!(seen.insert(p.clone()), "{p:?} minted twice");
            assert_eq!(doc.delete_left(&c), Some(p));
        }
        assert_eq!(doc.text(), "ac");
    }

    #[test]
    fn equality_ignores_site() {
        let a = doc(1, "");
        let b = doc(2, "");
        assert_eq!(a, b);
        assert_ne!(a, doc(1, "x"));
    }

    #[test]
    fn seeded_replicas_are_reproducible() {
        assert_eq!(doc(4, "hello"), doc(4, "hello"));
    }

    #[test]
    fn debug_rendering() {
        let mut doc = doc(1, "");
        doc.insert(pos![(7, 1)], "x");
        insta::assert_snapshot!(
            format!("{doc:?}"),
            @r#"Document { site: 1, pairs: [([(0, 0)], ""), ([(7, 1)], "x"), ([(65535, 0)], "")], .. }"#
        );
    }

    /// Applies one locally generated edit described by `(anchor, atom, insert)`.
    fn local_edit(doc: &mut Doc, (anchor, atom, insert): (u8, u8, bool)) -> Option<Edit> {
        let anchor = nth(doc, usize::from(anchor) % doc.positions().count());
        if insert {
            let atom = char::from(b'a' + atom % 26);
            doc.local_insert_left(&anchor, atom)
        } else {
            doc.local_delete_left(&anchor)
        }
    }

    /// Duplicates and shuffles `edits`. A delete is held back until the first copy of the insert
    /// of its position has been delivered; nothing else about the order is kept.
    fn deliver(edits: Vec<Edit>, rng: &mut StdRng) -> Vec<Edit> {
        let mut pending: BTreeSet<Position> = edits
            .iter()
            .filter(|edit| matches!(edit, Edit::Insert { .. }))
            .map(|edit| edit.position().clone())
            .collect();
        let mut shuffled: Vec<_> = edits
            .into_iter()
            .flat_map(|edit| [edit.clone(), edit])
            .collect();
        shuffled.shuffle(rng);

        let mut held = Vec::new();
        let mut delivered = Vec::with_capacity(shuffled.len());
        for edit in shuffled {
            let position = edit.position().clone();
            match edit {
                Edit::Insert { .. } if pending.remove(&position) => {
                    delivered.push(edit);
                    let (released, kept): (Vec<_>, Vec<_>) = held
                        .into_iter()
                        .partition(|delete: &Edit| delete.position() == &position);
                    delivered.extend(released);
                    held = kept;
                }
                Edit::Delete { .. } if pending.contains(&position) => held.push(edit),
                _ => delivered.push(edit),
            }
        }
        assert!(held.is_empty());
        delivered
    }

    #[quickcheck]
    fn concurrent_edits_converge(
        a_ops: Vec<(u8, u8, bool)>,
        b_ops: Vec<(u8, u8, bool)>,
        seed: u64,
    ) -> bool {
        let base = doc(0, "abc");
        let mut a = base.fork(1, StdRng::seed_from_u64(seed));
        let mut b = base.fork(2, StdRng::seed_from_u64(seed.wrapping_add(1)));

        let a_edits: Vec<_> = a_ops.into_iter().filter_map(|op| local_edit(&mut a, op)).collect();
        let b_edits: Vec<_> = b_ops.into_iter().filter_map(|op| local_edit(&mut b, op)).collect();

        let mut rng = StdRng::seed_from_u64(seed);
        for edit in deliver(b_edits, &mut rng) {
            a.apply(edit);
        }
        for edit in deliver(a_edits, &mut rng) {
            b.apply(edit);
        }
        a == b
    }

    #[quickcheck]
    fn pairs_stay_sorted(ops: Vec<(u8, u8, bool)>, seed: u64) -> bool {
        let mut doc = doc(0, "").fork(1, StdRng::seed_from_u64(seed));
        for op in ops {
            local_edit(&mut doc, op);
        }
        let positions: Vec<_> = doc.positions().collect();
        positions.first() == Some(&&Position::start())
            && positions.last() == Some(&&Position::end())
            && positions.windows(2).all(|w| w[0] < w[1])
    }
}
