// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{Identifier, Identifiers, MAX_IDENT, Position};
use rand::Rng;
use tracing::debug;

impl Position {
    /// Returns a new position strictly between `left` and `right`.
    ///
    /// The last identifier of the new position always carries `site`, so two replicas with
    /// different site ids never produce the same position. The identifier values themselves are
    /// drawn from `rng` anywhere inside the available gap, which spreads concurrent insertions at
    /// the same spot instead of making them collide on a midpoint. Consequently the result is not
    /// reproducible unless `rng` is.
    ///
    /// Returns `None` if `left >= right`. It also returns `None` in the one configuration where
    /// no position with an identifier owned by `site` can exist: `right` extends `left` by
    /// nothing but `(0, 0)` identifiers, which sort below everything at their depth. Positions
    /// produced by this function never end that way.
    pub fn between<R>(left: &Position, right: &Position, site: u8, rng: &mut R) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        if left >= right {
            debug!(?left, ?right, "cannot generate a position between unordered positions");
            return None;
        }

        let (lp, rp) = (left.as_raw(), right.as_raw());
        let mut p = Identifiers::new();
        for (i, (&l, &r)) in lp.iter().zip(rp).enumerate() {
            if l == r {
                p.push(l);
                continue;
            }

            // `left < right` and this is the first index where they differ, so `l < r`.
            match r.ident - l.ident {
                gap if gap > 1 => {
                    p.push(Identifier::new(random_between(rng, l.ident, r.ident), site));
                }
                1 if site > l.site => p.push(Identifier::new(l.ident, site)),
                1 if site < r.site => p.push(Identifier::new(r.ident, site)),
                0 if l.site < site && site < r.site => p.push(Identifier::new(l.ident, site)),
                _ => {
                    debug!(?left, ?right, site, depth = i, "no room at depth, extending");
                    extend_past(&mut p, l, &lp[i + 1..], site, rng);
                }
            }
            return Some(Position(p));
        }

        // `left` is a strict prefix of `right`: anything that sorts below `right`'s remaining
        // identifiers works, as long as it is not empty.
        for &next in &rp[lp.len()..] {
            match next.ident {
                0 if next.site == 0 => {
                    // nothing sorts below (0, 0) at this depth
                    p.push(next);
                }
                0 => {
                    p.push(Identifier::new(0, site.min(next.site - 1)));
                    p.push(Identifier::new(random_between(rng, 0, MAX_IDENT), site));
                    return Some(Position(p));
                }
                1 => {
                    p.push(Identifier::new(0, site));
                    p.push(Identifier::new(random_between(rng, 0, MAX_IDENT), site));
                    return Some(Position(p));
                }
                ident => {
                    p.push(Identifier::new(random_between(rng, 0, ident), site));
                    return Some(Position(p));
                }
            }
        }

        debug!(?left, ?right, site, "no position can be minted between these positions");
        None
    }
}

/// Pushes `l` followed by one fresh identifier that sorts above `left_tail`, the identifiers of
/// the left position that follow `l`.
fn extend_past<R>(
    p: &mut Identifiers,
    l: Identifier,
    left_tail: &[Identifier],
    site: u8,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    p.push(l);
    match left_tail.first() {
        // no ident fits between the bound and MAX_IDENT, so keep the whole left tail and mint
        // one level below it instead.
        Some(next) if next.ident >= MAX_IDENT - 1 => {
            p.extend_from_slice(left_tail);
            p.push(Identifier::new(random_between(rng, 0, MAX_IDENT), site));
        }
        Some(next) => p.push(Identifier::new(random_between(rng, next.ident, MAX_IDENT), site)),
        None => p.push(Identifier::new(random_between(rng, 0, MAX_IDENT), site)),
    }
}

/// Uniformly picks a value in the open interval `(low, high)`.
///
/// Requires `high - low >= 2`.
fn random_between<R>(rng: &mut R, low: u16, high: u16) -> u16
where
    R: Rng + ?Sized,
{
    debug_assert!(high - low >= 2, "empty interval ({low}, {high})");
    rng.random_range(low + 1..high)
}
