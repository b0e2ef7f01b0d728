// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Implementation of the quickcheck::Arbitrary trait for positions.

use crate::{Identifier, MAX_IDENT, Position, position::Identifiers};
use quickcheck::{Arbitrary, Gen};

impl Arbitrary for Identifier {
    fn arbitrary(g: &mut Gen) -> Self {
        // Skew the distribution to increase the likelihood of triggering bugs.
        // Interesting behavior happens at the edges of the ident range and when idents or sites
        // of neighboring positions are equal or one apart.
        let ident_choices = [
            0,
            0,
            1,
            2,
            3,
            3,
            4,
            MAX_IDENT - 2,
            MAX_IDENT - 1,
            MAX_IDENT - 1,
            MAX_IDENT,
            u16::arbitrary(g),
        ];
        let site_choices = [0, 0, 1, 1, 1, 2, 2, 3, u8::MAX, u8::arbitrary(g)];
        let ident = g.choose(&ident_choices).unwrap();
        let site = g.choose(&site_choices).unwrap();
        Self::new(*ident, *site)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let site = self.site;
        let ident = self.ident;
        Box::new(
            self.ident
                .shrink()
                .map(move |ident| Self::new(ident, site))
                .chain(self.site.shrink().map(move |site| Self::new(ident, site))),
        )
    }
}

impl Arbitrary for Position {
    fn arbitrary(g: &mut Gen) -> Self {
        // deep positions are interesting, but the codec caps out at 255 identifiers.
        let depth_choices = [1, 1, 1, 2, 2, 3, 4, 8];
        let depth = *g.choose(&depth_choices).unwrap();
        Position((0..depth).map(|_| Identifier::arbitrary(g)).collect())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let ids = self.0.clone();
        let truncated = (1..ids.len()).rev().map({
            let ids = ids.clone();
            move |len| Position(ids.iter().copied().take(len).collect())
        });
        let last_shrunk = ids
            .last()
            .copied()
            .map(|last| last.shrink())
            .into_iter()
            .flatten()
            .map(move |last| {
                let mut shrunk: Identifiers = ids.clone();
                if let Some(slot) = shrunk.last_mut() {
                    *slot = last;
                }
                Position(shrunk)
            });
        Box::new(truncated.chain(last_shrunk))
    }
}
