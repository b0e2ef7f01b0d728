// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating [`Position`](crate::Position) values.
///
/// Each `(ident, site)` pair becomes one [`Identifier`](crate::Identifier). At least one pair is
/// required, since positions are never empty.
///
/// NOTE! This is mostly useful for tests and for replaying known positions. Positions for new
/// content should come from [`Position::between`](crate::Position::between) or the
/// [`Document`](crate::Document) insert helpers.
///
/// ```rust
/// # use logoot::{pos, Identifier, Position};
/// let p = pos![(3, 1), (65534, 1)];
/// assert_eq!(p.depth(), 2);
/// assert_eq!(p[1], Identifier::new(65534, 1));
/// assert!(p < pos![(4, 1)]);
/// ```
#[macro_export]
macro_rules! pos {
    ($(($ident:expr, $site:expr)),+ $(,)?) => {
        match $crate::Position::from_raw(&[
            $($crate::Identifier::new($ident, $site)),+
        ]) {
            ::std::option::Option::Some(position) => position,
            ::std::option::Option::None => ::std::unreachable!("pos! always has an identifier"),
        }
    };
}
