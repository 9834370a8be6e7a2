// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! A skiplist implementation which allows faster random access than a standard
//! linked list.
//!
//! SkipLists use a probabilistic distribution of nodes over the internal
//! levels, whereby the lowest level (level 0) contains all the nodes, and each
//! level `n > 0` will contain a random subset of the nodes on level `n - 1`.
//!
//! Most commonly, a geometric distribution is used whereby the chance that a
//! node occupies level `n` is `p` times the chance of occupying level `n-1`
//! (with `0 <= p <= 1`).
//!
//! ```text
//! level 2:  HEAD ───────────────► 8 ──► NIL
//! level 1:  HEAD ────────► 5 ───► 8 ──► NIL
//! level 0:  HEAD ──► 3 ──► 5 ───► 8 ──► NIL
//! ```
//!
//! Nodes are kept in an arena and linked by slot index, so there is no unsafe
//! pointer juggling and no reference counting. It is very unlikely that the
//! default level generator will need to be changed, but custom ones can be
//! plugged in through [`LevelGenerator`].

mod arena;
mod level_generator;
mod ordered_map;
mod skipnode;

pub use level_generator::{
    random_level,
    CoinFlipLevelGenerator,
    GeometricalLevelGenerator,
    LevelGenerator,
};
pub use ordered_map::{
    Iter,
    OrderedMap,
};
