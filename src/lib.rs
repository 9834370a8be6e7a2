// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

/// Construction parameters and their limits.
pub mod config;
pub mod errs;

/// An ordered map on top of a [`skip list`], with pluggable level generation.
///
/// [`skip list`]: https://en.wikipedia.org/wiki/Skip_list
pub mod skiplist;

pub use config::Config;
pub use errs::SkipListError;
pub use skiplist::OrderedMap;
