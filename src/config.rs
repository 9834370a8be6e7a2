// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use getset::CopyGetters;

use crate::errs::SkipListError;

/// The default top level index. With `p = 0.5` this keeps searches
/// logarithmic for roughly 2^16 entries.
pub const DEFAULT_MAX_LEVEL: usize = 16;

pub const DEFAULT_PROMOTION_PROBABILITY: f64 = 0.5;

/// Any node taller than this would need more than 2^64 entries to be useful.
pub const MAX_LEVEL_LIMIT: usize = 64;

/// Construction parameters for an [`OrderedMap`].
///
/// A `Config` can only be built through [`Config::new`] or [`Default`], so a
/// value of this type is always valid.
///
/// [`OrderedMap`]: crate::skiplist::OrderedMap
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct Config {
    /// Highest level index any node may occupy. The head spans
    /// `0..=max_level`.
    #[getset(get_copy = "pub")]
    max_level: usize,
    /// Chance that a new node is promoted one more level.
    #[getset(get_copy = "pub")]
    promotion_probability: f64,
}

impl Config {
    pub fn new(max_level: usize, promotion_probability: f64) -> Result<Self, SkipListError> {
        validate_max_level(max_level)?;
        // the range check is false for NaN, so it's rejected here too
        if !(0.0..=1.0).contains(&promotion_probability) {
            return Err(SkipListError::InvalidProbability(promotion_probability));
        }

        Ok(Config {
            max_level,
            promotion_probability,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_level: DEFAULT_MAX_LEVEL,
            promotion_probability: DEFAULT_PROMOTION_PROBABILITY,
        }
    }
}

pub(crate) fn validate_max_level(max_level: usize) -> Result<(), SkipListError> {
    if max_level > MAX_LEVEL_LIMIT {
        return Err(SkipListError::MaxLevelTooLarge(max_level));
    }
    Ok(())
}
