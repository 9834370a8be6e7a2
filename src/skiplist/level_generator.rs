// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use rand::{
    rngs::SmallRng,
    Rng,
    SeedableRng,
};

use crate::{
    config::{
        validate_max_level,
        Config,
    },
    errs::SkipListError,
};

/// Upon the insertion of a new node in the list, the node is replicated to high
/// levels with a certain probability as determined by a `LevelGenerator`.
pub trait LevelGenerator {
    /// The highest level index this generator will ever produce.
    fn max_level(&self) -> usize;
    /// Generate a random level for a new node in the range `[0, max_level]`.
    ///
    /// This must never return a level that is `> self.max_level()`.
    fn random(&mut self) -> usize;
}

/// Flip `flip` until it fails or `max_level` is reached, counting the
/// successes.
pub fn random_level<F>(max_level: usize, mut flip: F) -> usize
where
    F: FnMut() -> bool,
{
    let mut level = 0;
    while level < max_level && flip() {
        level += 1;
    }
    level
}

/// A level generator which will produce geometrically distributed numbers.
///
/// The probability of generating level `n` is `p` times the probability of
/// generating level `n-1`, with the probability truncated at the maximum
/// level allowed.
#[derive(Debug, Clone)]
pub struct GeometricalLevelGenerator<R = SmallRng> {
    max_level: usize,
    p: f64,
    rng: R,
}

impl GeometricalLevelGenerator<SmallRng> {
    /// Create a new generator seeded from system entropy.
    pub fn new(max_level: usize, p: f64) -> Result<Self, SkipListError> {
        Ok(Self::from_config(Config::new(max_level, p)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Create a reproducible generator from a fixed seed.
    pub fn seeded(config: Config, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GeometricalLevelGenerator<R> {
    pub fn with_rng(config: Config, rng: R) -> Self {
        GeometricalLevelGenerator {
            max_level: config.max_level(),
            p: config.promotion_probability(),
            rng,
        }
    }

    pub fn promotion_probability(&self) -> f64 {
        self.p
    }
}

impl Default for GeometricalLevelGenerator<SmallRng> {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl<R: Rng> LevelGenerator for GeometricalLevelGenerator<R> {
    fn max_level(&self) -> usize {
        self.max_level
    }

    fn random(&mut self) -> usize {
        let (p, rng) = (self.p, &mut self.rng);
        random_level(self.max_level, || rng.gen_bool(p))
    }
}

/// A level generator driven by a caller supplied coin. Mostly useful for
/// pinning node heights in tests.
pub struct CoinFlipLevelGenerator<F> {
    max_level: usize,
    flip: F,
}

impl<F> CoinFlipLevelGenerator<F>
where
    F: FnMut() -> bool,
{
    pub fn new(max_level: usize, flip: F) -> Result<Self, SkipListError> {
        validate_max_level(max_level)?;
        Ok(CoinFlipLevelGenerator { max_level, flip })
    }
}

impl<F> LevelGenerator for CoinFlipLevelGenerator<F>
where
    F: FnMut() -> bool,
{
    fn max_level(&self) -> usize {
        self.max_level
    }

    fn random(&mut self) -> usize {
        random_level(self.max_level, &mut self.flip)
    }
}
