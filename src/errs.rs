// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use thiserror::Error;

use crate::config::MAX_LEVEL_LIMIT;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipListError {
    #[error("max level {0} exceeds the supported limit of {}", MAX_LEVEL_LIMIT)]
    MaxLevelTooLarge(usize),
    #[error("promotion probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}
