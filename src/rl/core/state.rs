//! State Representation
//!
//! A state is a dense index into the Q-table plus the categorical factors
//! it was built from. Factors are combined in mixed radix, first factor most
//! significant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Expected-return bands for a one-step forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum ExpectedReturn {
    Neutral = 0,
    SmallPos = 1,
    MedPos = 2,
    LargePos = 3,
    SmallNeg = 4,
    MedNeg = 5,
    LargeNeg = 6,
}

impl ExpectedReturn {
    pub const COUNT: usize = 7;

    /// Bucket a forecast return
    ///
    /// `< -0.02`, `[-0.02, -0.01)`, `[-0.01, -0.005)`, `[-0.005, 0.005]`,
    /// `(0.005, 0.01]`, `(0.01, 0.02]`, `> 0.02`.
    pub fn from_forecast(value: f64) -> Self {
        if value < -0.02 {
            Self::LargeNeg
        } else if value < -0.01 {
            Self::MedNeg
        } else if value < -0.005 {
            Self::SmallNeg
        } else if value > 0.02 {
            Self::LargePos
        } else if value > 0.01 {
            Self::MedPos
        } else if value > 0.005 {
            Self::SmallPos
        } else {
            Self::Neutral
        }
    }
}

/// Similarity of the closest historical pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum PatternDistance {
    Small = 0,
    Large = 1,
}

impl PatternDistance {
    pub const COUNT: usize = 2;
    pub const THRESHOLD: f64 = 0.005;

    pub fn from_distance(distance: f64) -> Self {
        if distance < Self::THRESHOLD {
            Self::Small
        } else {
            Self::Large
        }
    }
}

/// Share of the portfolio held in one asset (cash or shares)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum PositionBand {
    None = 0,
    Medium = 1,
    High = 2,
}

impl PositionBand {
    pub const COUNT: usize = 3;

    /// Band of `value / portfolio_value`: `< 0.2`, `[0.2, 0.8)`, `>= 0.8`
    pub fn from_ratio(value: f64, portfolio_value: f64) -> Self {
        if portfolio_value <= 0.0 {
            return Self::None;
        }
        let ratio = value / portfolio_value;
        if ratio < 0.2 {
            Self::None
        } else if ratio < 0.8 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Moving-average spread trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Divergence {
    Neutral = 0,
    Converging = 1,
    Diverging = 2,
}

impl Divergence {
    pub const COUNT: usize = 3;
}

/// Mixed-radix encoder over categorical factors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLayout {
    radices: Vec<usize>,
}

impl StateLayout {
    pub fn new(radices: Vec<usize>) -> Self {
        Self { radices }
    }

    /// Total number of distinct states
    pub fn num_states(&self) -> usize {
        self.radices.iter().product()
    }

    pub fn num_factors(&self) -> usize {
        self.radices.len()
    }

    pub fn radices(&self) -> &[usize] {
        &self.radices
    }

    /// Combine factors into a dense index
    ///
    /// Factors beyond their radix are clamped to the last category so the
    /// result always stays below [`num_states`](Self::num_states). A factor
    /// list of the wrong length encodes as 0.
    pub fn encode(&self, factors: &[usize]) -> usize {
        if factors.len() != self.radices.len() {
            return 0;
        }
        self.radices
            .iter()
            .zip(factors)
            .fold(0, |acc, (&radix, &factor)| {
                acc * radix + factor.min(radix.saturating_sub(1))
            })
    }

    /// Split a dense index back into factors
    pub fn decode(&self, mut index: usize) -> Vec<usize> {
        let mut factors = vec![0; self.radices.len()];
        for (slot, &radix) in factors.iter_mut().zip(&self.radices).rev() {
            if radix == 0 {
                continue;
            }
            *slot = index % radix;
            index /= radix;
        }
        factors
    }

    /// Build a state from raw factors
    pub fn state(&self, factors: Vec<usize>) -> State {
        State {
            index: self.encode(&factors),
            factors,
        }
    }

    /// The all-zero state
    pub fn default_state(&self) -> State {
        self.state(vec![0; self.radices.len()])
    }
}

/// Discrete environment observation
///
/// `index` is authoritative; `factors` are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct State {
    pub index: usize,
    pub factors: Vec<usize>,
}

impl State {
    /// State with an index and no recorded factors
    pub fn from_index(index: usize) -> Self {
        Self {
            index,
            factors: Vec::new(),
        }
    }

    /// Human-readable label, e.g. `#42 [3, 0, 1, 2]`
    pub fn describe(&self) -> String {
        format!("#{} {:?}", self.index, self.factors)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
