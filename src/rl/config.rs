//! RL Configuration
//!
//! Configuration structs for the market environment, agent and trainer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rl::core::{
    ActionSizing, ActionSpace, Divergence, ExpectedReturn, PatternDistance, PositionBand,
    StateLayout, TradePenalty,
};
use crate::rl::features::{ApproxParams, MovingAverageRanking, NUM_PERMUTATIONS};

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;
pub const DEFAULT_COMMISSION: f64 = 0.002;
pub const DEFAULT_MIN_START_IDX: usize = 20;
pub const DEFAULT_REPORT_INTERVAL: usize = 100;

/// How the environment turns market history into a discrete state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateScheme {
    /// k-NN forecast bands, optionally from a second (m, n) pair
    Forecast {
        primary: ApproxParams,
        #[serde(default)]
        secondary: Option<ApproxParams>,
    },
    /// Moving-average ranking permutation and divergence
    Ranking(MovingAverageRanking),
}

impl Default for StateScheme {
    fn default() -> Self {
        Self::Forecast {
            primary: ApproxParams::default(),
            secondary: None,
        }
    }
}

impl StateScheme {
    /// Factor layout; position bands for cash and shares always come last
    pub fn layout(&self) -> StateLayout {
        let mut radices = match self {
            Self::Forecast { secondary, .. } => {
                let mut r = vec![ExpectedReturn::COUNT, PatternDistance::COUNT];
                if secondary.is_some() {
                    r.extend([ExpectedReturn::COUNT, PatternDistance::COUNT]);
                }
                r
            }
            Self::Ranking(_) => vec![NUM_PERMUTATIONS, Divergence::COUNT],
        };
        radices.extend([PositionBand::COUNT, PositionBand::COUNT]);
        StateLayout::new(radices)
    }

    /// Smallest series index with enough history to build a state
    pub fn required_history(&self) -> usize {
        match self {
            Self::Forecast { primary, secondary } => {
                let window = secondary
                    .map(|s| s.window.max(primary.window))
                    .unwrap_or(primary.window);
                window + 1
            }
            Self::Ranking(ranking) => ranking.min_index(),
        }
    }
}

/// Market environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketEnvConfig {
    /// Cash at the start of every episode
    pub initial_cash: f64,
    /// Proportional fee on traded notional
    pub commission: f64,
    /// Lower bound on the episode start index
    pub min_start_idx: usize,
    /// State-building scheme
    pub scheme: StateScheme,
    /// Actions available to the agent
    pub action_space: ActionSpace,
    /// Fractions traded per action size
    pub sizing: ActionSizing,
    /// Optional penalty on long same-direction trade streaks
    pub trade_penalty: Option<TradePenalty>,
}

impl Default for MarketEnvConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            commission: DEFAULT_COMMISSION,
            min_start_idx: DEFAULT_MIN_START_IDX,
            scheme: StateScheme::default(),
            action_space: ActionSpace::basic(),
            sizing: ActionSizing::default(),
            trade_penalty: None,
        }
    }
}

impl MarketEnvConfig {
    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        if self.initial_cash <= 0.0 || self.initial_cash.is_nan() {
            warn!(
                initial_cash = self.initial_cash,
                "non-positive initial cash, using {}", DEFAULT_INITIAL_CASH
            );
            self.initial_cash = DEFAULT_INITIAL_CASH;
        }
        if self.commission <= 0.0 || self.commission >= 1.0 || self.commission.is_nan() {
            warn!(
                commission = self.commission,
                "commission outside (0, 1), using {}", DEFAULT_COMMISSION
            );
            self.commission = DEFAULT_COMMISSION;
        }
        if self.min_start_idx < 1 {
            warn!("min_start_idx below 1, using {}", DEFAULT_MIN_START_IDX);
            self.min_start_idx = DEFAULT_MIN_START_IDX;
        }
        self
    }
}

/// Q-learning agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration rate for epsilon-greedy selection
    pub epsilon: f64,
    /// Seed for the exploration random stream
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.1,
            seed: 42,
        }
    }
}

/// Training loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Total episodes per run
    pub episodes: usize,
    /// Episodes between progress reports
    pub report_interval: usize,
    /// Multiplier applied to epsilon after each episode
    pub exploration_decay: f64,
    /// Floor for the decayed epsilon
    pub exploration_min: f64,
    /// Series shorter than this are skipped
    pub min_series_len: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            report_interval: DEFAULT_REPORT_INTERVAL,
            exploration_decay: 1.0,
            exploration_min: 0.0,
            min_series_len: 50,
        }
    }
}
