//! Trading Environments for RL Training
//!
//! Gym-like step/reset interface and the portfolio market simulation.

mod market;

pub use market::{EpisodePhase, MarketEnvironment, TradeFill};

use crate::rl::core::{Action, State, StepResult};

/// Portfolio valuation snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub initial_value: f64,
    pub portfolio_value: f64,
}

impl Valuation {
    /// Percentage return relative to the initial value
    pub fn return_pct(&self) -> f64 {
        if self.initial_value <= 0.0 {
            return 0.0;
        }
        (self.portfolio_value / self.initial_value - 1.0) * 100.0
    }
}

/// Episodic environment driven by discrete actions
pub trait Environment {
    /// Start a new episode and return its first state
    fn reset(&mut self) -> State;

    /// Apply `action` and advance one step
    fn step(&mut self, action: Action) -> StepResult;

    /// Portfolio valuation, for environments that track one
    fn valuation(&self) -> Option<Valuation> {
        None
    }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn reset(&mut self) -> State {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> StepResult {
        (**self).step(action)
    }

    fn valuation(&self) -> Option<Valuation> {
        (**self).valuation()
    }
}
