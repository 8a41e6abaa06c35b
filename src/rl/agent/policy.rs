//! Action-selection policies over a Q-table.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::QTable;

/// Index of the largest value; ties resolve to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Chooses an action index for a state
pub trait Policy {
    fn select(&mut self, q_table: &QTable, state: usize) -> usize;

    /// Current exploration rate
    fn exploration(&self) -> f64 {
        0.0
    }

    fn set_exploration(&mut self, _epsilon: f64) {}
}

/// Random action with probability `epsilon`, otherwise the argmax
#[derive(Debug, Clone)]
pub struct EpsilonGreedyPolicy {
    epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedyPolicy {
    pub fn new(epsilon: f64, seed: u64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for EpsilonGreedyPolicy {
    fn select(&mut self, q_table: &QTable, state: usize) -> usize {
        let num_actions = q_table.num_actions();
        if num_actions == 0 {
            return 0;
        }
        if self.rng.gen::<f64>() < self.epsilon {
            self.rng.gen_range(0..num_actions)
        } else {
            argmax(q_table.row(state))
        }
    }

    fn exploration(&self) -> f64 {
        self.epsilon
    }

    fn set_exploration(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}

/// Always the argmax; never explores
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn select(&mut self, q_table: &QTable, state: usize) -> usize {
        argmax(q_table.row(state))
    }
}
