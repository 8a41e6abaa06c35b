//! Transitions
//!
//! The unit of learning: produced once per environment step, consumed once
//! by the agent.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::state::State;

/// Outcome of a single environment step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Observation after the action
    pub state: State,
    pub reward: f64,
    /// Whether the episode has ended
    pub done: bool,
}

/// A single (s, a, r, s', done) tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next_state: State,
    pub done: bool,
}

impl Transition {
    /// Pair the pre-step state and chosen action with a step result
    pub fn new(state: State, action: Action, step: StepResult) -> Self {
        Self {
            state,
            action,
            reward: step.reward,
            next_state: step.state,
            done: step.done,
        }
    }
}
