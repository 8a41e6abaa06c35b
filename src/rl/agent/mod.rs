//! Tabular Agents
//!
//! Q-table storage, action-selection policies and the Q-learning update.

mod learner;
mod policy;
mod q_table;

pub use learner::{Agent, QLearningAgent};
pub use policy::{argmax, EpsilonGreedyPolicy, GreedyPolicy, Policy};
pub use q_table::QTable;
