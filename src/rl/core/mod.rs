//! Core RL abstractions
//!
//! Fundamental types for states, actions, transitions and rewards.

pub mod action;
pub mod reward;
pub mod state;
pub mod transition;

pub use action::{Action, ActionSizing, ActionSpace, TradeSize};
pub use reward::{calculate_reward, TradePenalty, TradeStreak};
pub use state::{
    Divergence, ExpectedReturn, PatternDistance, PositionBand, State, StateLayout,
};
pub use transition::{StepResult, Transition};
