//! Reinforcement Learning Module
//!
//! Tabular Q-learning for single-asset portfolio rebalancing.
//!
//! # Features
//!
//! - **State Representation**: k-NN return forecasts or moving-average
//!   rankings, combined with cash and position bands
//! - **Action Space**: Nothing plus sized buys and sells
//! - **Algorithms**: One-step Q-learning with epsilon-greedy exploration
//! - **Evaluation**: Greedy rollouts exported as CSV series
//!
//! # Usage
//!
//! ```no_run
//! use rl_portfolio::rl::{
//!     AgentConfig, EpsilonGreedyPolicy, MarketEnvConfig, MarketEnvironment, QLearningAgent,
//!     RandomWalk, Trainer,
//! };
//!
//! let prices = RandomWalk::default().generate(500);
//! let env = MarketEnvironment::new(prices, MarketEnvConfig::default());
//! let config = AgentConfig::default();
//! let agent = QLearningAgent::new(
//!     env.num_states(),
//!     env.config().action_space.clone(),
//!     EpsilonGreedyPolicy::new(config.epsilon, config.seed),
//!     &config,
//! );
//! let reports = Trainer::new(env, agent).run(100, 10);
//! ```

pub mod agent;
pub mod config;
pub mod core;
pub mod data;
pub mod environment;
pub mod features;
pub mod training;

// Config exports
pub use self::config::{AgentConfig, MarketEnvConfig, StateScheme, TrainingConfig};

// Core exports
pub use self::core::{
    calculate_reward, Action, ActionSizing, ActionSpace, State, StateLayout, StepResult,
    TradePenalty, Transition,
};

// Feature exports
pub use self::features::{forecast, ApproxParams, Forecast, LocalApproximationError, MovingAverageRanking};

// Agent exports
pub use self::agent::{Agent, EpsilonGreedyPolicy, GreedyPolicy, Policy, QLearningAgent, QTable};

// Environment exports
pub use self::environment::{Environment, MarketEnvironment, TradeFill, Valuation};

// Data exports
pub use self::data::{load_multi_series_csv, load_prices_csv, RandomWalk};

// Training exports
pub use self::training::{
    evaluate, CancellationToken, Checkpointer, EpisodeReport, EvaluationReport, SeriesRecord,
    Trainer,
};
