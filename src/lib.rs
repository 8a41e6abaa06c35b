pub mod cli;
pub mod config;
pub mod error;

// Reinforcement Learning module
pub mod rl;

pub use config::AppConfig;
pub use error::{PortfolioError, Result};

// RL exports
pub use rl::{
    Action, ActionSpace, AgentConfig, Environment, MarketEnvConfig, MarketEnvironment,
    QLearningAgent, QTable, Trainer,
};
