use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::rl::config::{AgentConfig, MarketEnvConfig, TrainingConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub env: MarketEnvConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Multi-series CSV used by `train`
    pub train_csv: PathBuf,
    /// Single-series CSV used by `eval`
    pub test_csv: PathBuf,
    /// Column of `test_csv` to read; first numeric column when unset
    pub price_column: Option<String>,
    /// Directory for Q-matrix and series exports
    pub output_dir: PathBuf,
    /// Directory for JSON checkpoints; none written when unset
    pub checkpoint_dir: Option<PathBuf>,
    /// Checkpoints kept per directory
    pub max_checkpoints: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_csv: PathBuf::from("data/train.csv"),
            test_csv: PathBuf::from("data/test.csv"),
            price_column: None,
            output_dir: PathBuf::from("data"),
            checkpoint_dir: None,
            max_checkpoints: 5,
        }
    }
}

impl DataConfig {
    pub fn q_matrix_path(&self) -> PathBuf {
        self.output_dir.join("q_matrix.csv")
    }

    pub fn series_path(&self) -> PathBuf {
        self.output_dir.join("series.csv")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info,rl_portfolio=debug".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/experiment.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("RLP_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (RLP_AGENT__ALPHA, etc.)
            .add_source(
                Environment::with_prefix("RLP")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load a single config file on top of environment overrides
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(
                Environment::with_prefix("RLP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.agent.alpha) || self.agent.alpha == 0.0 {
            errors.push(format!("alpha must be in (0, 1], got {}", self.agent.alpha));
        }
        if !(0.0..=1.0).contains(&self.agent.gamma) {
            errors.push(format!("gamma must be in [0, 1], got {}", self.agent.gamma));
        }
        if !(0.0..=1.0).contains(&self.agent.epsilon) {
            errors.push(format!("epsilon must be in [0, 1], got {}", self.agent.epsilon));
        }
        if !(0.0..=1.0).contains(&self.training.exploration_decay)
            || self.training.exploration_decay == 0.0
        {
            errors.push(format!(
                "exploration_decay must be in (0, 1], got {}",
                self.training.exploration_decay
            ));
        }
        if !(0.0..1.0).contains(&self.env.commission) {
            errors.push(format!(
                "commission must be in [0, 1), got {}",
                self.env.commission
            ));
        }
        if self.env.action_space.is_empty() {
            errors.push("action_space must contain at least one action".to_string());
        }
        for (name, fraction) in [
            ("small", self.env.sizing.small),
            ("medium", self.env.sizing.medium),
            ("large", self.env.sizing.large),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                errors.push(format!("sizing.{name} must be in [0, 1], got {fraction}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
