use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{DataError, PortfolioError, Result};
use crate::rl::agent::{EpsilonGreedyPolicy, QLearningAgent, QTable};
use crate::rl::data::{load_multi_series_csv, load_prices_csv, RandomWalk};
use crate::rl::environment::MarketEnvironment;
use crate::rl::training::checkpointing::{episode_name, timestamped_name};
use crate::rl::training::{
    ensure_shape, evaluate, load_q_matrix_csv, save_q_matrix_csv, save_series_csv,
    summarize_reports, CancellationToken, Checkpointer, EpisodeReport, EvaluationReport,
    QTableCheckpoint, Trainer,
};

#[derive(Parser)]
#[command(name = "rl-portfolio")]
#[command(author = "Your Name")]
#[command(version = "0.1.0")]
#[command(about = "Tabular Q-learning portfolio trainer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path; defaults to config/default.toml plus $RLP_ENV overlay
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the exploration random stream
    #[arg(long, global = true, env = "RLP_SEED")]
    pub seed: Option<u64>,

    /// Total training episodes
    #[arg(short, long, global = true)]
    pub episodes: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a shared Q-table over every series of a multi-series CSV
    Train {
        /// Multi-series price CSV (one column per instrument)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Directory for the Q-matrix and series exports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a saved Q-matrix greedily on a price series
    Eval {
        /// Q-matrix CSV produced by `train`
        #[arg(short, long)]
        q_matrix: Option<PathBuf>,
        /// Price CSV to evaluate on
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Price column to read
        #[arg(long)]
        column: Option<String>,
        /// Series CSV to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a synthetic random-walk price CSV
    Generate {
        /// Number of prices per series
        #[arg(short, long, default_value = "1000")]
        length: usize,
        /// Number of series (columns)
        #[arg(long, default_value = "1")]
        series: usize,
        /// Output CSV path
        #[arg(short, long, default_value = "data/train.csv")]
        output: PathBuf,
    },
}

impl Cli {
    /// Load the configuration this invocation asks for, with CLI overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_file(path)?,
            None => AppConfig::load()?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(seed) = self.seed {
            config.agent.seed = seed;
        }
        if let Some(episodes) = self.episodes {
            if episodes > 0 {
                config.training.episodes = episodes;
            }
        }
    }
}

/// Result of a `train` run
#[derive(Debug)]
pub struct TrainOutcome {
    /// Names of the series trained on, in order
    pub trained: Vec<String>,
    pub episodes_per_series: usize,
    pub reports: Vec<EpisodeReport>,
    /// Greedy rollout on the last series, when it was long enough
    pub evaluation: Option<EvaluationReport>,
    pub q_table: QTable,
    pub cancelled: bool,
}

/// Train one shared agent sequentially over every series in `data`
pub fn run_train(
    config: &AppConfig,
    data: &Path,
    output_dir: &Path,
    cancel: CancellationToken,
) -> Result<TrainOutcome> {
    let series = load_multi_series_csv(data)?;
    if series.is_empty() {
        return Err(PortfolioError::InvalidData(format!(
            "no price series found in {}",
            data.display()
        )));
    }
    info!("Loaded {} series from {:?}", series.len(), data);

    let layout = config.env.scheme.layout();
    let action_space = config.env.action_space.clone();
    let mut agent = QLearningAgent::new(
        layout.num_states(),
        action_space.clone(),
        EpsilonGreedyPolicy::new(config.agent.epsilon, config.agent.seed),
        &config.agent,
    );

    let min_len = config.training.min_series_len;
    let episodes_per_series = (config.training.episodes / series.len()).max(1);
    info!(
        series = series.len(),
        episodes_per_series,
        states = layout.num_states(),
        actions = action_space.len(),
        "Training shared Q-table"
    );

    let mut trained = Vec::new();
    let mut reports = Vec::new();
    let mut cancelled = false;
    for (name, prices) in &series {
        let mut env = MarketEnvironment::new(prices.clone(), config.env.clone());
        let required = min_len.max(env.min_series_len());
        if prices.len() < required {
            warn!(
                "Skipping {}: need at least {} prices, got {}",
                name,
                required,
                prices.len()
            );
            continue;
        }
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        info!("Training on {} ({} prices)", name, prices.len());
        let mut trainer = Trainer::new(&mut env, &mut agent)
            .with_config(&config.training)
            .with_cancellation(cancel.clone());
        reports.extend(trainer.run(episodes_per_series, config.training.report_interval));
        trained.push(name.clone());
        info!("Completed training on {}", name);
    }
    cancelled |= cancel.is_cancelled();
    if cancelled && trained.is_empty() {
        return Err(PortfolioError::Cancelled);
    }

    let summary = summarize_reports(&reports);
    info!(
        reports = summary.num_reports,
        avg_reward = summary.avg_reward,
        avg_return_pct = ?summary.avg_return_pct,
        best_return_pct = ?summary.best_return_pct,
        "Training summary"
    );

    let evaluation = match series.iter().next_back() {
        Some((name, prices)) if prices.len() >= min_len && !cancelled => {
            let mut env = MarketEnvironment::new(prices.clone(), config.env.clone());
            if env.has_steps() {
                info!("Testing learned policy on {}", name);
                let report = evaluate(&mut env, agent.q_table(), &action_space);
                save_series_csv(&report.records, &output_dir.join("series.csv"))?;
                Some(report)
            } else {
                None
            }
        }
        _ => None,
    };

    save_q_matrix_csv(agent.q_table(), &output_dir.join("q_matrix.csv"))?;

    if let Some(dir) = &config.data.checkpoint_dir {
        let checkpointer = Checkpointer::new(dir, config.data.max_checkpoints);
        let total_episodes = episodes_per_series * trained.len();
        let checkpoint =
            QTableCheckpoint::new(agent.q_table().clone(), action_space.clone(), total_episodes);
        let name = episode_name(&timestamped_name("q_table"), total_episodes);
        checkpointer.save(&checkpoint, &name)?;
    }

    Ok(TrainOutcome {
        trained,
        episodes_per_series,
        reports,
        evaluation,
        q_table: agent.into_q_table(),
        cancelled,
    })
}

/// Evaluate a saved Q-matrix greedily on one price series
pub fn run_eval(
    config: &AppConfig,
    q_matrix: &Path,
    data: &Path,
    column: Option<&str>,
    output: &Path,
) -> Result<EvaluationReport> {
    let q_table = load_q_matrix_csv(q_matrix)?;
    let layout = config.env.scheme.layout();
    let action_space = &config.env.action_space;
    ensure_shape(&q_table, layout.num_states(), action_space.len())?;

    let prices = load_prices_csv(data, column)?;
    info!("Loaded {} prices from {:?}", prices.len(), data);

    let mut env = MarketEnvironment::new(prices, config.env.clone());
    if !env.has_steps() {
        return Err(DataError::SeriesTooShort {
            source_name: data.display().to_string(),
            len: env.prices().len(),
            required: env.min_series_len(),
        }
        .into());
    }
    let report = evaluate(&mut env, &q_table, action_space);
    save_series_csv(&report.records, output)?;
    Ok(report)
}

/// Write `series` seeded random walks of `length` prices as a CSV
pub fn run_generate(walk: &RandomWalk, length: usize, series: usize, output: &Path) -> Result<()> {
    if let Some(dir) = output.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let columns: Vec<Vec<f64>> = (0..series.max(1))
        .map(|i| {
            RandomWalk {
                seed: walk.seed.wrapping_add(i as u64),
                ..walk.clone()
            }
            .generate(length)
        })
        .collect();

    let mut writer = csv::Writer::from_path(output)?;
    let mut header = vec!["Date".to_string()];
    header.extend((0..columns.len()).map(|i| format!("SYN{}", i)));
    writer.write_record(&header)?;

    for t in 0..length {
        let mut record = vec![t.to_string()];
        record.extend(columns.iter().map(|c| format!("{:.6}", c[t])));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(length, series = columns.len(), "Wrote synthetic prices to {:?}", output);
    Ok(())
}
