//! Training Loop
//!
//! Episodic Q-learning: reset, act, step, learn until the environment
//! reports `done`, then report progress every `report_interval` episodes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::rl::agent::Agent;
use crate::rl::config::{TrainingConfig, DEFAULT_REPORT_INTERVAL};
use crate::rl::core::Transition;
use crate::rl::environment::Environment;

/// Cooperative stop flag shared between a trainer and its owner
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress report for one completed episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    /// 1-based episode number
    pub episode: usize,
    /// Steps taken in the episode
    pub steps: usize,
    /// Sum of step rewards
    pub total_reward: f64,
    /// Final portfolio value, when the environment tracks one
    pub final_value: Option<f64>,
    /// Percentage return over the episode, when available
    pub return_pct: Option<f64>,
    /// Exploration rate the episode ran with
    pub exploration: f64,
}

/// Running training statistics
#[derive(Debug, Clone, Default)]
pub struct TrainingStats {
    /// Total episodes completed
    pub episodes: usize,
    /// Total steps taken
    pub steps: usize,
    /// Reward of the latest completed episode
    pub last_episode_reward: f64,
    /// Current exploration rate
    pub exploration_rate: f64,
}

/// Drives an [`Agent`] through episodes of an [`Environment`]
pub struct Trainer<E, A> {
    env: E,
    agent: A,
    exploration_decay: f64,
    exploration_min: f64,
    cancel: Option<CancellationToken>,
    stats: TrainingStats,
}

impl<E: Environment, A: Agent> Trainer<E, A> {
    /// Trainer with constant exploration
    pub fn new(env: E, agent: A) -> Self {
        let exploration_rate = agent.exploration();
        Self {
            env,
            agent,
            exploration_decay: 1.0,
            exploration_min: 0.0,
            cancel: None,
            stats: TrainingStats {
                exploration_rate,
                ..Default::default()
            },
        }
    }

    /// Apply the exploration schedule from `config`
    pub fn with_config(mut self, config: &TrainingConfig) -> Self {
        self.exploration_decay = config.exploration_decay;
        self.exploration_min = config.exploration_min;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn into_parts(self) -> (E, A) {
        (self.env, self.agent)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Run `episodes` training episodes
    ///
    /// Returns the reports emitted every `report_interval` episodes; a zero
    /// interval falls back to the default. A cancelled run stops before the
    /// next step and returns what was reported so far.
    pub fn run(&mut self, episodes: usize, report_interval: usize) -> Vec<EpisodeReport> {
        let report_interval = if report_interval == 0 {
            DEFAULT_REPORT_INTERVAL
        } else {
            report_interval
        };

        let mut reports = Vec::new();
        for ep in 0..episodes {
            if self.is_cancelled() {
                info!(episode = ep + 1, "training cancelled");
                break;
            }

            let exploration = self.agent.exploration();
            let Some((steps, total_reward)) = self.run_episode() else {
                info!(episode = ep + 1, "training cancelled mid-episode");
                break;
            };

            self.stats.episodes += 1;
            self.stats.steps += steps;
            self.stats.last_episode_reward = total_reward;

            if (ep + 1) % report_interval == 0 {
                let report = self.report(ep + 1, steps, total_reward, exploration);
                reports.push(report);
            }

            self.decay_exploration();
        }
        reports
    }

    /// One episode; `None` if cancelled before it finished
    fn run_episode(&mut self) -> Option<(usize, f64)> {
        let mut state = self.env.reset();
        let mut steps = 0;
        let mut total_reward = 0.0;

        loop {
            if self.is_cancelled() {
                return None;
            }

            let action = self.agent.act(&state);
            let result = self.env.step(action);
            let done = result.done;
            total_reward += result.reward;

            let transition = Transition::new(state, action, result);
            self.agent.learn(&transition);

            state = transition.next_state;
            steps += 1;
            if done {
                return Some((steps, total_reward));
            }
        }
    }

    fn report(&self, episode: usize, steps: usize, total_reward: f64, exploration: f64) -> EpisodeReport {
        let valuation = self.env.valuation();
        let report = EpisodeReport {
            episode,
            steps,
            total_reward,
            final_value: valuation.map(|v| v.portfolio_value),
            return_pct: valuation.map(|v| v.return_pct()),
            exploration,
        };

        match (report.final_value, report.return_pct) {
            (Some(value), Some(ret)) => info!(
                "Episode {}: Final value={:.2}, Return={:.2}%, Reward={:.4}",
                episode, value, ret, total_reward
            ),
            _ => info!("Episode {}: Reward={:.4}", episode, total_reward),
        }
        report
    }

    fn decay_exploration(&mut self) {
        if self.exploration_decay == 1.0 {
            return;
        }
        let current = self.agent.exploration();
        let next = (current * self.exploration_decay).max(self.exploration_min);
        self.agent.set_exploration(next);
        self.stats.exploration_rate = self.agent.exploration();
        debug!(from = current, to = self.stats.exploration_rate, "exploration decayed");
    }
}

/// Aggregate statistics over reported episodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSummary {
    /// Number of reports summarised
    pub num_reports: usize,
    /// Average reward per reported episode
    pub avg_reward: f64,
    /// Average return, over reports that carry one
    pub avg_return_pct: Option<f64>,
    /// Best return seen
    pub best_return_pct: Option<f64>,
}

/// Summarise a set of episode reports
pub fn summarize_reports(reports: &[EpisodeReport]) -> TrainingSummary {
    if reports.is_empty() {
        return TrainingSummary::default();
    }

    let n = reports.len() as f64;
    let avg_reward = reports.iter().map(|r| r.total_reward).sum::<f64>() / n;

    let returns: Vec<f64> = reports.iter().filter_map(|r| r.return_pct).collect();
    let avg_return_pct =
        (!returns.is_empty()).then(|| returns.iter().sum::<f64>() / returns.len() as f64);
    let best_return_pct = returns.iter().copied().reduce(f64::max);

    TrainingSummary {
        num_reports: reports.len(),
        avg_reward,
        avg_return_pct,
        best_return_pct,
    }
}
