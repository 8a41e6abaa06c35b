//! Market Environment
//!
//! Finite-horizon portfolio simulation over a fixed price series. The agent
//! rebalances between cash and a single asset; each step advances one bar.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Environment, Valuation};
use crate::rl::config::{MarketEnvConfig, StateScheme};
use crate::rl::core::{
    calculate_reward, Action, Divergence, ExpectedReturn, PatternDistance, PositionBand, State,
    StateLayout, StepResult, TradeStreak,
};
use crate::rl::features::simple_returns;

/// Lifecycle of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// Freshly reset, no step taken
    Initialized,
    Stepping,
    /// End of series reached; further steps are no-ops
    Terminal,
}

/// Quantities moved by one executed action
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    /// Shares received by a buy, net of commission
    pub amount_bought: f64,
    /// Shares given up by a sell
    pub amount_sold: f64,
    /// Commission charged on the traded notional
    pub commission_paid: f64,
}

/// Fill plus the holdings it leaves behind
struct PlannedFill {
    fill: TradeFill,
    cash: f64,
    shares: f64,
}

/// Portfolio trading environment over a price series
pub struct MarketEnvironment {
    config: MarketEnvConfig,
    layout: StateLayout,
    prices: Vec<f64>,
    /// `returns[i] = prices[i + 1] / prices[i] - 1`
    returns: Vec<f64>,
    start_idx: usize,
    current_idx: usize,
    cash: f64,
    shares: f64,
    streak: TradeStreak,
    phase: EpisodePhase,
}

impl MarketEnvironment {
    /// Create an environment; misconfigured values fall back to defaults
    pub fn new(prices: Vec<f64>, config: MarketEnvConfig) -> Self {
        let config = config.sanitized();
        let layout = config.scheme.layout();
        let returns = simple_returns(&prices);
        let start_idx = config.scheme.required_history().max(config.min_start_idx);
        let cash = config.initial_cash;

        Self {
            config,
            layout,
            prices,
            returns,
            start_idx,
            current_idx: start_idx,
            cash,
            shares: 0.0,
            streak: TradeStreak::default(),
            phase: EpisodePhase::Initialized,
        }
    }

    fn is_terminal_index(&self) -> bool {
        self.current_idx + 2 >= self.prices.len()
    }

    /// Work out what `action` would do at `price` without applying it
    fn plan(&self, action: Action, price: f64) -> PlannedFill {
        let unchanged = PlannedFill {
            fill: TradeFill::default(),
            cash: self.cash,
            shares: self.shares,
        };
        if self.config.action_space.index_of(action).is_none() || price <= 0.0 {
            return unchanged;
        }

        let fraction = self.config.sizing.fraction(action).clamp(0.0, 1.0);
        let commission = self.config.commission;

        if action.is_buy() {
            let cost = self.cash * fraction;
            let commission_paid = cost * commission;
            let bought = (cost - commission_paid) / price;
            PlannedFill {
                fill: TradeFill {
                    amount_bought: bought,
                    amount_sold: 0.0,
                    commission_paid,
                },
                cash: self.cash - cost,
                shares: self.shares + bought,
            }
        } else if action.is_sell() {
            if self.shares <= 0.0 {
                return unchanged;
            }
            let sold = self.shares * fraction;
            let proceeds = sold * price;
            let commission_paid = proceeds * commission;
            PlannedFill {
                fill: TradeFill {
                    amount_bought: 0.0,
                    amount_sold: sold,
                    commission_paid,
                },
                cash: self.cash + proceeds - commission_paid,
                shares: self.shares - sold,
            }
        } else {
            unchanged
        }
    }

    /// Fill `action` would produce at the current price
    pub fn preview_fill(&self, action: Action) -> TradeFill {
        if self.current_idx >= self.prices.len() {
            return TradeFill::default();
        }
        self.plan(action, self.prices[self.current_idx]).fill
    }

    fn execute(&mut self, action: Action, price: f64) -> TradeFill {
        let planned = self.plan(action, price);
        self.cash = planned.cash;
        self.shares = planned.shares;
        planned.fill
    }

    /// Build the state for the current index
    fn observe(&self) -> State {
        let idx = self.current_idx;
        if idx >= self.prices.len() {
            return self.layout.default_state();
        }

        let mut factors = match &self.config.scheme {
            StateScheme::Forecast { primary, secondary } => {
                let history = &self.returns[..idx.min(self.returns.len())];
                let mut factors = Vec::with_capacity(self.layout.num_factors());
                for params in std::iter::once(primary).chain(secondary.iter()) {
                    match params.forecast(history) {
                        Ok(forecast) => {
                            factors.push(ExpectedReturn::from_forecast(forecast.prediction) as usize);
                            factors.push(PatternDistance::from_distance(forecast.min_distance) as usize);
                        }
                        Err(e) => {
                            debug!(idx, error = %e, "forecast unavailable, using default state");
                            return self.layout.default_state();
                        }
                    }
                }
                factors
            }
            StateScheme::Ranking(ranking) => {
                if idx < ranking.min_index() {
                    vec![0, Divergence::Neutral as usize]
                } else {
                    vec![
                        ranking.ranking_index(&self.prices, idx),
                        ranking.divergence(&self.prices, idx) as usize,
                    ]
                }
            }
        };

        let price = self.prices[idx];
        let portfolio_value = self.cash + self.shares * price;
        factors.push(PositionBand::from_ratio(self.cash, portfolio_value) as usize);
        factors.push(PositionBand::from_ratio(self.shares * price, portfolio_value) as usize);

        self.layout.state(factors)
    }

    /// Current cash
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Current share count
    pub fn shares(&self) -> f64 {
        self.shares
    }

    /// Cash plus shares valued at the current price
    pub fn portfolio_value(&self) -> f64 {
        match self.prices.get(self.current_idx) {
            Some(price) => self.cash + self.shares * price,
            None => self.cash,
        }
    }

    /// Price at the current index, 0 past the end of the series
    pub fn current_price(&self) -> f64 {
        self.prices.get(self.current_idx).copied().unwrap_or(0.0)
    }

    pub fn current_idx(&self) -> usize {
        self.current_idx
    }

    pub fn start_idx(&self) -> usize {
        self.start_idx
    }

    /// Shortest series that leaves at least one step after `start_idx`
    pub fn min_series_len(&self) -> usize {
        self.start_idx + 3
    }

    /// Whether the series is long enough to take a step from reset
    pub fn has_steps(&self) -> bool {
        self.prices.len() >= self.min_series_len()
    }

    pub fn commission(&self) -> f64 {
        self.config.commission
    }

    /// Portfolio value at the start of every episode
    pub fn initial_value(&self) -> f64 {
        self.config.initial_cash
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn config(&self) -> &MarketEnvConfig {
        &self.config
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Size of the state space for the active scheme
    pub fn num_states(&self) -> usize {
        self.layout.num_states()
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Current buy/sell streak lengths
    pub fn streak(&self) -> &TradeStreak {
        &self.streak
    }
}

impl Environment for MarketEnvironment {
    fn reset(&mut self) -> State {
        self.current_idx = self.start_idx;
        self.cash = self.config.initial_cash;
        self.shares = 0.0;
        self.streak.reset();
        self.phase = EpisodePhase::Initialized;
        self.observe()
    }

    fn step(&mut self, action: Action) -> StepResult {
        if self.is_terminal_index() {
            self.phase = EpisodePhase::Terminal;
            return StepResult {
                state: self.observe(),
                reward: 0.0,
                done: true,
            };
        }

        let price = self.prices[self.current_idx];
        let value_before = self.cash + self.shares * price;
        let fill = self.execute(action, price);

        self.current_idx += 1;
        let next_price = self.prices[self.current_idx];
        let value_after = self.cash + self.shares * next_price;

        let mut reward = calculate_reward(value_before, value_after);
        self.streak.record(action);
        if let Some(penalty) = &self.config.trade_penalty {
            reward -= self.streak.penalty(penalty);
        }

        let done = self.is_terminal_index();
        self.phase = if done {
            EpisodePhase::Terminal
        } else {
            EpisodePhase::Stepping
        };

        debug!(
            idx = self.current_idx,
            %action,
            bought = fill.amount_bought,
            sold = fill.amount_sold,
            reward,
            done,
            "market step"
        );

        StepResult {
            state: self.observe(),
            reward,
            done,
        }
    }

    fn valuation(&self) -> Option<Valuation> {
        Some(Valuation {
            initial_value: self.initial_value(),
            portfolio_value: self.portfolio_value(),
        })
    }
}
