//! Greedy policy evaluation on a market environment.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::rl::agent::{GreedyPolicy, Policy, QTable};
use crate::rl::core::{Action, ActionSpace};
use crate::rl::environment::{Environment, MarketEnvironment};

/// One row of an evaluation trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Index into the price series
    pub time: usize,
    pub price: f64,
    pub portfolio_value: f64,
    /// Action index within the active space; `None` for the opening row
    pub action: Option<usize>,
    pub action_name: String,
    pub amount_bought: f64,
    pub amount_sold: f64,
    pub cash: f64,
    pub shares: f64,
    pub commission: f64,
}

impl SeriesRecord {
    /// Action code as written to series files, -1 for no action
    pub fn action_code(&self) -> i64 {
        self.action.map(|a| a as i64).unwrap_or(-1)
    }
}

/// Outcome of a greedy rollout
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub initial_value: f64,
    pub final_value: f64,
    pub return_pct: f64,
    pub final_cash: f64,
    pub final_shares: f64,
    /// Opening row followed by one row per executed step
    pub records: Vec<SeriesRecord>,
}

impl EvaluationReport {
    /// Number of buy or sell actions taken
    pub fn num_trades(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.amount_bought > 0.0 || r.amount_sold > 0.0)
            .count()
    }
}

/// Run one greedy episode from reset, recording every step
pub fn evaluate(
    env: &mut MarketEnvironment,
    q_table: &QTable,
    action_space: &ActionSpace,
) -> EvaluationReport {
    let mut policy = GreedyPolicy;
    let mut state = env.reset();
    let initial_value = env.portfolio_value();

    if !env.has_steps() {
        warn!(
            prices = env.prices().len(),
            required = env.min_series_len(),
            "Series too short to evaluate"
        );
        return EvaluationReport {
            initial_value,
            final_value: initial_value,
            return_pct: 0.0,
            final_cash: env.cash(),
            final_shares: env.shares(),
            records: Vec::new(),
        };
    }

    let mut records = vec![SeriesRecord {
        time: env.current_idx(),
        price: env.current_price(),
        portfolio_value: initial_value,
        action: None,
        action_name: Action::Nothing.to_string(),
        amount_bought: 0.0,
        amount_sold: 0.0,
        cash: env.cash(),
        shares: env.shares(),
        commission: 0.0,
    }];

    loop {
        let idx = policy.select(q_table, state.index);
        let action = action_space.action(idx).unwrap_or_default();
        let fill = env.preview_fill(action);
        let before = env.current_idx();

        let result = env.step(action);
        if env.current_idx() == before {
            break;
        }

        records.push(SeriesRecord {
            time: env.current_idx(),
            price: env.current_price(),
            portfolio_value: env.portfolio_value(),
            action: action_space.index_of(action),
            action_name: action.to_string(),
            amount_bought: fill.amount_bought,
            amount_sold: fill.amount_sold,
            cash: env.cash(),
            shares: env.shares(),
            commission: fill.commission_paid,
        });

        state = result.state;
        if result.done {
            break;
        }
    }

    let final_value = env.portfolio_value();
    let return_pct = if initial_value > 0.0 {
        (final_value / initial_value - 1.0) * 100.0
    } else {
        0.0
    };

    let report = EvaluationReport {
        initial_value,
        final_value,
        return_pct,
        final_cash: env.cash(),
        final_shares: env.shares(),
        records,
    };

    info!(
        "Evaluation: initial value={:.2}, final value={:.2}, return={:.2}%, cash={:.2}, shares={:.2}",
        report.initial_value,
        report.final_value,
        report.return_pct,
        report.final_cash,
        report.final_shares
    );

    report
}
