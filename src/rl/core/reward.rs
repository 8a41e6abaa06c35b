//! Reward Functions
//!
//! One-step log return of portfolio value, with an optional penalty for
//! long runs of same-direction trades.

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Log return between two portfolio valuations
///
/// Returns 0 when `value_before` is not positive.
pub fn calculate_reward(value_before: f64, value_after: f64) -> f64 {
    if value_before > 0.0 {
        (value_after / value_before).ln()
    } else {
        0.0
    }
}

/// Penalty applied once a same-direction trade streak passes `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePenalty {
    pub threshold: u32,
    pub amount: f64,
}

impl Default for TradePenalty {
    fn default() -> Self {
        Self {
            threshold: 3,
            amount: 0.001,
        }
    }
}

/// Consecutive buy/sell counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeStreak {
    buys: u32,
    sells: u32,
}

impl TradeStreak {
    /// Record an action and return the updated streak lengths
    pub fn record(&mut self, action: Action) -> (u32, u32) {
        if action.is_buy() {
            self.sells = 0;
            self.buys += 1;
        } else if action.is_sell() {
            self.buys = 0;
            self.sells += 1;
        } else {
            self.buys = 0;
            self.sells = 0;
        }
        (self.buys, self.sells)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Penalty owed for the current streak
    pub fn penalty(&self, penalty: &TradePenalty) -> f64 {
        if self.buys > penalty.threshold || self.sells > penalty.threshold {
            penalty.amount
        } else {
            0.0
        }
    }

    pub fn buys(&self) -> u32 {
        self.buys
    }

    pub fn sells(&self) -> u32 {
        self.sells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_zero_when_unchanged() {
        assert_eq!(calculate_reward(1000.0, 1000.0), 0.0);
    }

    #[test]
    fn test_reward_sign() {
        assert!(calculate_reward(100.0, 110.0) > 0.0);
        assert!(calculate_reward(100.0, 90.0) < 0.0);
        assert!((calculate_reward(100.0, 200.0) - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_reward_non_positive_base() {
        assert_eq!(calculate_reward(0.0, 100.0), 0.0);
        assert_eq!(calculate_reward(-5.0, 100.0), 0.0);
    }

    #[test]
    fn test_streak_resets_on_direction_change() {
        let mut streak = TradeStreak::default();
        assert_eq!(streak.record(Action::BuySmall), (1, 0));
        assert_eq!(streak.record(Action::BuyLarge), (2, 0));
        assert_eq!(streak.record(Action::SellSmall), (0, 1));
        assert_eq!(streak.record(Action::Nothing), (0, 0));
    }

    #[test]
    fn test_penalty_after_threshold() {
        let penalty = TradePenalty {
            threshold: 2,
            amount: 0.01,
        };
        let mut streak = TradeStreak::default();
        streak.record(Action::BuySmall);
        streak.record(Action::BuySmall);
        assert_eq!(streak.penalty(&penalty), 0.0);
        streak.record(Action::BuySmall);
        assert_eq!(streak.penalty(&penalty), 0.01);
    }
}
