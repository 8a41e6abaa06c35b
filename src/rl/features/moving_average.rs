//! Moving-Average Ranking
//!
//! Ranks six simple moving averages and the current price against each
//! other and tracks whether the averages are fanning out or bunching up.

use serde::{Deserialize, Serialize};

use super::permutation::{self, RANKING_LEN};
use crate::rl::core::Divergence;

/// Number of moving-average slots in a ranking
pub const NUM_WINDOWS: usize = 6;

/// Tag of the current price in a ranking; MA slots use `1..=6`
pub const PRICE_TAG: usize = 7;

/// Values closer than this rank as equal
const TIE_EPSILON: f64 = 1e-10;

/// Relative spread change needed to leave [`Divergence::Neutral`]
const DIVERGENCE_THRESHOLD: f64 = 0.01;

/// Simple moving average of `window` prices ending at `idx`
pub fn simple_moving_average(prices: &[f64], idx: usize, window: usize) -> Option<f64> {
    if window == 0 || idx >= prices.len() || idx + 1 < window {
        return None;
    }
    let sum: f64 = prices[idx + 1 - window..=idx].iter().sum();
    Some(sum / window as f64)
}

/// Ranking configuration: six ordered windows and the divergence lookback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageRanking {
    pub windows: [usize; NUM_WINDOWS],
    pub divergence_lookback: usize,
}

impl Default for MovingAverageRanking {
    fn default() -> Self {
        Self {
            windows: [10, 20, 30, 40, 50, 60],
            divergence_lookback: 10,
        }
    }
}

impl MovingAverageRanking {
    /// Longer-horizon window set
    pub fn long() -> Self {
        Self {
            windows: [5, 10, 20, 40, 80, 120],
            divergence_lookback: 10,
        }
    }

    /// Earliest index at which every window has enough history
    pub fn min_index(&self) -> usize {
        self.windows.iter().copied().max().unwrap_or(1).saturating_sub(1)
    }

    /// Moving averages at `idx`, in window order
    fn averages(&self, prices: &[f64], idx: usize) -> Option<[f64; NUM_WINDOWS]> {
        let mut out = [0.0; NUM_WINDOWS];
        for (slot, &window) in out.iter_mut().zip(self.windows.iter()) {
            *slot = simple_moving_average(prices, idx, window)?;
        }
        Some(out)
    }

    /// Tags ordered from highest to lowest value
    ///
    /// Tags `1..=6` are the window slots and 7 is the current price. Values
    /// within 1e-10 of each other rank by ascending tag. Returns `None`
    /// before [`min_index`](Self::min_index) or past the end of the series.
    pub fn ordering(&self, prices: &[f64], idx: usize) -> Option<[usize; RANKING_LEN]> {
        let averages = self.averages(prices, idx)?;

        let mut values = [(0.0, 0usize); RANKING_LEN];
        for (i, value) in averages.iter().enumerate() {
            values[i] = (*value, i + 1);
        }
        values[NUM_WINDOWS] = (prices[idx], PRICE_TAG);

        Some(rank_descending(values))
    }

    /// Lehmer index of the ranking at `idx`, 0 when unavailable
    pub fn ranking_index(&self, prices: &[f64], idx: usize) -> usize {
        self.ordering(prices, idx)
            .map(|ordering| permutation::encode(&ordering))
            .unwrap_or(0)
    }

    /// Classify the spread of the averages against `divergence_lookback`
    /// steps earlier
    pub fn divergence(&self, prices: &[f64], idx: usize) -> Divergence {
        let Some(current) = self.averages(prices, idx) else {
            return Divergence::Neutral;
        };
        let earlier_idx = idx
            .saturating_sub(self.divergence_lookback)
            .max(self.min_index());
        if earlier_idx >= idx {
            return Divergence::Neutral;
        }
        let Some(earlier) = self.averages(prices, earlier_idx) else {
            return Divergence::Neutral;
        };

        let (cur_min, cur_max) = min_max(&current);
        let (prev_min, prev_max) = min_max(&earlier);
        let change = (cur_max - cur_min) - (prev_max - prev_min);
        let threshold = DIVERGENCE_THRESHOLD * (cur_max + cur_min) / 2.0;

        if change < -threshold {
            Divergence::Converging
        } else if change > threshold {
            Divergence::Diverging
        } else {
            Divergence::Neutral
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Selection sort with an epsilon-aware, tag-breaking comparison
fn rank_descending(mut values: [(f64, usize); RANKING_LEN]) -> [usize; RANKING_LEN] {
    let beats = |a: (f64, usize), b: (f64, usize)| {
        let diff = a.0 - b.0;
        if diff.abs() < TIE_EPSILON {
            a.1 < b.1
        } else {
            diff > 0.0
        }
    };

    let mut ordering = [0; RANKING_LEN];
    for pos in 0..RANKING_LEN {
        let mut best = pos;
        for cand in pos + 1..RANKING_LEN {
            if beats(values[cand], values[best]) {
                best = cand;
            }
        }
        values.swap(pos, best);
        ordering[pos] = values[pos].1;
    }
    ordering
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_moving_average() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(simple_moving_average(&prices, 4, 5), Some(3.0));
        assert_eq!(simple_moving_average(&prices, 4, 2), Some(4.5));
        assert_eq!(simple_moving_average(&prices, 3, 5), None);
        assert_eq!(simple_moving_average(&prices, 5, 1), None);
    }

    #[test]
    fn test_equal_values_rank_by_tag() {
        let values = [(1.0, 3), (1.0, 1), (1.0, 7), (1.0, 2), (1.0, 6), (1.0, 5), (1.0, 4)];
        assert_eq!(rank_descending(values), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_flat_series_is_identity() {
        let prices = vec![100.0; 80];
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.ordering(&prices, 79), Some([1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(ranking.ranking_index(&prices, 79), 0);
        assert_eq!(ranking.divergence(&prices, 79), Divergence::Neutral);
    }

    #[test]
    fn test_rising_series_puts_price_on_top() {
        let prices: Vec<f64> = (1..=80).map(|i| i as f64).collect();
        let ranking = MovingAverageRanking::default();
        // Shorter averages track a rising price more closely
        assert_eq!(ranking.ordering(&prices, 79), Some([7, 1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_falling_series_puts_price_at_bottom() {
        let prices: Vec<f64> = (1..=80).rev().map(|i| i as f64).collect();
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.ordering(&prices, 79), Some([6, 5, 4, 3, 2, 1, 7]));
    }

    #[test]
    fn test_insufficient_history() {
        let prices: Vec<f64> = (1..=80).map(|i| i as f64).collect();
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.min_index(), 59);
        assert_eq!(ranking.ordering(&prices, 58), None);
        assert_eq!(ranking.ranking_index(&prices, 58), 0);
        assert_eq!(ranking.divergence(&prices, 58), Divergence::Neutral);
    }

    #[test]
    fn test_no_earlier_point_is_neutral() {
        let prices: Vec<f64> = (1..=80).map(|i| (i * i) as f64).collect();
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.divergence(&prices, ranking.min_index()), Divergence::Neutral);
    }

    #[test]
    fn test_accelerating_series_diverges() {
        // Quadratic growth widens the gap between short and long averages
        let prices: Vec<f64> = (1..=100).map(|i| (i * i) as f64).collect();
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.divergence(&prices, 99), Divergence::Diverging);
    }

    #[test]
    fn test_flattening_series_converges() {
        // Strong trend followed by a long flat stretch pulls averages together
        let mut prices: Vec<f64> = (0..60).map(|i| 100.0 + 5.0 * i as f64).collect();
        prices.extend(std::iter::repeat(395.0).take(50));
        let ranking = MovingAverageRanking::default();
        assert_eq!(ranking.divergence(&prices, 109), Divergence::Converging);
    }

    #[test]
    fn test_long_windows() {
        let ranking = MovingAverageRanking::long();
        assert_eq!(ranking.min_index(), 119);
    }
}
