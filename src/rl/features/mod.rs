//! State Features
//!
//! Pure functions that turn a price or return history into the categorical
//! signals used to build environment states.

pub mod local_approximation;
pub mod moving_average;
pub mod permutation;

pub use local_approximation::{forecast, ApproxParams, Forecast, LocalApproximationError};
pub use moving_average::{simple_moving_average, MovingAverageRanking};
pub use permutation::NUM_PERMUTATIONS;

/// Simple returns `p[i] / p[i-1] - 1`; empty for fewer than two prices
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_returns() {
        assert!(simple_returns(&[]).is_empty());
        assert!(simple_returns(&[100.0]).is_empty());
        let r = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }
}
