//! Local Approximation
//!
//! k-nearest-neighbour one-step-ahead forecaster over a return series. The
//! last `m` returns form the target pattern; every earlier length-`m` window
//! that still has a successor is a candidate. The `n` closest candidates (L2
//! distance) vote on the next value with inverse-distance weights.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keeps the weight finite for exact matches
const WEIGHT_EPSILON: f64 = 1e-10;

/// Reasons a forecast cannot be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocalApproximationError {
    #[error("return series is empty")]
    EmptySeries,

    #[error("window size must be at least 1")]
    InvalidWindow,

    #[error("neighbor count must be at least 1")]
    InvalidNeighborCount,

    #[error("insufficient data: need at least {required} returns, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("insufficient history to find candidate patterns")]
    InsufficientHistory,

    #[error("no historical patterns found")]
    NoPatternsFound,
}

/// Forecast and the distance of the closest matching pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub prediction: f64,
    pub min_distance: f64,
}

/// Window size `m` and neighbour count `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproxParams {
    pub window: usize,
    pub neighbors: usize,
}

impl Default for ApproxParams {
    fn default() -> Self {
        Self {
            window: 7,
            neighbors: 5,
        }
    }
}

impl ApproxParams {
    pub fn new(window: usize, neighbors: usize) -> Self {
        Self { window, neighbors }
    }

    pub fn forecast(&self, returns: &[f64]) -> Result<Forecast, LocalApproximationError> {
        forecast(returns, self.window, self.neighbors)
    }
}

/// Candidate window, ordered by distance then end position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Neighbor {
    distance: OrderedFloat<f64>,
    /// Index of the window's last element
    position: usize,
}

/// Forecast the value following `returns` from its `n` nearest patterns
pub fn forecast(returns: &[f64], m: usize, n: usize) -> Result<Forecast, LocalApproximationError> {
    if returns.is_empty() {
        return Err(LocalApproximationError::EmptySeries);
    }
    if m < 1 {
        return Err(LocalApproximationError::InvalidWindow);
    }
    if n < 1 {
        return Err(LocalApproximationError::InvalidNeighborCount);
    }
    if returns.len() < m + 1 {
        return Err(LocalApproximationError::InsufficientData {
            required: m + 1,
            actual: returns.len(),
        });
    }

    let target = &returns[returns.len() - m..];

    // Window ends run up to len - 2 so every candidate has a successor and
    // the target window (ending at len - 1) never matches itself.
    let first_end = m - 1;
    let last_end = returns.len() - 2;
    if last_end < first_end {
        return Err(LocalApproximationError::InsufficientHistory);
    }

    // Max-heap on distance: the root is the worst of the kept neighbours.
    let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(n + 1);
    for end in first_end..=last_end {
        let window = &returns[end + 1 - m..=end];
        let candidate = Neighbor {
            distance: OrderedFloat(euclidean(target, window)),
            position: end,
        };

        if heap.len() < n {
            heap.push(candidate);
        } else if let Some(mut worst) = heap.peek_mut() {
            if candidate.distance < worst.distance {
                *worst = candidate;
            }
        }
    }

    if heap.is_empty() {
        return Err(LocalApproximationError::NoPatternsFound);
    }

    let neighbors = heap.into_sorted_vec();

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for neighbor in &neighbors {
        let weight = 1.0 / (neighbor.distance.into_inner() + WEIGHT_EPSILON);
        weighted_sum += weight * returns[neighbor.position + 1];
        weight_sum += weight;
    }

    Ok(Forecast {
        prediction: weighted_sum / weight_sum,
        min_distance: neighbors[0].distance.into_inner(),
    })
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern_match() {
        let returns = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0];
        let result = forecast(&returns, 3, 2).unwrap();
        assert!(result.min_distance < 1e-10);
        assert!((result.prediction - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_target_window_excluded() {
        let returns = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 1.0, 2.0, 3.0];
        let result = forecast(&returns, 3, 2).unwrap();
        assert!(result.min_distance > 0.0);
    }

    #[test]
    fn test_increasing_trend_is_bounded() {
        let returns: Vec<f64> = (10..20).map(|v| v as f64).collect();
        let result = forecast(&returns, 3, 3).unwrap();
        assert!(result.prediction >= 10.0 && result.prediction <= 25.0);
        assert!(result.min_distance.is_finite() && result.min_distance >= 0.0);
    }

    #[test]
    fn test_single_neighbor_uses_closest_successor() {
        let returns = [5.0, 6.0, 7.0, 5.5, 6.5, 7.5];
        // Target [6.5, 7.5]; closest candidate is [6.0, 7.0] ending at 2
        let result = forecast(&returns, 2, 1).unwrap();
        assert!((result.prediction - 5.5).abs() < 1e-9);
        assert!((result.min_distance - 0.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_more_neighbors_than_candidates() {
        let returns = [1.0, 2.0, 3.0, 4.0];
        let result = forecast(&returns, 2, 10).unwrap();
        assert!(result.prediction.is_finite());
    }

    #[test]
    fn test_minimal_series() {
        // len == m + 1: exactly one candidate
        let returns = [1.0, 2.0, 3.0];
        let result = forecast(&returns, 2, 1).unwrap();
        assert!((result.prediction - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(forecast(&[], 3, 2), Err(LocalApproximationError::EmptySeries));
        assert_eq!(
            forecast(&[1.0, 2.0, 3.0], 0, 2),
            Err(LocalApproximationError::InvalidWindow)
        );
        assert_eq!(
            forecast(&[1.0, 2.0, 3.0], 2, 0),
            Err(LocalApproximationError::InvalidNeighborCount)
        );
        assert_eq!(
            forecast(&[1.0, 2.0], 2, 1),
            Err(LocalApproximationError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_params_delegate() {
        let params = ApproxParams::new(3, 2);
        let returns = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0];
        assert_eq!(params.forecast(&returns), forecast(&returns, 3, 2));
    }
}
