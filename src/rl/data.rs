//! Price Data
//!
//! CSV price loaders and a seeded synthetic price generator.

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DataError, Result};

/// Parse a price cell; quotes and thousands separators are stripped
///
/// Returns `None` for unparsable or non-positive values.
pub fn parse_price(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

fn is_date_column(name: &str) -> bool {
    name.trim().trim_matches('"').eq_ignore_ascii_case("date")
}

/// Load one price column from a CSV file with a header row
///
/// With `column` set, that header is used; otherwise the first non-date
/// column whose first data cell is a price. Bad cells are skipped.
pub fn load_prices_csv(path: &Path, column: Option<&str>) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let col_idx = match column {
        Some(name) => headers
            .iter()
            .position(|h| h.trim().trim_matches('"') == name)
            .ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
            })?,
        None => headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_date_column(h))
            .map(|(i, _)| i)
            .find(|i| {
                records
                    .first()
                    .and_then(|r| r.get(*i))
                    .and_then(parse_price)
                    .is_some()
            })
            .ok_or_else(|| DataError::MissingColumn {
                column: "<first numeric>".to_string(),
            })?,
    };

    let mut skipped = 0usize;
    let mut prices = Vec::with_capacity(records.len());
    for record in &records {
        match record.get(col_idx).and_then(parse_price) {
            Some(price) => prices.push(price),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, column = col_idx, "skipped unusable price cells");
    }
    if prices.is_empty() {
        return Err(DataError::NoPrices {
            source_name: path.display().to_string(),
        }
        .into());
    }

    debug!(count = prices.len(), "loaded prices from {:?}", path);
    Ok(prices)
}

/// Load every non-date column of a CSV file as its own price series
///
/// Series are keyed by header name and iterate in sorted order.
pub fn load_multi_series_csv(path: &Path) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_date_column(h))
        .map(|(i, h)| (i, h.trim().trim_matches('"').to_string()))
        .collect();
    if columns.is_empty() {
        return Err(DataError::NoPrices {
            source_name: path.display().to_string(),
        }
        .into());
    }

    let mut series: BTreeMap<String, Vec<f64>> = columns
        .iter()
        .map(|(_, name)| (name.clone(), Vec::new()))
        .collect();

    for record in reader.records() {
        let record = record?;
        for (idx, name) in &columns {
            if let Some(price) = record.get(*idx).and_then(parse_price) {
                if let Some(prices) = series.get_mut(name) {
                    prices.push(price);
                }
            }
        }
    }

    for (name, prices) in &series {
        debug!(series = %name, count = prices.len(), "loaded series");
    }
    Ok(series)
}

/// Seeded geometric random walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalk {
    /// First price of the series
    pub start_price: f64,
    /// Mean log return per step
    pub drift: f64,
    /// Half-width of the uniform log-return shock
    pub volatility: f64,
    pub seed: u64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0005,
            volatility: 0.02,
            seed: 42,
        }
    }
}

impl RandomWalk {
    /// Generate `len` strictly positive prices
    pub fn generate(&self, len: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut prices = Vec::with_capacity(len);
        let mut price = if self.start_price > 0.0 {
            self.start_price
        } else {
            100.0
        };
        let volatility = self.volatility.abs();

        for _ in 0..len {
            prices.push(price);
            let shock = if volatility > 0.0 {
                rng.gen_range(-volatility..volatility)
            } else {
                0.0
            };
            price *= (self.drift + shock).exp();
        }
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("101.5"), Some(101.5));
        assert_eq!(parse_price("\"1,234.50\""), Some(1234.5));
        assert_eq!(parse_price(" 7 "), Some(7.0));
        assert_eq!(parse_price("0"), None);
        assert_eq!(parse_price("-3"), None);
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_load_single_series_skips_date_and_bad_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(
            &path,
            "Date,Close\n2024-01-01,100.0\n2024-01-02,\"1,001.5\"\n2024-01-03,oops\n2024-01-04,0\n2024-01-05,102\n",
        )
        .unwrap();

        let prices = load_prices_csv(&path, None).unwrap();
        assert_eq!(prices, vec![100.0, 1001.5, 102.0]);
    }

    #[test]
    fn test_load_named_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "Date,A,B\nd1,1,10\nd2,2,20\n").unwrap();

        assert_eq!(load_prices_csv(&path, Some("B")).unwrap(), vec![10.0, 20.0]);
        assert!(load_prices_csv(&path, Some("C")).is_err());
    }

    #[test]
    fn test_load_without_prices_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "Date,A\nd1,x\n").unwrap();
        assert!(load_prices_csv(&path, None).is_err());
    }

    #[test]
    fn test_load_multi_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "\"Date\",ZZZ,AAA\nd1,1,10\nd2,bad,20\nd3,3,30\n").unwrap();

        let series = load_multi_series_csv(&path).unwrap();
        let names: Vec<&String> = series.keys().collect();
        assert_eq!(names, vec!["AAA", "ZZZ"]);
        assert_eq!(series["AAA"], vec![10.0, 20.0, 30.0]);
        assert_eq!(series["ZZZ"], vec![1.0, 3.0]);
    }

    #[test]
    fn test_random_walk_is_seeded_and_positive() {
        let walk = RandomWalk::default();
        let a = walk.generate(500);
        let b = walk.generate(500);
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
        assert_eq!(a[0], 100.0);
        assert!(a.iter().all(|p| *p > 0.0));

        let other = RandomWalk {
            seed: 7,
            ..RandomWalk::default()
        };
        assert_ne!(other.generate(500), a);
    }

    #[test]
    fn test_flat_random_walk() {
        let walk = RandomWalk {
            drift: 0.0,
            volatility: 0.0,
            ..RandomWalk::default()
        };
        assert!(walk.generate(10).iter().all(|p| *p == 100.0));
    }
}
