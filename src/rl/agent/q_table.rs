//! Q-Table
//!
//! Dense state-action value table stored row-major in a flat vector.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Tabular action-value function `Q[state][action]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQTable")]
pub struct QTable {
    num_states: usize,
    num_actions: usize,
    values: Vec<f64>,
}

/// Serialized form, checked before it becomes a [`QTable`]
#[derive(Deserialize)]
struct RawQTable {
    num_states: usize,
    num_actions: usize,
    values: Vec<f64>,
}

impl TryFrom<RawQTable> for QTable {
    type Error = DataError;

    fn try_from(raw: RawQTable) -> Result<Self, Self::Error> {
        let expected = raw.num_states.checked_mul(raw.num_actions);
        if expected != Some(raw.values.len()) {
            return Err(DataError::TableLength {
                states: raw.num_states,
                actions: raw.num_actions,
                values: raw.values.len(),
            });
        }
        Ok(Self {
            num_states: raw.num_states,
            num_actions: raw.num_actions,
            values: raw.values,
        })
    }
}

impl QTable {
    /// Zero-initialised table
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            num_states,
            num_actions,
            values: vec![0.0; num_states * num_actions],
        }
    }

    /// Build a table from per-state rows; `None` if rows are ragged
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let num_states = rows.len();
        let num_actions = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != num_actions) {
            return None;
        }
        Some(Self {
            num_states,
            num_actions,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn offset(&self, state: usize, action: usize) -> Option<usize> {
        (state < self.num_states && action < self.num_actions)
            .then(|| state * self.num_actions + action)
    }

    /// Value of `(state, action)`, 0 outside the table
    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.offset(state, action)
            .map(|i| self.values[i])
            .unwrap_or(0.0)
    }

    /// Store a value; writes outside the table are ignored
    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        if let Some(i) = self.offset(state, action) {
            self.values[i] = value;
        }
    }

    /// Action values for `state`; empty outside the table
    pub fn row(&self, state: usize) -> &[f64] {
        if state >= self.num_states {
            return &[];
        }
        let start = state * self.num_actions;
        &self.values[start..start + self.num_actions]
    }

    /// Highest action value for `state`, 0 for an empty row
    pub fn max(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Rows in state order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics
        self.values.chunks(self.num_actions.max(1))
    }

    /// Number of entries that moved away from zero
    pub fn nonzero_entries(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_zero() {
        let q = QTable::new(4, 3);
        assert_eq!(q.num_states(), 4);
        assert_eq!(q.num_actions(), 3);
        assert_eq!(q.row(2), &[0.0, 0.0, 0.0]);
        assert_eq!(q.max(2), 0.0);
        assert_eq!(q.nonzero_entries(), 0);
    }

    #[test]
    fn test_get_set_and_max() {
        let mut q = QTable::new(2, 3);
        q.set(1, 0, -2.0);
        q.set(1, 2, -1.0);
        q.set(1, 1, -3.0);
        assert_eq!(q.get(1, 2), -1.0);
        assert_eq!(q.max(1), -1.0);
        assert_eq!(q.max(0), 0.0);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut q = QTable::new(2, 2);
        q.set(5, 0, 1.0);
        q.set(0, 5, 1.0);
        assert_eq!(q.get(5, 0), 0.0);
        assert!(q.row(5).is_empty());
        assert_eq!(q.max(5), 0.0);
        assert_eq!(q.nonzero_entries(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut q = QTable::new(2, 2);
        q.set(1, 0, 0.5);
        let json = serde_json::to_string(&q).unwrap();
        let loaded: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, q);
    }

    #[test]
    fn test_json_with_wrong_value_count_is_rejected() {
        let short = r#"{"num_states":3,"num_actions":2,"values":[0.0,1.0]}"#;
        let err = serde_json::from_str::<QTable>(short).unwrap_err();
        assert!(err.to_string().contains("3x2 holds 2 values"));

        let overflow = format!(
            r#"{{"num_states":{},"num_actions":2,"values":[]}}"#,
            usize::MAX
        );
        assert!(serde_json::from_str::<QTable>(&overflow).is_err());
    }

    #[test]
    fn test_empty_actions() {
        let q = QTable::new(3, 0);
        assert_eq!(q.max(1), 0.0);
        assert_eq!(q.rows().count(), 0);
    }

    #[test]
    fn test_from_rows() {
        let q = QTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(q.get(1, 0), 3.0);
        assert_eq!(q.rows().count(), 2);
        assert!(QTable::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_none());
    }
}
