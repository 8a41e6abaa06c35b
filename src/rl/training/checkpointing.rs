//! Q-Table Checkpointing
//!
//! JSON checkpoints of trained tables plus the CSV exports consumed by
//! plotting tools: the Q-matrix and the evaluation series.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::evaluation::SeriesRecord;
use crate::error::{DataError, Result};
use crate::rl::agent::QTable;
use crate::rl::core::ActionSpace;

/// Columns of the series export
pub const SERIES_HEADER: [&str; 10] = [
    "time",
    "price",
    "portfolio_value",
    "action",
    "action_name",
    "amount_bought",
    "amount_sold",
    "cash",
    "shares",
    "commission",
];

/// Trained table with the metadata needed to resume or evaluate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableCheckpoint {
    pub created_at: DateTime<Utc>,
    /// Episodes trained into this table
    pub episodes: usize,
    pub action_space: ActionSpace,
    pub q_table: QTable,
}

impl QTableCheckpoint {
    pub fn new(q_table: QTable, action_space: ActionSpace, episodes: usize) -> Self {
        Self {
            created_at: Utc::now(),
            episodes,
            action_space,
            q_table,
        }
    }
}

/// Checkpointer for saving and loading Q-tables
pub struct Checkpointer {
    /// Directory for checkpoints
    checkpoint_dir: PathBuf,
    /// Maximum checkpoints to keep
    max_checkpoints: usize,
}

impl Checkpointer {
    pub fn new<P: AsRef<Path>>(checkpoint_dir: P, max_checkpoints: usize) -> Self {
        let checkpoint_dir = checkpoint_dir.as_ref().to_path_buf();

        if !checkpoint_dir.exists() {
            if let Err(e) = fs::create_dir_all(&checkpoint_dir) {
                warn!("Failed to create checkpoint directory: {}", e);
            }
        }

        Self {
            checkpoint_dir,
            max_checkpoints,
        }
    }

    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{}.json", name))
    }

    /// Save a checkpoint under `name`, pruning the oldest beyond the limit
    pub fn save(&self, checkpoint: &QTableCheckpoint, name: &str) -> Result<PathBuf> {
        let path = self.checkpoint_path(name);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(writer, checkpoint)?;

        info!("Saved checkpoint to {:?}", path);

        self.cleanup_old_checkpoints();
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<QTableCheckpoint> {
        let path = self.checkpoint_path(name);
        let reader = BufReader::new(File::open(&path)?);
        let checkpoint = serde_json::from_reader(reader)?;
        info!("Loaded checkpoint from {:?}", path);
        Ok(checkpoint)
    }

    /// Checkpoint names in ascending order
    pub fn list_checkpoints(&self) -> Vec<String> {
        let mut checkpoints = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.checkpoint_dir) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stem) = name.strip_suffix(".json") {
                        checkpoints.push(stem.to_string());
                    }
                }
            }
        }

        checkpoints.sort();
        checkpoints
    }

    pub fn latest_checkpoint(&self) -> Option<String> {
        self.list_checkpoints().into_iter().last()
    }

    fn cleanup_old_checkpoints(&self) {
        let checkpoints = self.list_checkpoints();

        if checkpoints.len() <= self.max_checkpoints {
            return;
        }

        let to_remove = checkpoints.len() - self.max_checkpoints;
        for name in checkpoints.into_iter().take(to_remove) {
            let path = self.checkpoint_path(&name);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old checkpoint {:?}: {}", path, e);
            } else {
                info!("Removed old checkpoint: {}", name);
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.checkpoint_path(name).exists()
    }
}

impl Default for Checkpointer {
    fn default() -> Self {
        Self::new("./checkpoints", 5)
    }
}

/// Generate a checkpoint name with timestamp
pub fn timestamped_name(prefix: &str) -> String {
    let now = Utc::now();
    format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"))
}

/// Generate a checkpoint name with episode number
pub fn episode_name(prefix: &str, episode: usize) -> String {
    format!("{}_ep{:06}", prefix, episode)
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Write a Q-matrix as `state,action_0,..` with 6-decimal values
pub fn save_q_matrix_csv(q_table: &QTable, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(q_table.num_actions() + 1);
    header.push("state".to_string());
    header.extend((0..q_table.num_actions()).map(|a| format!("action_{}", a)));
    writer.write_record(&header)?;

    for (state, row) in q_table.rows().enumerate() {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(state.to_string());
        record.extend(row.iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(
        states = q_table.num_states(),
        actions = q_table.num_actions(),
        "Saved Q matrix to {:?}",
        path
    );
    Ok(())
}

/// Read a Q-matrix written by [`save_q_matrix_csv`]
///
/// Rows may appear in any order but must cover every state exactly once.
pub fn load_q_matrix_csv(path: &Path) -> Result<QTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let num_actions = reader.headers()?.len().saturating_sub(1);

    let mut rows: Vec<(usize, Vec<f64>)> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let malformed = |reason: String| DataError::MalformedRow { row, reason };

        let state = record
            .get(0)
            .ok_or_else(|| malformed("missing state".into()))?
            .trim()
            .parse::<usize>()
            .map_err(|e| malformed(format!("bad state index: {}", e)))?;

        let values = record
            .iter()
            .skip(1)
            .map(|cell| cell.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| malformed(format!("bad value: {}", e)))?;
        if values.len() != num_actions {
            return Err(malformed(format!(
                "expected {} values, got {}",
                num_actions,
                values.len()
            ))
            .into());
        }
        rows.push((state, values));
    }

    rows.sort_by_key(|(state, _)| *state);
    for (expected, (state, _)) in rows.iter().enumerate() {
        if *state != expected {
            return Err(DataError::MalformedRow {
                row: expected + 1,
                reason: format!("expected state {}, found {}", expected, state),
            }
            .into());
        }
    }

    let num_states = rows.len();
    let table = QTable::from_rows(rows.into_iter().map(|(_, values)| values).collect())
        .unwrap_or_else(|| QTable::new(num_states, num_actions));
    info!(
        states = table.num_states(),
        actions = table.num_actions(),
        "Loaded Q matrix from {:?}",
        path
    );
    Ok(table)
}

/// Check a loaded table against the expected state and action counts
pub fn ensure_shape(q_table: &QTable, num_states: usize, num_actions: usize) -> Result<()> {
    if q_table.num_states() != num_states || q_table.num_actions() != num_actions {
        return Err(DataError::ShapeMismatch {
            expected_states: num_states,
            expected_actions: num_actions,
            states: q_table.num_states(),
            actions: q_table.num_actions(),
        }
        .into());
    }
    Ok(())
}

/// Write an evaluation trace with [`SERIES_HEADER`] columns
pub fn save_series_csv(records: &[SeriesRecord], path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(SERIES_HEADER)?;

    for r in records {
        writer.write_record([
            r.time.to_string(),
            format!("{:.6}", r.price),
            format!("{:.6}", r.portfolio_value),
            r.action_code().to_string(),
            r.action_name.clone(),
            format!("{:.6}", r.amount_bought),
            format!("{:.6}", r.amount_sold),
            format!("{:.6}", r.cash),
            format!("{:.6}", r.shares),
            format!("{:.6}", r.commission),
        ])?;
    }

    writer.flush()?;
    info!(rows = records.len(), "Saved series data to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_path() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::new(dir.path(), 5);
        let path = checkpointer.checkpoint_path("q_v1");

        assert!(path.to_string_lossy().ends_with("q_v1.json"));
    }

    #[test]
    fn test_timestamped_name() {
        let name = timestamped_name("q_table");
        assert!(name.starts_with("q_table_"));
        assert_eq!(name.len(), "q_table_".len() + 15);
    }

    #[test]
    fn test_episode_name() {
        let name = episode_name("q_table", 100);
        assert_eq!(name, "q_table_ep000100");
    }

    #[test]
    fn test_save_load_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::new(dir.path(), 2);

        let mut q = QTable::new(3, 2);
        q.set(1, 1, 0.25);
        let checkpoint = QTableCheckpoint::new(q, ActionSpace::new(vec![]), 10);

        for ep in 1..=3 {
            checkpointer.save(&checkpoint, &episode_name("q", ep)).unwrap();
        }
        assert_eq!(checkpointer.list_checkpoints(), vec!["q_ep000002", "q_ep000003"]);
        assert_eq!(checkpointer.latest_checkpoint().as_deref(), Some("q_ep000003"));
        assert!(!checkpointer.exists("q_ep000001"));

        let loaded = checkpointer.load("q_ep000003").unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_load_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::new(dir.path(), 2);
        assert!(checkpointer.load("absent").is_err());
    }

    #[test]
    fn test_load_corrupt_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = Checkpointer::new(dir.path(), 2);

        let checkpoint = QTableCheckpoint::new(QTable::new(4, 2), ActionSpace::basic(), 1);
        checkpointer.save(&checkpoint, "q").unwrap();

        let path = checkpointer.checkpoint_path("q");
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["q_table"]["values"] = serde_json::json!([1.0, 2.0]);
        fs::write(&path, json.to_string()).unwrap();

        assert!(checkpointer.load("q").is_err());
    }

    #[test]
    fn test_q_matrix_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("q_matrix.csv");

        let mut q = QTable::new(2, 3);
        q.set(0, 2, 1.5);
        q.set(1, 0, -0.1234567);
        save_q_matrix_csv(&q, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,action_0,action_1,action_2");
        assert_eq!(lines[1], "0,0.000000,0.000000,1.500000");
        assert_eq!(lines[2], "1,-0.123457,0.000000,0.000000");

        let loaded = load_q_matrix_csv(&path).unwrap();
        assert_eq!(loaded.num_states(), 2);
        assert_eq!(loaded.get(0, 2), 1.5);
        assert!((loaded.get(1, 0) + 0.123457).abs() < 1e-12);
        assert!(ensure_shape(&loaded, 2, 3).is_ok());
        assert!(ensure_shape(&loaded, 3, 3).is_err());
    }

    #[test]
    fn test_q_matrix_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.csv");
        fs::write(&path, "state,action_0\n0,1.0\n2,1.0\n").unwrap();
        assert!(load_q_matrix_csv(&path).is_err());

        fs::write(&path, "state,action_0\n0,abc\n").unwrap();
        assert!(load_q_matrix_csv(&path).is_err());
    }

    #[test]
    fn test_series_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let records = vec![
            SeriesRecord {
                time: 20,
                price: 101.0,
                portfolio_value: 10_000.0,
                action: None,
                action_name: "nothing".into(),
                amount_bought: 0.0,
                amount_sold: 0.0,
                cash: 10_000.0,
                shares: 0.0,
                commission: 0.0,
            },
            SeriesRecord {
                time: 21,
                price: 102.0,
                portfolio_value: 10_008.0,
                action: Some(1),
                action_name: "buy-small".into(),
                amount_bought: 9.88,
                amount_sold: 0.0,
                cash: 9_000.0,
                shares: 9.88,
                commission: 2.0,
            },
        ];
        save_series_csv(&records, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SERIES_HEADER.join(","));
        assert!(lines[1].starts_with("20,101.000000,10000.000000,-1,nothing,"));
        assert!(lines[2].starts_with("21,102.000000,10008.000000,1,buy-small,9.880000,"));
    }
}
