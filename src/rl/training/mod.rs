//! Training Infrastructure
//!
//! Training loops, checkpointing, and evaluation utilities.

pub mod checkpointing;
pub mod evaluation;
pub mod trainer;

pub use checkpointing::{
    ensure_shape, load_q_matrix_csv, save_q_matrix_csv, save_series_csv, Checkpointer,
    QTableCheckpoint,
};
pub use evaluation::{evaluate, EvaluationReport, SeriesRecord};
pub use trainer::{
    summarize_reports, CancellationToken, EpisodeReport, Trainer, TrainingStats, TrainingSummary,
};
