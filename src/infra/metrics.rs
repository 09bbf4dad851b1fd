// ============================================================
// Layer 6 — Metrics Sink
// ============================================================
// Records scalar training metrics as (step, name, value) rows
// in a CSV file, one row per metric per epoch:
//
//   step,name,value
//   1,Loss/train,2.871034
//   1,Accuracy/train,0.183000
//   1,Loss/val,2.104512
//   1,Accuracy/val,0.402000
//   1,LearningRate,0.010000
//   ...
//
// The file is appended to, so several runs can share a
// directory and be told apart by their step sequences.
//
// Output file: <metrics_dir>/scalars.csv

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{SignError, SignResult};
use crate::domain::traits::MetricsSink;

/// Summary of one epoch, as reported by the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Learning rate used during this epoch
    pub learning_rate: f64,

    /// Mean cross-entropy over all training samples
    pub train_loss: f64,

    /// Fraction of training samples classified correctly (augmented)
    pub train_accuracy: f64,

    /// Mean cross-entropy over the validation split
    pub val_loss: f64,

    /// Fraction of validation samples classified correctly
    pub val_accuracy: f64,
}

impl EpochMetrics {
    /// Push every scalar of this epoch into a sink.
    pub fn emit(&self, sink: &mut dyn MetricsSink) -> SignResult<()> {
        let step = self.epoch;
        sink.record("Loss/train",     self.train_loss,     step)?;
        sink.record("Accuracy/train", self.train_accuracy, step)?;
        sink.record("Loss/val",       self.val_loss,       step)?;
        sink.record("Accuracy/val",   self.val_accuracy,   step)?;
        sink.record("LearningRate",   self.learning_rate,  step)
    }
}

/// Appends scalar triples to a CSV file.
pub struct CsvMetricsSink {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl CsvMetricsSink {
    /// Create the sink, writing the header if the file is new.
    pub fn new(dir: impl Into<PathBuf>) -> SignResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SignError::io(&dir, e))?;

        let csv_path = dir.join("scalars.csv");
        if !csv_path.exists() {
            fs::write(&csv_path, "step,name,value\n").map_err(|e| SignError::io(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricsSink for CsvMetricsSink {
    fn record(&mut self, name: &str, value: f64, step: usize) -> SignResult<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| SignError::io(&self.csv_path, e))?;

        writeln!(f, "{step},{name},{value:.6}").map_err(|e| SignError::io(&self.csv_path, e))
    }
}

/// Keeps every triple in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryMetricsSink {
    pub scalars: Vec<(String, f64, usize)>,
}

#[cfg(test)]
impl MemoryMetricsSink {
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.scalars
            .iter()
            .filter(|(n, _, _)| n == name)
            .map(|(_, v, _)| *v)
            .collect()
    }
}

#[cfg(test)]
impl MetricsSink for MemoryMetricsSink {
    fn record(&mut self, name: &str, value: f64, step: usize) -> SignResult<()> {
        self.scalars.push((name.to_string(), value, step));
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn epoch(n: usize) -> EpochMetrics {
        EpochMetrics {
            epoch:          n,
            learning_rate:  0.01,
            train_loss:     2.5,
            train_accuracy: 0.25,
            val_loss:       2.0,
            val_accuracy:   0.5,
        }
    }

    #[test]
    fn test_emit_writes_all_scalars() {
        let mut sink = MemoryMetricsSink::default();
        epoch(3).emit(&mut sink).unwrap();

        assert_eq!(sink.scalars.len(), 5);
        assert!(sink.scalars.iter().all(|(_, _, step)| *step == 3));
        assert_eq!(sink.values("Accuracy/val"), vec![0.5]);
    }

    #[test]
    fn test_csv_sink_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = CsvMetricsSink::new(dir.path()).unwrap();
            epoch(1).emit(&mut sink).unwrap();
        }
        // reopening keeps the existing header and rows
        let mut sink = CsvMetricsSink::new(dir.path()).unwrap();
        sink.record("Loss/train", 1.25, 2).unwrap();

        let text  = fs::read_to_string(sink.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,name,value");
        assert_eq!(lines[1], "1,Loss/train,2.500000");
        assert_eq!(lines.last().copied(), Some("2,Loss/train,1.250000"));
        assert_eq!(lines.len(), 7);
    }
}
