// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// All hyperparameters of a run, read once from a JSON file and
// then passed by reference to every component. Nothing mutates
// the config after `from_file` returns.
//
// Example (every field is optional, defaults shown):
//
//   {
//     "seed": 42,
//     "output_dir": "saved_models",
//     "metrics_dir": "runs/sign_language",
//     "train": {
//       "train_set": { "path": "data/sign_mnist_train.csv",
//                      "val_split": 0.25, "shuffle": true },
//       "batch_size": 64, "workers": 2, "epochs": 25,
//       "learning_rate": 0.01, "momentum": 0.9,
//       "learning_rate_gamma": 0.1, "learning_rate_decay_period": 7,
//       "save": true
//     },
//     "test": {
//       "test_set": { "path": "data/sign_mnist_test.csv" },
//       "batch_size": 64
//     },
//     "augmentation": { ... see data/augment.rs ... }
//   }
//
// Validation runs before any data is read, so a bad value aborts
// the command before the first epoch.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::data::augment::AugmentationConfig;
use crate::domain::error::{SignError, SignResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub seed:         u64,
    pub output_dir:   String,
    pub metrics_dir:  String,
    pub train:        TrainSection,
    pub test:         TestSection,
    pub augmentation: AugmentationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainSection {
    pub train_set:                  TrainSetConfig,
    pub batch_size:                 usize,
    pub workers:                    usize,
    pub epochs:                     usize,
    pub learning_rate:              f64,
    pub momentum:                   f64,
    pub learning_rate_gamma:        f64,
    pub learning_rate_decay_period: usize,
    pub save:                       bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainSetConfig {
    pub path:      String,
    pub val_split: f64,
    pub shuffle:   bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSection {
    pub test_set:   TestSetConfig,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSetConfig {
    pub path: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed:         42,
            output_dir:   "saved_models".to_string(),
            metrics_dir:  "runs/sign_language".to_string(),
            train:        TrainSection::default(),
            test:         TestSection::default(),
            augmentation: AugmentationConfig::default(),
        }
    }
}

impl Default for TrainSection {
    fn default() -> Self {
        Self {
            train_set:                  TrainSetConfig::default(),
            batch_size:                 64,
            workers:                    2,
            epochs:                     25,
            learning_rate:              0.01,
            momentum:                   0.9,
            learning_rate_gamma:        0.1,
            learning_rate_decay_period: 7,
            save:                       true,
        }
    }
}

impl Default for TrainSetConfig {
    fn default() -> Self {
        Self {
            path:      "data/sign_mnist_train.csv".to_string(),
            val_split: 0.25,
            shuffle:   true,
        }
    }
}

impl Default for TestSection {
    fn default() -> Self {
        Self { test_set: TestSetConfig::default(), batch_size: 64 }
    }
}

impl Default for TestSetConfig {
    fn default() -> Self {
        Self { path: "data/sign_mnist_test.csv".to_string() }
    }
}

impl RunConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> SignResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| SignError::io(path, e))?;
        let cfg: RunConfig = serde_json::from_str(&json)
            .map_err(|e| SignError::config(format!("'{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject hyperparameters no training run could use.
    pub fn validate(&self) -> SignResult<()> {
        let t = &self.train;

        if t.batch_size == 0 || self.test.batch_size == 0 {
            return Err(SignError::config("batch_size must be at least 1"));
        }
        if t.epochs == 0 {
            return Err(SignError::config("epochs must be at least 1"));
        }
        if !(t.learning_rate > 0.0 && t.learning_rate.is_finite()) {
            return Err(SignError::config(format!("learning_rate must be positive, got {}", t.learning_rate)));
        }
        if !(0.0..1.0).contains(&t.momentum) {
            return Err(SignError::config(format!("momentum must be in [0, 1), got {}", t.momentum)));
        }
        if !(t.learning_rate_gamma > 0.0 && t.learning_rate_gamma <= 1.0) {
            return Err(SignError::config(format!(
                "learning_rate_gamma must be in (0, 1], got {}",
                t.learning_rate_gamma
            )));
        }
        if t.learning_rate_decay_period == 0 {
            return Err(SignError::config("learning_rate_decay_period must be at least 1"));
        }
        let split = t.train_set.val_split;
        if !(split > 0.0 && split < 1.0) {
            return Err(SignError::config(format!("train_set.val_split must be in (0, 1), got {split}")));
        }
        if t.train_set.path.is_empty() || self.test.test_set.path.is_empty() {
            return Err(SignError::config("dataset paths must not be empty"));
        }

        self.augmentation.validate()
    }
}
