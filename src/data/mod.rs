// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw CSV / image files to tensor batches.
//
//   train.csv / test.csv
//       │
//       ▼
//   CsvSampleLoader    → parses rows into Samples
//       │
//       ▼
//   split_train_val    → seeded train / validation split
//       │
//       ▼
//   AugmentedDataset   → Burn Dataset, random augmentation per item
//       │
//       ▼
//   SignBatcher        → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Validation and test splits skip the Dataset / DataLoader
// stages: the evaluator batches them in order itself.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads Sign Language MNIST CSV files
pub mod loader;

/// Random training transforms and the deterministic eval transform
pub mod augment;

/// Implements Burn's Dataset trait for samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
