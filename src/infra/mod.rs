// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence used by more than one command:
//
//   checkpoint.rs — best-model weights + JSON metadata.
//                   Written by the trainer, read back by the
//                   evaluate and infer commands.
//
//   metrics.rs    — per-epoch scalars appended to a CSV file
//                   for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
