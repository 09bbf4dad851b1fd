// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per command. Each reads the run configuration,
// asks the lower layers to do the work and reports back.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Errors carry context for the user via anyhow
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Run configuration read from a JSON file
pub mod config;

// The training workflow
pub mod train_use_case;

// Accuracy of a checkpoint on the test split
pub mod evaluate_use_case;

// Single-image prediction from a checkpoint
pub mod infer_use_case;
