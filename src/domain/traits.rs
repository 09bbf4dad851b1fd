// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, not to the
// concrete CSV reader or CSV metrics file, so both can be
// replaced (and faked in tests) without touching the use cases.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::SignResult;
use crate::domain::sample::Sample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled samples.
///
/// Implementations:
///   - CsvSampleLoader → Sign Language MNIST CSV files
pub trait SampleSource {
    /// Load every sample, in file order.
    fn load_all(&self) -> SignResult<Vec<Sample>>;
}

// ─── MetricsSink ──────────────────────────────────────────────────────────────
/// Receives scalar training metrics as (name, value, step) triples.
///
/// Implementations:
///   - CsvMetricsSink → appends rows to scalars.csv
pub trait MetricsSink {
    fn record(&mut self, name: &str, value: f64, step: usize) -> SignResult<()>;
}
