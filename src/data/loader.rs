// ============================================================
// Layer 4 — CSV Sample Loader
// ============================================================
// Reads the Sign Language MNIST CSV format:
//
//   label,pixel1,pixel2,...,pixel784      ← header, skipped
//   3,107,118,127,...                     ← one image per row
//
// Each row becomes a Sample:
//   - 784 integer intensities 0..=255 → 28×28 Image in [0, 1]
//   - label validated against the 24 classes present in the data
//
// Any bad row aborts the whole load; a partially loaded split
// would silently skew every metric computed on it.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::error::{SignError, SignResult};
use crate::domain::sample::{Image, Label, Sample, PIXEL_COUNT};
use crate::domain::traits::SampleSource;

/// Loads all samples from one CSV file.
/// Implements the SampleSource trait from Layer 3.
pub struct CsvSampleLoader {
    path: PathBuf,
}

impl CsvSampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for CsvSampleLoader {
    fn load_all(&self) -> SignResult<Vec<Sample>> {
        let file = File::open(&self.path).map_err(|e| SignError::io(&self.path, e))?;

        let samples = read_samples(&self.path, file)?;
        tracing::info!(
            "Loaded {} samples from '{}'",
            samples.len(),
            self.path.display()
        );
        Ok(samples)
    }
}

/// Parse an in-memory file body. `path` is only used for diagnostics.
pub fn parse_csv(path: &Path, text: &str) -> SignResult<Vec<Sample>> {
    read_samples(path, text.as_bytes())
}

fn read_samples<R: Read>(path: &Path, input: R) -> SignResult<Vec<Sample>> {
    // flexible: the row length check below reports the line itself
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let header = rdr
        .headers()
        .map_err(|e| SignError::data_format(path, e.to_string()))?;
    if header.is_empty() {
        return Err(SignError::data_format(path, "file is empty, expected a header row"));
    }

    let mut samples = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| SignError::data_format(path, e.to_string()))?;
        let line = record.position().map_or(0, |p| p.line());
        let sample = parse_record(&record)
            .map_err(|reason| SignError::data_format(path, format!("line {line}: {reason}")))?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Parse one `label,pixel1..pixel784` record.
fn parse_record(record: &StringRecord) -> Result<Sample, String> {
    if record.len() != PIXEL_COUNT + 1 {
        return Err(format!(
            "expected {} pixel values, found {}",
            PIXEL_COUNT,
            record.len().saturating_sub(1)
        ));
    }

    let raw_label = &record[0];
    let label_id: i64 = raw_label
        .parse()
        .map_err(|_| format!("label '{raw_label}' is not an integer"))?;
    let label = Label::from_dataset(label_id)
        .ok_or_else(|| format!("label {label_id} is not a valid class"))?;

    let pixels = record
        .iter()
        .skip(1)
        .map(|f| {
            f.parse::<u8>()
                .map_err(|_| format!("pixel value '{f}' is not in 0..=255"))
        })
        .collect::<Result<Vec<u8>, String>>()?;

    let image = Image::from_bytes(&pixels).ok_or("pixel count mismatch")?;
    Ok(Sample::new(image, label))
}
