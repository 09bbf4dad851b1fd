// ============================================================
// Layer 4 — Burn Datasets
// ============================================================
// The training split as a Burn Dataset, with the augmentation
// pipeline applied inside `get`.
//
// AugmentedDataset seeds a fresh RNG per item from
// (seed, epoch, index). The output therefore does not depend
// on which worker thread fetches the item or in what order,
// and still changes from one epoch to the next. The trainer
// advances the epoch through the shared EpochCounter.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, SeedableRng};

use crate::data::augment::Augmenter;
use crate::domain::sample::Sample;

/// Shared handle to the current epoch number.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter(Arc<AtomicUsize>);

impl EpochCounter {
    pub fn set(&self, epoch: usize) {
        self.0.store(epoch, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct AugmentedDataset {
    samples:   Vec<Sample>,
    augmenter: Augmenter,
    seed:      u64,
    epoch:     EpochCounter,
}

impl AugmentedDataset {
    pub fn new(samples: Vec<Sample>, augmenter: Augmenter, seed: u64) -> Self {
        Self { samples, augmenter, seed, epoch: EpochCounter::default() }
    }

    /// Handle used by the trainer to advance the epoch.
    pub fn epoch_counter(&self) -> EpochCounter {
        self.epoch.clone()
    }

    /// RNG seed built from the bytes of (seed, epoch, index).
    fn item_seed(&self, index: usize) -> <StdRng as SeedableRng>::Seed {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&(self.epoch.get() as u64).to_le_bytes());
        bytes[16..24].copy_from_slice(&(index as u64).to_le_bytes());
        bytes
    }
}

impl Dataset<Sample> for AugmentedDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        let sample = self.samples.get(index)?;
        let mut rng = StdRng::from_seed(self.item_seed(index));
        Some(self.augmenter.apply_sample(sample, &mut rng))
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
