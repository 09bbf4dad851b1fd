// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// The dataset ships a training CSV and a test CSV only, so the
// validation set used for checkpoint selection is carved out
// of the training CSV:
//
//   1. optionally shuffle all indices with a seeded RNG
//   2. the first floor((1 - val_split) * n) go to training
//   3. the rest go to validation
//
// The RNG is seeded so the same config always produces the
// same split; otherwise the "best" checkpoint of two runs
// would be scored on different data.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Split `samples` into (train, validation).
///
/// # Arguments
/// * `samples`   - All available samples (consumed by this function)
/// * `val_split` - Proportion for validation, e.g. 0.25 = 25%
/// * `shuffle`   - Shuffle before splitting
/// * `seed`      - Seed for the shuffle
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    val_split:   f64,
    shuffle:     bool,
    seed:        u64,
) -> (Vec<T>, Vec<T>) {
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);
    }

    let total    = samples.len();
    let split_at = ((total as f64) * (1.0 - val_split)).floor() as usize;
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.25, true, 42);
        assert_eq!(train.len(), 75);
        assert_eq!(val.len(),   25);
    }

    #[test]
    fn test_train_size_is_floored() {
        // 0.75 * 10 = 7.5 → 7 training items
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 0.25, false, 0);
        assert_eq!(train, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(val,   vec![7, 8, 9]);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..50).collect::<Vec<usize>>(), 0.3, true, 7);
        let b = split_train_val((0..50).collect::<Vec<usize>>(), 0.3, true, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, true, 1);
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.25, true, 42);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
