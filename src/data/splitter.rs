// ============================================================
// Layer 4 — Train/Dev Splitter
// ============================================================
// Shuffles sentences with a seeded Fisher-Yates shuffle and
// splits them into a training set and a held-out dev set.
//
// Shuffling happens at sentence level, so the id stream built
// from each side is still made of whole sentences. The seed makes
// the split (and therefore the dev perplexity) reproducible.
//
// Reference: rand crate documentation (SliceRandom, StdRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, dev).
///
/// `train_fraction` is clamped to [0, 1]; e.g. 0.9 keeps 90% for training.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = (((total as f64) * fraction).round() as usize).min(total);

    let dev = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} dev",
        samples.len(),
        dev.len(),
    );

    (samples, dev)
}
