// ============================================================
// Layer 5 — Sampled Softmax
// ============================================================
// Scoring all V classes for every position is the dominant cost
// of training a language model with a large vocabulary. Sampled
// softmax instead scores, per position:
//
//   - the true class, and
//   - a shared set of S negative classes drawn once per batch
//
// and computes a softmax over those 1 + S logits only.
//
// Negatives come from a log-uniform (Zipfian) distribution over
// class ids, which matches vocabularies sorted by frequency:
//
//   P(c) = ln((c + 2) / (c + 1)) / ln(V + 1)
//
// Classes are drawn without replacement. Each logit is corrected
// by subtracting ln(expected count) so the estimate stays close
// to the full softmax, and a sampled class equal to the row's
// true class ("accidental hit") is masked out of that row.
//
// When S >= V every class is a candidate, every expected count
// is 1, and the loss equals the full softmax cross-entropy.
//
// Reference: Jean et al. (2015) On Using Very Large Target Vocabulary
//            for Neural Machine Translation

use burn::{prelude::*, tensor::activation::log_softmax};
use rand::Rng;
use std::collections::HashSet;

/// Added to the logit of an accidental hit; large enough that its
/// softmax weight underflows to zero.
const ACCIDENTAL_HIT_PENALTY: f32 = -1e9;

/// Negative classes drawn for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCandidates {
    /// Distinct class ids
    pub ids:       Vec<u32>,
    /// Draws made before `ids` filled up (≥ ids.len())
    pub num_tries: usize,
}

#[derive(Debug, Clone)]
pub struct LogUniformSampler {
    range:     usize,
    log_range: f64,
}

impl LogUniformSampler {
    pub fn new(range: usize) -> Self {
        Self { range, log_range: ((range + 1) as f64).ln() }
    }

    /// Probability of drawing `class` in a single try.
    pub fn probability(&self, class: u32) -> f64 {
        let c = class as f64;
        ((c + 2.0) / (c + 1.0)).ln() / self.log_range
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> u32 {
        let u: f64 = rng.gen();
        let value = ((u * self.log_range).exp() - 1.0).floor() as usize;
        value.min(self.range - 1) as u32
    }

    /// Draw `n` distinct classes. Asking for the whole range (or more)
    /// returns every class without drawing.
    pub fn sample_unique<R: Rng>(&self, n: usize, rng: &mut R) -> SampledCandidates {
        if n >= self.range {
            return SampledCandidates {
                ids:       (0..self.range as u32).collect(),
                num_tries: self.range,
            };
        }

        let mut seen = HashSet::with_capacity(n);
        let mut ids  = Vec::with_capacity(n);
        let mut num_tries = 0usize;
        while ids.len() < n {
            let class = self.draw(rng);
            num_tries += 1;
            if seen.insert(class) {
                ids.push(class);
            }
        }
        SampledCandidates { ids, num_tries }
    }

    /// Expected number of times `class` appears among `candidates`' tries:
    /// 1 - (1 - P(c))^tries, or exactly 1 when the whole range was taken.
    pub fn expected_count(&self, class: u32, candidates: &SampledCandidates) -> f64 {
        if candidates.ids.len() >= self.range {
            return 1.0;
        }
        let p = self.probability(class);
        -((candidates.num_tries as f64) * (-p).ln_1p()).exp_m1()
    }
}

/// Per-position sampled softmax loss.
///
/// * `w_out`  - [H, V] output projection
/// * `b_out`  - [V] output bias
/// * `inputs` - [N, H] hidden states, one row per position
/// * `labels` - N true class ids
///
/// Returns the N per-position losses.
pub fn sampled_softmax_loss<B: Backend>(
    w_out:      Tensor<B, 2>,
    b_out:      Tensor<B, 1>,
    inputs:     Tensor<B, 2>,
    labels:     &[u32],
    candidates: &SampledCandidates,
    sampler:    &LogUniformSampler,
) -> Tensor<B, 1> {
    let device = inputs.device();
    let n = labels.len();
    let s = candidates.ids.len();

    // ── True-class logits [N, 1] ──────────────────────────────────────────────
    let label_ids: Vec<i32> = labels.iter().map(|&c| c as i32).collect();
    let label_idx = Tensor::<B, 1, Int>::from_ints(label_ids.as_slice(), &device);

    let true_w = w_out.clone().select(1, label_idx.clone()).transpose();  // [N, H]
    let true_b = b_out.clone().select(0, label_idx).reshape([n, 1]);
    let true_logq: Vec<f32> = labels
        .iter()
        .map(|&c| sampler.expected_count(c, candidates).ln() as f32)
        .collect();
    let true_logq = Tensor::<B, 1>::from_floats(true_logq.as_slice(), &device).reshape([n, 1]);

    let true_logits = (inputs.clone() * true_w).sum_dim(1) + true_b - true_logq;

    // ── Sampled-class logits [N, S] ───────────────────────────────────────────
    let sampled: Vec<i32> = candidates.ids.iter().map(|&c| c as i32).collect();
    let sampled_idx = Tensor::<B, 1, Int>::from_ints(sampled.as_slice(), &device);

    let sampled_w = w_out.select(1, sampled_idx.clone());                 // [H, S]
    let sampled_b = b_out.select(0, sampled_idx).reshape([1, s]);
    let sampled_logq: Vec<f32> = candidates.ids
        .iter()
        .map(|&c| sampler.expected_count(c, candidates).ln() as f32)
        .collect();
    let sampled_logq = Tensor::<B, 1>::from_floats(sampled_logq.as_slice(), &device).reshape([1, s]);

    let hits: Vec<f32> = labels
        .iter()
        .flat_map(|&label| {
            candidates.ids
                .iter()
                .map(move |&c| if c == label { ACCIDENTAL_HIT_PENALTY } else { 0.0 })
        })
        .collect();
    let hits = Tensor::<B, 1>::from_floats(hits.as_slice(), &device).reshape([n, s]);

    let sampled_logits = inputs.matmul(sampled_w) + sampled_b - sampled_logq + hits;

    // ── Softmax over [true | sampled], true class at column 0 ─────────────────
    let logits = Tensor::cat(vec![true_logits, sampled_logits], 1);
    log_softmax(logits, 1)
        .slice([0..n, 0..1])
        .reshape([n])
        .neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::loss::CrossEntropyLossConfig;
    use burn::tensor::Distribution;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray;

    #[test]
    fn test_probabilities_sum_to_one() {
        let sampler = LogUniformSampler::new(1000);
        let total: f64 = (0..1000).map(|c| sampler.probability(c)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // Frequent (low) ids are more likely than rare ones
        assert!(sampler.probability(0) > sampler.probability(999));
    }

    #[test]
    fn test_sample_unique_is_distinct_and_in_range() {
        let sampler = LogUniformSampler::new(500);
        let mut rng = StdRng::seed_from_u64(7);
        let cands   = sampler.sample_unique(50, &mut rng);

        assert_eq!(cands.ids.len(), 50);
        assert!(cands.num_tries >= 50);
        let distinct: HashSet<u32> = cands.ids.iter().copied().collect();
        assert_eq!(distinct.len(), 50);
        assert!(cands.ids.iter().all(|&c| (c as usize) < 500));
    }

    #[test]
    fn test_full_range_request_takes_every_class() {
        let sampler = LogUniformSampler::new(10);
        let mut rng = StdRng::seed_from_u64(1);
        let cands   = sampler.sample_unique(200, &mut rng);
        assert_eq!(cands.ids, (0..10).collect::<Vec<u32>>());
        assert_eq!(sampler.expected_count(3, &cands), 1.0);
    }

    #[test]
    fn test_expected_count_grows_with_tries() {
        let sampler = LogUniformSampler::new(100);
        let few  = SampledCandidates { ids: vec![0; 5], num_tries: 5 };
        let many = SampledCandidates { ids: vec![0; 5], num_tries: 50 };
        let e_few  = sampler.expected_count(10, &few);
        let e_many = sampler.expected_count(10, &many);
        assert!(e_few > 0.0 && e_few < e_many && e_many <= 1.0);
    }

    #[test]
    fn test_matches_full_softmax_when_every_class_is_sampled() {
        let device = Default::default();
        let (h, v, n) = (4, 6, 5);
        let w = Tensor::<TestBackend, 2>::random([h, v], Distribution::Uniform(-1.0, 1.0), &device);
        let b = Tensor::<TestBackend, 1>::random([v], Distribution::Uniform(-0.5, 0.5), &device);
        let x = Tensor::<TestBackend, 2>::random([n, h], Distribution::Uniform(-1.0, 1.0), &device);
        let labels = [0u32, 5, 2, 2, 3];

        let sampler = LogUniformSampler::new(v);
        let cands   = sampler.sample_unique(v, &mut StdRng::seed_from_u64(0));
        let sampled: f64 = sampled_softmax_loss(w.clone(), b.clone(), x.clone(), &labels, &cands, &sampler)
            .mean()
            .into_scalar()
            .elem::<f64>();

        let logits  = x.matmul(w) + b.reshape([1, v]);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0i32, 5, 2, 2, 3].as_slice(), &device);
        let full: f64 = CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits, targets)
            .into_scalar()
            .elem::<f64>();

        assert!((sampled - full).abs() < 1e-4, "sampled={sampled} full={full}");
    }

    #[test]
    fn test_loss_is_positive_per_position() {
        let device = Default::default();
        let sampler = LogUniformSampler::new(50);
        let cands   = sampler.sample_unique(8, &mut StdRng::seed_from_u64(3));
        let w = Tensor::<TestBackend, 2>::random([3, 50], Distribution::Uniform(-1.0, 1.0), &device);
        let b = Tensor::<TestBackend, 1>::zeros([50], &device);
        let x = Tensor::<TestBackend, 2>::random([4, 3], Distribution::Uniform(-1.0, 1.0), &device);

        let losses: Vec<f32> = sampled_softmax_loss(w, b, x, &[1, 7, 49, 0], &cands, &sampler)
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(losses.len(), 4);
        assert!(losses.iter().all(|l| l.is_finite() && *l > 0.0));
    }
}
