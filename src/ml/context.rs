// ============================================================
// Layer 5 — Graph Context
// ============================================================
// Every build stage takes this handle explicitly instead of
// reaching for an implicit global: it says which device the
// parameters live on and seeds the host-side random streams
// (candidate sampling, multinomial sampling).

use burn::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

/// Stream ids keep the random sources of different stages independent
/// even though they share one seed.
pub const CANDIDATE_STREAM: u64 = 0x5a;
pub const SAMPLER_STREAM:   u64 = 0xa5;

#[derive(Clone, Debug)]
pub struct GraphContext<B: Backend> {
    device: B::Device,
    seed:   u64,
}

impl<B: Backend> GraphContext<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// A deterministic generator for one named stream.
    pub fn rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ stream)
    }

    /// The same context on another backend sharing this device type,
    /// e.g. the inner backend of an autodiff backend.
    pub fn with_backend<B2: Backend<Device = B::Device>>(&self) -> GraphContext<B2> {
        GraphContext { device: self.device.clone(), seed: self.seed }
    }
}
