// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on Autodiff<B>; evaluation and generation run on
// the plain backend B. Both choices share the same device types:
//
//   wgpu     — GPU through WebGPU (default)
//   ndarray  — CPU, no GPU required

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub type WgpuBackend    = burn::backend::Wgpu;
pub type NdArrayBackend = burn::backend::NdArray;

pub type WgpuTrainBackend    = burn::backend::Autodiff<WgpuBackend>;
pub type NdArrayTrainBackend = burn::backend::Autodiff<NdArrayBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Wgpu,
    Ndarray,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wgpu    => write!(f, "wgpu"),
            Self::Ndarray => write!(f, "ndarray"),
        }
    }
}
