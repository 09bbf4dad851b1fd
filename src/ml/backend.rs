// ============================================================
// Layer 5 — Backend selection
// ============================================================
// The compute backend is picked at compile time:
//
//   default           → Wgpu  (GPU through wgpu)
//   --features ndarray → NdArray (pure CPU)
//
// Training wraps the backend in Autodiff; validation, evaluation
// and inference run on the plain backend.

use burn::prelude::*;

#[cfg(not(feature = "ndarray"))]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(feature = "ndarray")]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub type InferDevice = <InferBackend as Backend>::Device;

pub fn default_device() -> InferDevice {
    InferDevice::default()
}
