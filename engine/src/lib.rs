// Engine library root
//
// `pipeline` and `indicators` form the pure core: daily bars in, resampled
// bars plus indicator columns out. `data`, `config` and `analysis` are the
// collaborators the `stock-dashboard` binary wires around it.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod pipeline;

pub use error::EngineError;
pub use pipeline::{compute_indicators, derive_batch, derive_series, resample};
