// Cross-instrument analysis built on top of loaded series.
pub mod correlation;

pub use correlation::correlation_matrix;
