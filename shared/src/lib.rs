//! Data models shared between the indicator engine and its front ends.
//!
//! `models` holds the plain serde types that cross the pipeline boundary;
//! `utils` holds calendar helpers used for timeframe bucketing.

pub mod models;
pub mod utils;
