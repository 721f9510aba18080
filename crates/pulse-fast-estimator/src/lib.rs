//! Heart-rate estimation from a buffered photoplethysmography signal.
//!
//! The pipeline hands this crate the timestamped green-channel means it
//! collected; estimation detrends and bandpass-filters the trace, then runs
//! two independent estimators (spectral peak and inter-beat intervals) and
//! averages them. A confident wrong number is worse than no number, so any
//! estimate outside the physiological range is rejected outright.

pub mod bandpass;
pub mod classify;
pub mod estimate;
pub mod peaks;
pub mod spectral;

pub use classify::{classify, Dosha, DoshaProfile};
pub use estimate::{estimate, EstimatorConfig};
