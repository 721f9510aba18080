//! pulse-fast: camera-based heart-rate measurement with blink liveness
//! gating and an Ayurvedic constitutional read-out.

pub mod annotate;
pub mod cli;
pub mod dump;
pub mod pipeline;
pub mod session;
pub mod settings;

pub use pipeline::{run_measurement, PipelineOptions};
pub use session::{FrameAnnotation, MeasurementSession};
