//! Face/eye detection capability, region selection, and the blink liveness
//! gate for the pulse-fast pipeline.
//!
//! Detection sits behind the narrow [`FaceDetector`] trait so the blink
//! heuristic and the acquisition path never depend on a concrete vision
//! backend; the scripted detector drives tests and mock runs, and the
//! `detector-rustface` feature adds a SeetaFace-based backend for real
//! camera input.

pub mod detection;
pub mod liveness;
pub mod roi;
pub mod scripted;

#[cfg(feature = "detector-rustface")]
pub mod rustface;

pub use detection::{
    build_detector, DetectorConfig, DetectorError, DetectorKind, FaceDetector,
};
pub use liveness::{BlinkGate, LivenessState};
pub use roi::RegionSelector;
pub use scripted::{BlinkWindow, ScriptedDetector};
