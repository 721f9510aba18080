//! Shared domain models for the pulse-fast workspace.
//!
//! This crate centralizes lightweight data structures used across the frame
//! source, detector, estimator, and CLI crates. Keep it backend-agnostic and
//! free of platform dependencies so every crate can depend on it without
//! pulling camera SDKs or heavy features.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub type PulseResult<T> = Result<T, PulseError>;

/// An interleaved RGB24 raster frame.
///
/// The pixel payload is shared via `Arc` so frames can be handed to the
/// display side channel without copying. `stride` is in bytes and must be at
/// least `width * 3`.
#[derive(Clone)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    stride: usize,
    frame_index: Option<u64>,
    timestamp: Option<Duration>,
    data: Arc<[u8]>,
}

impl fmt::Debug for RgbFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgbFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("timestamp", &self.timestamp)
            .field("bytes", &self.data.len())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

impl RgbFrame {
    pub fn from_owned(
        width: u32,
        height: u32,
        stride: usize,
        timestamp: Option<Duration>,
        data: Vec<u8>,
    ) -> PulseResult<Self> {
        if stride < width as usize * 3 {
            return Err(PulseError::InvalidFrame {
                reason: format!("stride {} shorter than row of {} RGB pixels", stride, width),
            });
        }
        let required =
            stride
                .checked_mul(height as usize)
                .ok_or_else(|| PulseError::InvalidFrame {
                    reason: "calculated frame length overflowed".into(),
                })?;
        if data.len() < required {
            return Err(PulseError::InvalidFrame {
                reason: format!(
                    "insufficient frame bytes: got {} expected at least {}",
                    data.len(),
                    required
                ),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            timestamp,
            data: Arc::from(data.into_boxed_slice()),
            frame_index: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn timestamp(&self) -> Option<Duration> {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn with_frame_index(mut self, index: Option<u64>) -> Self {
        self.frame_index = index;
        self
    }

    /// Arithmetic mean of the red, green, and blue channels over `rect`
    /// clipped to the frame. `None` when the clipped region is empty.
    pub fn mean_rgb(&self, rect: &FaceRect) -> Option<[f64; 3]> {
        let x_end = rect.x.saturating_add(rect.width).min(self.width);
        let y_end = rect.y.saturating_add(rect.height).min(self.height);
        if rect.x >= x_end || rect.y >= y_end {
            return None;
        }
        let mut sums = [0.0f64; 3];
        for y in rect.y..y_end {
            let row = y as usize * self.stride;
            for x in rect.x..x_end {
                let offset = row + x as usize * 3;
                sums[0] += self.data[offset] as f64;
                sums[1] += self.data[offset + 1] as f64;
                sums[2] += self.data[offset + 2] as f64;
            }
        }
        let count = ((x_end - rect.x) as u64 * (y_end - rect.y) as u64) as f64;
        Some([sums[0] / count, sums[1] / count, sums[2] / count])
    }

    /// Luma (BT.601) copy of the frame, used by detectors that want grayscale.
    pub fn to_luma(&self) -> Vec<u8> {
        let mut luma = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            let row = y as usize * self.stride;
            for x in 0..self.width {
                let offset = row + x as usize * 3;
                let value = 0.299 * self.data[offset] as f32
                    + 0.587 * self.data[offset + 1] as f32
                    + 0.114 * self.data[offset + 2] as f32;
                luma.push(value as u8);
            }
        }
        luma
    }
}

/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Which sub-rectangle of the face feeds the signal buffer.
///
/// The forehead band is the default; the lower half-face convention is kept
/// selectable but must not be mixed within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoiLayout {
    #[default]
    Forehead,
    LowerFace,
}

impl RoiLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoiLayout::Forehead => "forehead",
            RoiLayout::LowerFace => "lower-face",
        }
    }
}

impl std::str::FromStr for RoiLayout {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forehead" => Ok(RoiLayout::Forehead),
            "lower-face" | "lowerface" | "lower_face" => Ok(RoiLayout::LowerFace),
            other => Err(PulseError::configuration(format!(
                "unknown ROI layout '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RoiLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean channel intensities over the ROI at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the start of the stream.
    pub timestamp: f64,
    pub green: f64,
    pub red: f64,
    pub blue: f64,
}

impl Sample {
    pub fn new(timestamp: f64, rgb: [f64; 3]) -> Self {
        Self {
            timestamp,
            red: rgb[0],
            green: rgb[1],
            blue: rgb[2],
        }
    }
}

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("backend {backend} is not supported in this build")]
    Unsupported { backend: &'static str },

    #[error("{backend} backend failed: {message}")]
    BackendFailure {
        backend: &'static str,
        message: String,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("frame source unavailable: {message}")]
    ResourceUnavailable { message: String },

    #[error("insufficient samples for estimation: got {got}, need {needed}")]
    InsufficientSamples { got: usize, needed: usize },

    #[error("estimated heart rate {bpm:.1} BPM is outside the plausible range")]
    HeartRateOutOfRange { bpm: f64 },

    #[error("no spectral peak found in the heart-rate band")]
    NoSpectralPeak,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PulseError {
    pub fn unsupported(backend: &'static str) -> Self {
        Self::Unsupported { backend }
    }

    pub fn backend_failure(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendFailure {
            backend,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn resource_unavailable(message: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            message: message.into(),
        }
    }
}

/// The structured result handed back to the caller of `stop_measurement`.
///
/// Serializes to the `{"status": ...}` wire shape the presentation layer
/// consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MeasurementOutcome {
    Success {
        heart_rate: f64,
        category: String,
        description: String,
        recommendations: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl MeasurementOutcome {
    pub fn failure(err: &PulseError) -> Self {
        MeasurementOutcome::Error {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MeasurementOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_owned_rejects_short_buffers() {
        let err = RgbFrame::from_owned(4, 4, 12, None, vec![0; 10]);
        assert!(matches!(err, Err(PulseError::InvalidFrame { .. })));
    }

    #[test]
    fn from_owned_rejects_narrow_stride() {
        let err = RgbFrame::from_owned(4, 1, 8, None, vec![0; 8]);
        assert!(matches!(err, Err(PulseError::InvalidFrame { .. })));
    }

    #[test]
    fn mean_rgb_over_uniform_region() {
        let mut data = vec![0u8; 4 * 4 * 3];
        for pixel in data.chunks_mut(3) {
            pixel[0] = 10;
            pixel[1] = 20;
            pixel[2] = 30;
        }
        let frame = RgbFrame::from_owned(4, 4, 12, None, data).unwrap();
        let mean = frame.mean_rgb(&FaceRect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(mean, [10.0, 20.0, 30.0]);
    }

    #[test]
    fn mean_rgb_clips_to_frame() {
        let frame = RgbFrame::from_owned(2, 2, 6, None, vec![100; 12]).unwrap();
        let mean = frame.mean_rgb(&FaceRect::new(1, 1, 10, 10)).unwrap();
        assert_eq!(mean, [100.0, 100.0, 100.0]);
        assert!(frame.mean_rgb(&FaceRect::new(5, 5, 2, 2)).is_none());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = MeasurementOutcome::Error {
            message: "oops".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "oops");
    }

    #[test]
    fn roi_layout_round_trips() {
        assert_eq!("forehead".parse::<RoiLayout>().unwrap(), RoiLayout::Forehead);
        assert_eq!(
            "lower-face".parse::<RoiLayout>().unwrap(),
            RoiLayout::LowerFace
        );
        assert!("sideways".parse::<RoiLayout>().is_err());
    }
}
