use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use pulse_fast_types::{FaceRect, RgbFrame};

/// The face/eye detection capability consumed by the pipeline.
///
/// No ordering guarantee on multiple faces; the pipeline uses the first.
/// `detect_eyes` looks only within the given face rectangle.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, frame: &RgbFrame) -> Vec<FaceRect>;

    fn detect_eyes(&self, frame: &RgbFrame, face: &FaceRect) -> Vec<FaceRect>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Scripted,
    Rustface,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Scripted => "scripted",
            DetectorKind::Rustface => "rustface",
        }
    }
}

impl FromStr for DetectorKind {
    type Err = DetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scripted" => Ok(DetectorKind::Scripted),
            "rustface" => Ok(DetectorKind::Rustface),
            other => Err(DetectorError::configuration(format!(
                "unknown detector '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// Script for the scripted detector; `None` means a centered default.
    pub script: Option<crate::scripted::ScriptedDetector>,
    /// SeetaFace model path for the rustface detector.
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector {kind} is not supported in this build")]
    Unsupported { kind: &'static str },

    #[error("detector configuration error: {message}")]
    Configuration { message: String },

    #[error("detector backend failed: {message}")]
    Backend { message: String },
}

impl DetectorError {
    pub fn unsupported(kind: &'static str) -> Self {
        Self::Unsupported { kind }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

pub fn build_detector(
    kind: DetectorKind,
    config: DetectorConfig,
) -> Result<Box<dyn FaceDetector>, DetectorError> {
    match kind {
        DetectorKind::Scripted => {
            let detector = config.script.unwrap_or_default();
            Ok(Box::new(detector))
        }
        DetectorKind::Rustface => {
            #[cfg(feature = "detector-rustface")]
            {
                let path = config.model_path.ok_or_else(|| {
                    DetectorError::configuration(
                        "rustface detector requires a SeetaFace model path",
                    )
                })?;
                Ok(Box::new(crate::rustface::RustfaceDetector::from_model_path(
                    &path,
                )?))
            }
            #[cfg(not(feature = "detector-rustface"))]
            {
                Err(DetectorError::unsupported("rustface"))
            }
        }
    }
}
