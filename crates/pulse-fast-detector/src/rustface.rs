//! SeetaFace-based face detection (`detector-rustface` feature).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pulse_fast_types::{FaceRect, RgbFrame};

use crate::detection::{DetectorError, FaceDetector};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is loaded once; a detector instance is created per call because
/// `rustface` detectors are not `Sync` and the model itself is cheap to clone.
///
/// SeetaFace has no eye localizer, so `detect_eyes` falls back to a
/// darkness heuristic over the eye band of the face rectangle. It is good
/// enough to notice a blink (both eyes closed removes the dark pupil
/// regions) but makes no attempt at precise eye rectangles.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    pub fn from_model_path(path: &Path) -> Result<Self, DetectorError> {
        let file = File::open(path).map_err(|err| {
            DetectorError::configuration(format!(
                "cannot open SeetaFace model {}: {err}",
                path.display()
            ))
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|err| {
            DetectorError::configuration(format!(
                "cannot parse SeetaFace model {}: {err}",
                path.display()
            ))
        })?;
        Ok(Self { model })
    }

    fn detector(&self) -> Box<dyn rustface::Detector> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);
        detector
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect_faces(&self, frame: &RgbFrame) -> Vec<FaceRect> {
        let gray = frame.to_luma();
        let mut detector = self.detector();
        let faces = detector.detect(&rustface::ImageData::new(
            &gray,
            frame.width(),
            frame.height(),
        ));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                // SeetaFace can report boxes that start above or left of the
                // frame; clamp to frame coordinates.
                let x = bbox.x().max(0) as u32;
                let y = bbox.y().max(0) as u32;
                let width = bbox.width().min(frame.width().saturating_sub(x));
                let height = bbox.height().min(frame.height().saturating_sub(y));
                FaceRect::new(x, y, width, height)
            })
            .filter(|rect| rect.width > 0 && rect.height > 0)
            .collect()
    }

    fn detect_eyes(&self, frame: &RgbFrame, face: &FaceRect) -> Vec<FaceRect> {
        let gray = frame.to_luma();
        let band = eye_band(face);
        let face_mean = region_mean_luma(&gray, frame, face);

        let mut eyes = Vec::new();
        let half_width = band.width / 2;
        for side in 0..2u32 {
            let half = FaceRect::new(
                band.x + side * half_width,
                band.y,
                half_width,
                band.height,
            );
            if dark_fraction(&gray, frame, &half, face_mean) > 0.04 {
                eyes.push(half);
            }
        }
        eyes
    }
}

/// Horizontal band where eyes sit: roughly the second quarter of the face.
fn eye_band(face: &FaceRect) -> FaceRect {
    FaceRect::new(
        face.x + face.width / 8,
        face.y + face.height / 4,
        face.width - face.width / 4,
        face.height / 4,
    )
}

fn region_mean_luma(gray: &[u8], frame: &RgbFrame, rect: &FaceRect) -> f64 {
    let mut sum = 0u64;
    let mut count = 0u64;
    for_each_luma(gray, frame, rect, |value| {
        sum += u64::from(value);
        count += 1;
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Fraction of pixels in `rect` noticeably darker than the face mean.
/// Open eyes contribute pupil and lash pixels; closed lids are skin-toned.
fn dark_fraction(gray: &[u8], frame: &RgbFrame, rect: &FaceRect, face_mean: f64) -> f64 {
    let threshold = face_mean * 0.6;
    let mut dark = 0u64;
    let mut count = 0u64;
    for_each_luma(gray, frame, rect, |value| {
        if f64::from(value) < threshold {
            dark += 1;
        }
        count += 1;
    });
    if count == 0 {
        0.0
    } else {
        dark as f64 / count as f64
    }
}

fn for_each_luma(gray: &[u8], frame: &RgbFrame, rect: &FaceRect, mut visit: impl FnMut(u8)) {
    let x_end = (rect.x + rect.width).min(frame.width());
    let y_end = (rect.y + rect.height).min(frame.height());
    for y in rect.y..y_end {
        let row = y as usize * frame.width() as usize;
        for x in rect.x..x_end {
            visit(gray[row + x as usize]);
        }
    }
}
