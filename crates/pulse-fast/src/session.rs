//! Measurement session state: liveness gating, region sampling, and the
//! buffered trace that estimation consumes.

use std::sync::Arc;

use pulse_fast_detector::{BlinkGate, FaceDetector, RegionSelector};
use pulse_fast_estimator::{classify, estimate, EstimatorConfig};
use pulse_fast_types::{FaceRect, MeasurementOutcome, PulseError, RgbFrame, Sample};

/// What a processed frame looked like, for display annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAnnotation {
    pub face: Option<FaceRect>,
    pub roi: Option<FaceRect>,
    /// Whether the blink gate had confirmed liveness when this frame was
    /// processed.
    pub live: bool,
}

pub struct MeasurementSession {
    detector: Arc<dyn FaceDetector>,
    selector: RegionSelector,
    estimator: EstimatorConfig,
    gate: BlinkGate,
    samples: Vec<Sample>,
    last_timestamp: Option<f64>,
    active: bool,
}

impl MeasurementSession {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        selector: RegionSelector,
        estimator: EstimatorConfig,
    ) -> Self {
        Self {
            detector,
            selector,
            estimator,
            gate: BlinkGate::new(),
            samples: Vec::new(),
            last_timestamp: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_live(&self) -> bool {
        self.gate.is_confirmed()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Begin (or restart) a measurement. Clears any buffered trace and
    /// re-arms the liveness gate; calling this on an active session starts
    /// it over.
    pub fn start(&mut self) {
        self.samples.clear();
        self.last_timestamp = None;
        self.gate.reset();
        self.active = true;
    }

    /// Feed one frame through the detection, liveness, and sampling path.
    ///
    /// Frames without a timestamp cannot be ordered against the trace and
    /// are skipped. Frames on an inactive session are ignored.
    pub fn process_frame(&mut self, frame: &RgbFrame) -> FrameAnnotation {
        if !self.active {
            return FrameAnnotation::default();
        }
        let Some(timestamp) = frame.timestamp() else {
            return FrameAnnotation {
                live: self.gate.is_confirmed(),
                ..FrameAnnotation::default()
            };
        };
        let now_secs = timestamp.as_secs_f64();

        let faces = self.detector.detect_faces(frame);
        let Some(face) = faces.first().copied() else {
            // No face: the gate holds its state.
            return FrameAnnotation {
                live: self.gate.is_confirmed(),
                ..FrameAnnotation::default()
            };
        };

        let eyes = self.detector.detect_eyes(frame, &face);
        self.gate.observe(!eyes.is_empty(), now_secs);

        let mut annotation = FrameAnnotation {
            face: Some(face),
            roi: None,
            live: self.gate.is_confirmed(),
        };
        if !annotation.live {
            return annotation;
        }

        let Some(roi) = self.selector.select(&face, frame.width(), frame.height()) else {
            return annotation;
        };
        annotation.roi = Some(roi);

        if let Some(rgb) = frame.mean_rgb(&roi) {
            // Duplicate or out-of-order timestamps would corrupt the
            // sample-rate estimate.
            if self.last_timestamp.map_or(true, |last| now_secs > last) {
                self.samples.push(Sample::new(now_secs, rgb));
                self.last_timestamp = Some(now_secs);
            }
        }
        annotation
    }

    /// End the measurement and estimate from whatever was collected.
    ///
    /// The buffer is consumed either way; a second stop reports an
    /// insufficient-sample error rather than a stale result.
    pub fn stop(&mut self) -> MeasurementOutcome {
        self.active = false;
        let samples = std::mem::take(&mut self.samples);
        self.last_timestamp = None;

        match self.estimate_from(&samples) {
            Ok(outcome) => outcome,
            Err(err) => MeasurementOutcome::failure(&err),
        }
    }

    fn estimate_from(&self, samples: &[Sample]) -> Result<MeasurementOutcome, PulseError> {
        let bpm = estimate(samples, &self.estimator)?;
        let profile = classify(bpm);
        Ok(MeasurementOutcome::Success {
            heart_rate: bpm,
            category: profile.dosha.as_str().to_string(),
            description: profile.description,
            recommendations: profile.recommendations,
        })
    }
}
