use pulse_fast_types::{FaceRect, RgbFrame};

use crate::detection::FaceDetector;

/// A half-open interval of eye closure, in stream seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkWindow {
    pub start: f64,
    pub duration: f64,
}

impl BlinkWindow {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.start + self.duration
    }
}

/// Deterministic detector driven by a blink schedule instead of pixels.
///
/// Always reports the configured face rectangle; reports eyes open except
/// during the scheduled blink windows, keyed on the frame timestamp. Frames
/// without a timestamp are treated as eyes-open. This is the replaceable
/// stand-in for a real vision capability that mock runs and tests use.
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    face: FaceRect,
    blinks: Vec<BlinkWindow>,
}

impl ScriptedDetector {
    pub fn new(face: FaceRect, blinks: Vec<BlinkWindow>) -> Self {
        Self { face, blinks }
    }

    pub fn face(&self) -> FaceRect {
        self.face
    }

    fn eyes_closed_at(&self, t: f64) -> bool {
        self.blinks.iter().any(|window| window.contains(t))
    }

    fn eye_rects(&self) -> Vec<FaceRect> {
        let eye_w = (self.face.width / 5).max(1);
        let eye_h = (self.face.height / 8).max(1);
        let eye_y = self.face.y + self.face.height / 4;
        vec![
            FaceRect::new(self.face.x + self.face.width / 5, eye_y, eye_w, eye_h),
            FaceRect::new(self.face.x + 3 * self.face.width / 5, eye_y, eye_w, eye_h),
        ]
    }
}

impl Default for ScriptedDetector {
    fn default() -> Self {
        Self {
            face: FaceRect::new(220, 120, 200, 200),
            blinks: Vec::new(),
        }
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect_faces(&self, _frame: &RgbFrame) -> Vec<FaceRect> {
        vec![self.face]
    }

    fn detect_eyes(&self, frame: &RgbFrame, _face: &FaceRect) -> Vec<FaceRect> {
        let closed = frame
            .timestamp()
            .map(|ts| self.eyes_closed_at(ts.as_secs_f64()))
            .unwrap_or(false);
        if closed {
            Vec::new()
        } else {
            self.eye_rects()
        }
    }
}
