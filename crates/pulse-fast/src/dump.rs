//! Annotated-frame dump: writes each processed frame to a PNG so a capture
//! session can be replayed and inspected offline.

use std::path::PathBuf;

use pulse_fast_types::{PulseError, RgbFrame};

use crate::annotate::annotate_frame;
use crate::session::FrameAnnotation;

pub struct FrameDump {
    directory: PathBuf,
    next_index: u64,
}

impl FrameDump {
    pub fn new(directory: PathBuf) -> Result<Self, PulseError> {
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            next_index: 0,
        })
    }

    /// Annotate the frame and write it out as `frame_NNNNN.png`.
    pub fn push(&mut self, frame: &RgbFrame, annotation: &FrameAnnotation) -> Result<(), PulseError> {
        let pixels = packed_rgb(frame, annotate_frame(frame, annotation));
        let image =
            image::RgbImage::from_raw(frame.width(), frame.height(), pixels).ok_or_else(|| {
                PulseError::InvalidFrame {
                    reason: "frame dimensions do not match its pixel buffer".to_string(),
                }
            })?;
        let path = self.directory.join(format!("frame_{:05}.png", self.next_index));
        image
            .save(&path)
            .map_err(|err| PulseError::Io(std::io::Error::other(err.to_string())))?;
        self.next_index += 1;
        Ok(())
    }
}

/// Drop any row padding; the encoder expects rows of exactly `width * 3`.
fn packed_rgb(frame: &RgbFrame, pixels: Vec<u8>) -> Vec<u8> {
    let row = frame.width() as usize * 3;
    if frame.stride() == row {
        return pixels;
    }
    let mut packed = Vec::with_capacity(row * frame.height() as usize);
    for y in 0..frame.height() as usize {
        let start = y * frame.stride();
        packed.extend_from_slice(&pixels[start..start + row]);
    }
    packed
}
