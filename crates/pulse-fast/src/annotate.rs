//! Display annotation: rectangle overlays for the detected face and the
//! sampled region. Pure pixel work on a copy so the measurement path never
//! sees mutated frames.

use pulse_fast_types::{FaceRect, RgbFrame};

use crate::session::FrameAnnotation;

const FACE_LIVE: [u8; 3] = [0, 200, 0];
const FACE_WAITING: [u8; 3] = [220, 40, 40];
const ROI_COLOR: [u8; 3] = [240, 240, 240];
const BORDER: u32 = 2;

/// Render the annotation onto a copy of the frame's RGB data.
///
/// The face box is green once liveness is confirmed and red while the gate
/// is still waiting for a blink; the sampled region is outlined in white.
pub fn annotate_frame(frame: &RgbFrame, annotation: &FrameAnnotation) -> Vec<u8> {
    let mut pixels = frame.data().to_vec();
    if let Some(face) = annotation.face {
        let color = if annotation.live {
            FACE_LIVE
        } else {
            FACE_WAITING
        };
        draw_rect(&mut pixels, frame, &face, color);
    }
    if let Some(roi) = annotation.roi {
        draw_rect(&mut pixels, frame, &roi, ROI_COLOR);
    }
    pixels
}

fn draw_rect(pixels: &mut [u8], frame: &RgbFrame, rect: &FaceRect, color: [u8; 3]) {
    let x_end = (rect.x + rect.width).min(frame.width());
    let y_end = (rect.y + rect.height).min(frame.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            let on_border = x < rect.x + BORDER
                || x + BORDER >= x_end
                || y < rect.y + BORDER
                || y + BORDER >= y_end;
            if !on_border {
                continue;
            }
            let offset = y as usize * frame.stride() + x as usize * 3;
            pixels[offset..offset + 3].copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gray_frame() -> RgbFrame {
        RgbFrame::from_owned(
            32,
            32,
            96,
            Some(Duration::ZERO),
            vec![100; 32 * 32 * 3],
        )
        .unwrap()
    }

    fn pixel_at(pixels: &[u8], frame: &RgbFrame, x: u32, y: u32) -> [u8; 3] {
        let offset = y as usize * frame.stride() + x as usize * 3;
        [pixels[offset], pixels[offset + 1], pixels[offset + 2]]
    }

    #[test]
    fn no_annotation_leaves_the_frame_untouched() {
        let frame = gray_frame();
        let pixels = annotate_frame(&frame, &FrameAnnotation::default());
        assert_eq!(pixels, frame.data());
    }

    #[test]
    fn face_border_color_tracks_liveness() {
        let frame = gray_frame();
        let face = FaceRect::new(4, 4, 16, 16);

        let waiting = annotate_frame(
            &frame,
            &FrameAnnotation {
                face: Some(face),
                roi: None,
                live: false,
            },
        );
        assert_eq!(pixel_at(&waiting, &frame, 4, 4), FACE_WAITING);

        let live = annotate_frame(
            &frame,
            &FrameAnnotation {
                face: Some(face),
                roi: None,
                live: true,
            },
        );
        assert_eq!(pixel_at(&live, &frame, 4, 4), FACE_LIVE);
        // Interior stays untouched.
        assert_eq!(pixel_at(&live, &frame, 12, 12), [100, 100, 100]);
    }

    #[test]
    fn roi_outline_is_drawn_over_the_face_box() {
        let frame = gray_frame();
        let annotation = FrameAnnotation {
            face: Some(FaceRect::new(2, 2, 24, 24)),
            roi: Some(FaceRect::new(8, 6, 12, 6)),
            live: true,
        };
        let pixels = annotate_frame(&frame, &annotation);
        assert_eq!(pixel_at(&pixels, &frame, 8, 6), ROI_COLOR);
    }
}
