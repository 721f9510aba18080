use pulse_fast_types::{FaceRect, RoiLayout};

/// Derives the signal ROI from a detected face rectangle by fixed
/// fractional offsets.
#[derive(Debug, Clone, Copy)]
pub struct RegionSelector {
    layout: RoiLayout,
}

impl RegionSelector {
    pub fn new(layout: RoiLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> RoiLayout {
        self.layout
    }

    /// ROI for `face`, clipped to the frame. `None` when the resulting
    /// rectangle is empty (degenerate face boxes near the frame edge).
    pub fn select(&self, face: &FaceRect, frame_width: u32, frame_height: u32) -> Option<FaceRect> {
        let roi = match self.layout {
            RoiLayout::Forehead => FaceRect::new(
                face.x + face.width / 4,
                face.y + face.height / 10,
                face.width / 2,
                (face.height / 4).saturating_sub(face.height / 10),
            ),
            RoiLayout::LowerFace => FaceRect::new(
                face.x,
                face.y + face.height / 2,
                face.width,
                face.height / 2,
            ),
        };
        if roi.is_empty() || roi.x >= frame_width || roi.y >= frame_height {
            return None;
        }
        let width = roi.width.min(frame_width - roi.x);
        let height = roi.height.min(frame_height - roi.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(FaceRect::new(roi.x, roi.y, width, height))
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(RoiLayout::Forehead)
    }
}
