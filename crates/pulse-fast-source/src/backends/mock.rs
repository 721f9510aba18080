use std::f64::consts::TAU;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::Sender;

use crate::core::{
    spawn_stream_from_channel, DynFrameSource, FrameSourceProvider, FrameStream, PulseResult,
    RgbFrame,
};
use pulse_fast_types::FaceRect;

/// Parameters of the synthetic scene the mock backend paints.
///
/// The scene is a flat background with a skin-toned face block whose green
/// channel oscillates at `pulse_bpm`, so the full sampling path can be
/// exercised against a known ground truth.
#[derive(Debug, Clone)]
pub struct MockSceneConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: usize,
    pub pulse_bpm: f64,
    pub face: FaceRect,
    /// Real-time pacing between frames; zero emits as fast as the channel
    /// accepts, which is what tests want.
    pub frame_interval: Duration,
}

impl Default for MockSceneConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30.0,
            frame_count: 300,
            pulse_bpm: 72.0,
            face: FaceRect::new(220, 120, 200, 200),
            frame_interval: Duration::ZERO,
        }
    }
}

pub struct MockProvider {
    scene: MockSceneConfig,
    channel_capacity: usize,
}

impl MockProvider {
    const DEFAULT_CHANNEL_CAPACITY: usize = 8;

    pub fn new(scene: MockSceneConfig, channel_capacity: Option<usize>) -> Self {
        Self {
            scene,
            channel_capacity: channel_capacity
                .unwrap_or(Self::DEFAULT_CHANNEL_CAPACITY)
                .max(1),
        }
    }

    fn emit_frames(&self, tx: Sender<PulseResult<RgbFrame>>) {
        let scene = &self.scene;
        let pulse_hz = scene.pulse_bpm / 60.0;
        for index in 0..scene.frame_count {
            if tx.is_closed() {
                break;
            }
            let t = index as f64 / scene.fps;
            let frame = render_scene(scene, t, pulse_hz)
                .map(|frame| frame.with_frame_index(Some(index as u64)));
            if tx.blocking_send(frame).is_err() {
                break;
            }
            if !scene.frame_interval.is_zero() {
                thread::sleep(scene.frame_interval);
            }
        }
    }
}

fn render_scene(scene: &MockSceneConfig, t: f64, pulse_hz: f64) -> PulseResult<RgbFrame> {
    let stride = scene.width as usize * 3;
    let mut data = vec![64u8; stride * scene.height as usize];

    // Pulsatile component plus a faint in-band harmonic standing in for noise.
    let green = 150.0 + 10.0 * (TAU * pulse_hz * t).sin() + 0.8 * (TAU * 3.3 * t).sin();
    let green = green.clamp(0.0, 255.0) as u8;

    for y in scene.face.y..(scene.face.y + scene.face.height).min(scene.height) {
        let row = y as usize * stride;
        // Static per-row texture; constant in time so it adds no spectral power.
        let texture = (y % 7) as u8;
        for x in scene.face.x..(scene.face.x + scene.face.width).min(scene.width) {
            let offset = row + x as usize * 3;
            data[offset] = 198 + texture;
            data[offset + 1] = green;
            data[offset + 2] = 140;
        }
    }

    RgbFrame::from_owned(
        scene.width,
        scene.height,
        stride,
        Some(Duration::from_secs_f64(t)),
        data,
    )
}

impl FrameSourceProvider for MockProvider {
    fn total_frames(&self) -> Option<u64> {
        Some(self.scene.frame_count as u64)
    }

    fn nominal_fps(&self) -> Option<f64> {
        Some(self.scene.fps)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let provider = *self;
        let capacity = provider.channel_capacity;
        spawn_stream_from_channel(capacity, move |tx| {
            provider.emit_frames(tx);
        })
    }
}

pub fn boxed_mock(
    scene: MockSceneConfig,
    channel_capacity: Option<usize>,
) -> PulseResult<DynFrameSource> {
    Ok(Box::new(MockProvider::new(scene, channel_capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_backend_emits_configured_frame_count() {
        let scene = MockSceneConfig {
            frame_count: 10,
            ..MockSceneConfig::default()
        };
        let provider = boxed_mock(scene, None).unwrap();
        assert_eq!(provider.total_frames(), Some(10));
        let mut stream = provider.into_stream();
        let mut count = 0usize;
        while let Some(frame) = stream.next().await {
            let frame = frame.unwrap();
            assert_eq!(frame.width(), 640);
            assert_eq!(frame.frame_index(), Some(count as u64));
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn timestamps_are_strictly_increasing() {
        let scene = MockSceneConfig {
            frame_count: 30,
            ..MockSceneConfig::default()
        };
        let mut stream = boxed_mock(scene, None).unwrap().into_stream();
        let mut last = None;
        while let Some(frame) = stream.next().await {
            let ts = frame.unwrap().timestamp().unwrap();
            if let Some(prev) = last {
                assert!(ts > prev, "timestamps must strictly increase");
            }
            last = Some(ts);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn face_green_channel_oscillates() {
        let scene = MockSceneConfig {
            frame_count: 60,
            ..MockSceneConfig::default()
        };
        let face = scene.face;
        let mut stream = boxed_mock(scene, None).unwrap().into_stream();
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        while let Some(frame) = stream.next().await {
            let mean = frame.unwrap().mean_rgb(&face).unwrap();
            min = min.min(mean[1]);
            max = max.max(mean[1]);
        }
        assert!(
            max - min > 10.0,
            "green channel should swing with the pulse: {min}..{max}"
        );
    }
}
