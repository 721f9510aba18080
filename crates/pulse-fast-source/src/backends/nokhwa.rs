use std::time::Instant;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tokio::sync::mpsc::Sender;

use crate::core::{
    spawn_stream_from_channel, DynFrameSource, FrameSourceProvider, FrameStream, PulseError,
    PulseResult, RgbFrame,
};

const BACKEND: &str = "nokhwa";

pub struct NokhwaProvider {
    camera: Camera,
    channel_capacity: usize,
}

impl NokhwaProvider {
    const DEFAULT_CHANNEL_CAPACITY: usize = 4;

    pub fn open(camera_index: u32, channel_capacity: Option<usize>) -> PulseResult<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let camera = Camera::new(CameraIndex::Index(camera_index), requested)
            .map_err(|err| PulseError::resource_unavailable(err.to_string()))?;
        Ok(Self {
            camera,
            channel_capacity: channel_capacity
                .unwrap_or(Self::DEFAULT_CHANNEL_CAPACITY)
                .max(1),
        })
    }

    fn stream_frames(mut self, tx: Sender<PulseResult<RgbFrame>>) {
        if let Err(err) = self.camera.open_stream() {
            let _ = tx.blocking_send(Err(PulseError::resource_unavailable(err.to_string())));
            return;
        }
        let started = Instant::now();
        let mut index = 0u64;
        while !tx.is_closed() {
            let frame = match self.camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    // A single unreadable frame is skipped, not fatal.
                    eprintln!("nokhwa frame read failed: {err}");
                    continue;
                }
            };
            let decoded = match frame.decode_image::<RgbFormat>() {
                Ok(image) => image,
                Err(err) => {
                    eprintln!("nokhwa frame decode failed: {err}");
                    continue;
                }
            };
            let width = decoded.width();
            let height = decoded.height();
            let frame = RgbFrame::from_owned(
                width,
                height,
                width as usize * 3,
                Some(started.elapsed()),
                decoded.into_raw(),
            )
            .map(|frame| frame.with_frame_index(Some(index)))
            .map_err(|err| PulseError::backend_failure(BACKEND, err.to_string()));
            index += 1;
            if tx.blocking_send(frame).is_err() {
                break;
            }
        }
        let _ = self.camera.stop_stream();
        // Camera handle drops here, releasing the device for the next session.
    }
}

impl FrameSourceProvider for NokhwaProvider {
    fn nominal_fps(&self) -> Option<f64> {
        Some(self.camera.frame_rate() as f64)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let provider = *self;
        let capacity = provider.channel_capacity;
        spawn_stream_from_channel(capacity, move |tx| {
            provider.stream_frames(tx);
        })
    }
}

pub fn boxed_nokhwa(
    camera_index: u32,
    channel_capacity: Option<usize>,
) -> PulseResult<DynFrameSource> {
    Ok(Box::new(NokhwaProvider::open(
        camera_index,
        channel_capacity,
    )?))
}
