use std::pin::Pin;

use futures_core::Stream;
use futures_util::stream::unfold;
use tokio::sync::mpsc::{self, Sender};

pub use pulse_fast_types::{PulseError, PulseResult, RgbFrame};

pub type FrameStream = Pin<Box<dyn Stream<Item = PulseResult<RgbFrame>> + Send>>;

pub type DynFrameSource = Box<dyn FrameSourceProvider>;

/// A source of sequential raster frames: a camera, or a synthetic scene.
///
/// `into_stream` consumes the provider; the underlying resource is held for
/// the lifetime of the stream and released when the stream is dropped, so a
/// subsequent measurement can re-acquire it.
pub trait FrameSourceProvider: Send + 'static {
    /// Total number of frames the source will emit, when known up front.
    fn total_frames(&self) -> Option<u64> {
        None
    }

    /// Nominal frame rate, used only as a fallback when timestamps are
    /// too sparse to estimate one.
    fn nominal_fps(&self) -> Option<f64> {
        None
    }

    fn into_stream(self: Box<Self>) -> FrameStream;
}

/// Bridge a blocking frame emitter onto an async stream through a bounded
/// channel. The emitter observes `tx.is_closed()` / failed sends as its stop
/// signal, which is how dropping the stream releases the source.
pub fn spawn_stream_from_channel(
    capacity: usize,
    task: impl FnOnce(Sender<PulseResult<RgbFrame>>) + Send + 'static,
) -> FrameStream {
    let (tx, rx) = mpsc::channel(capacity);
    tokio::task::spawn_blocking(move || task(tx));
    let stream = unfold(rx, |mut receiver| async {
        receiver.recv().await.map(|item| (item, receiver))
    });
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[tokio::test(flavor = "multi_thread")]
    async fn spawn_stream_from_channel_pushes_values() {
        let stream = spawn_stream_from_channel(2, move |tx| {
            let frame = RgbFrame::from_owned(
                2,
                1,
                6,
                Some(Duration::from_millis(33)),
                vec![1, 2, 3, 4, 5, 6],
            )
            .unwrap();
            tx.blocking_send(Ok(frame)).unwrap();
        });
        let mut stream = stream;
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.timestamp(), Some(Duration::from_millis(33)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dropping_the_stream_stops_the_emitter() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let stream = spawn_stream_from_channel(1, move |tx| {
            loop {
                let frame = RgbFrame::from_owned(1, 1, 3, None, vec![0, 0, 0]).unwrap();
                if tx.blocking_send(Ok(frame)).is_err() {
                    break;
                }
            }
            done_tx.send(()).unwrap();
        });
        drop(stream);
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("emitter should stop once the stream is dropped");
    }
}
