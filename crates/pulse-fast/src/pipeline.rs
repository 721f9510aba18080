//! Drives frames from a source into the measurement session until the
//! session duration elapses or the source ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use pulse_fast_source::DynFrameSource;
use pulse_fast_types::{MeasurementOutcome, PulseError, RgbFrame};
use tokio_stream::StreamExt;

use crate::session::{FrameAnnotation, MeasurementSession};

/// Per-frame display hook; receives every processed frame with its
/// annotation.
pub type FrameCallback = Box<dyn FnMut(&RgbFrame, &FrameAnnotation) + Send>;

#[derive(Default)]
pub struct PipelineOptions {
    /// Auto-stop once a frame timestamp reaches this many seconds.
    pub duration_secs: Option<f64>,
    pub progress: Option<ProgressBar>,
    pub display: Option<FrameCallback>,
    /// Manual stop requested (Ctrl-C); checked between frames.
    pub stop_requested: Option<Arc<AtomicBool>>,
}

/// Run one measurement over the provider's frame stream.
///
/// Decode errors on individual frames are reported and skipped; a source
/// that becomes unavailable ends the measurement with whatever was
/// collected. The stream is dropped before estimation so the capture
/// thread shuts down first.
pub async fn run_measurement(
    provider: DynFrameSource,
    session: &mut MeasurementSession,
    mut options: PipelineOptions,
) -> MeasurementOutcome {
    session.start();

    let mut stream = provider.into_stream();
    while let Some(item) = stream.next().await {
        if options
            .stop_requested
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            break;
        }
        let frame = match item {
            Ok(frame) => frame,
            Err(err @ PulseError::ResourceUnavailable { .. }) => {
                eprintln!("frame source ended early: {err}");
                break;
            }
            Err(err) => {
                eprintln!("skipping frame: {err}");
                continue;
            }
        };

        if let Some(timestamp) = frame.timestamp() {
            let secs = timestamp.as_secs_f64();
            if let Some(limit) = options.duration_secs {
                if secs >= limit {
                    break;
                }
            }
            if let Some(progress) = options.progress.as_ref() {
                progress.set_position(secs.floor() as u64);
            }
        }

        let annotation = session.process_frame(&frame);
        if let Some(display) = options.display.as_mut() {
            display(&frame, &annotation);
        }
    }
    drop(stream);

    if let Some(progress) = options.progress.take() {
        progress.finish_and_clear();
    }

    session.stop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_fast_detector::{BlinkWindow, RegionSelector, ScriptedDetector};
    use pulse_fast_estimator::EstimatorConfig;
    use pulse_fast_source::backends::mock::{boxed_mock, MockSceneConfig};
    use std::sync::Arc;

    fn mock_session(face: pulse_fast_types::FaceRect) -> MeasurementSession {
        let detector = ScriptedDetector::new(face, vec![BlinkWindow::new(0.0, 0.2)]);
        MeasurementSession::new(
            Arc::new(detector),
            RegionSelector::default(),
            EstimatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn duration_limit_stops_the_run_early() {
        let scene = MockSceneConfig::default();
        let face = scene.face;
        let provider = boxed_mock(scene, None).unwrap();
        let mut session = mock_session(face);
        let outcome = run_measurement(
            provider,
            &mut session,
            PipelineOptions {
                duration_secs: Some(1.0),
                ..PipelineOptions::default()
            },
        )
        .await;
        // One second at 30 fps cannot reach the minimum sample count.
        assert!(!outcome.is_success());
        assert!(session.sample_count() == 0);
    }

    #[tokio::test]
    async fn display_hook_sees_every_frame() {
        let scene = MockSceneConfig {
            frame_count: 30,
            ..MockSceneConfig::default()
        };
        let face = scene.face;
        let provider = boxed_mock(scene, None).unwrap();
        let mut session = mock_session(face);
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _ = run_measurement(
            provider,
            &mut session,
            PipelineOptions {
                display: Some(Box::new(move |_, _| {
                    counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                })),
                ..PipelineOptions::default()
            },
        )
        .await;
        assert_eq!(seen.load(std::sync::atomic::Ordering::Relaxed), 30);
    }
}
