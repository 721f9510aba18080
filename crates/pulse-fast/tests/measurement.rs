//! End-to-end measurement over the mock frame source: a synthetic face
//! pulsing at a known rate, a scripted blink, and the full session path
//! from frames to the classified outcome.

use std::sync::Arc;

use pulse_fast::{run_measurement, MeasurementSession, PipelineOptions};
use pulse_fast_detector::{BlinkWindow, RegionSelector, ScriptedDetector};
use pulse_fast_estimator::EstimatorConfig;
use pulse_fast_source::backends::mock::boxed_mock;
use pulse_fast_source::MockSceneConfig;
use pulse_fast_types::MeasurementOutcome;

fn scene(frame_count: usize, pulse_bpm: f64) -> MockSceneConfig {
    MockSceneConfig {
        frame_count,
        pulse_bpm,
        ..MockSceneConfig::default()
    }
}

fn session_for(scene: &MockSceneConfig, blinks: Vec<BlinkWindow>) -> MeasurementSession {
    let detector = ScriptedDetector::new(scene.face, blinks);
    MeasurementSession::new(
        Arc::new(detector),
        RegionSelector::default(),
        EstimatorConfig::default(),
    )
}

#[tokio::test]
async fn measurement_recovers_the_scene_pulse() {
    // Five seconds at 30 fps, one blink in the first 0.2 s.
    let scene = scene(150, 72.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, vec![BlinkWindow::new(0.0, 0.2)]);

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;

    match outcome {
        MeasurementOutcome::Success {
            heart_rate,
            category,
            recommendations,
            ..
        } => {
            assert!(
                (68.0..=76.0).contains(&heart_rate),
                "expected ~72 BPM, got {heart_rate}"
            );
            assert_eq!(category, "Pitta");
            assert!(!recommendations.is_empty());
        }
        MeasurementOutcome::Error { message } => panic!("measurement failed: {message}"),
    }
}

#[tokio::test]
async fn fast_pulse_classifies_as_vata() {
    let scene = scene(600, 100.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, vec![BlinkWindow::new(0.0, 0.2)]);

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;
    match outcome {
        MeasurementOutcome::Success {
            heart_rate,
            category,
            ..
        } => {
            assert!(
                (95.0..=105.0).contains(&heart_rate),
                "expected ~100 BPM, got {heart_rate}"
            );
            assert_eq!(category, "Vata");
        }
        MeasurementOutcome::Error { message } => panic!("measurement failed: {message}"),
    }
}

#[tokio::test]
async fn near_upper_bound_pulse_is_still_accurate() {
    // 164 BPM is inside the validated range but close to its ceiling, where
    // a too-wide peak-merge window would halve the interval estimate.
    let scene = scene(600, 164.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, vec![BlinkWindow::new(0.0, 0.2)]);

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;
    match outcome {
        MeasurementOutcome::Success {
            heart_rate,
            category,
            ..
        } => {
            assert!(
                (158.0..=170.0).contains(&heart_rate),
                "expected ~164 BPM, got {heart_rate}"
            );
            assert_eq!(category, "Vata");
        }
        MeasurementOutcome::Error { message } => panic!("measurement failed: {message}"),
    }
}

#[tokio::test]
async fn no_blink_means_no_measurement() {
    let scene = scene(150, 72.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, Vec::new());

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn short_capture_reports_insufficient_samples() {
    // Two seconds minus the blink is under the minimum trace length.
    let scene = scene(60, 72.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, vec![BlinkWindow::new(0.0, 0.2)]);

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;
    match outcome {
        MeasurementOutcome::Error { message } => {
            assert!(message.contains("insufficient samples"), "{message}");
        }
        MeasurementOutcome::Success { heart_rate, .. } => {
            panic!("short capture produced {heart_rate} BPM");
        }
    }
}

#[tokio::test]
async fn slow_pulse_classifies_as_kapha() {
    // Twenty seconds gives the estimators room at 58 BPM.
    let scene = scene(600, 58.0);
    let provider = boxed_mock(scene.clone(), None).unwrap();
    let mut session = session_for(&scene, vec![BlinkWindow::new(0.0, 0.2)]);

    let outcome = run_measurement(provider, &mut session, PipelineOptions::default()).await;
    match outcome {
        MeasurementOutcome::Success {
            heart_rate,
            category,
            ..
        } => {
            assert!(
                (54.0..=62.0).contains(&heart_rate),
                "expected ~58 BPM, got {heart_rate}"
            );
            assert_eq!(category, "Kapha");
        }
        MeasurementOutcome::Error { message } => panic!("measurement failed: {message}"),
    }
}
