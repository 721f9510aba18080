//! Dual-estimator heart-rate computation over a buffered sample trace.

use pulse_fast_types::{PulseError, Sample};

use crate::bandpass::Bandpass;
use crate::peaks;
use crate::spectral;

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Minimum number of samples before estimation is attempted.
    pub min_samples: usize,
    /// Lower edge of the heart-rate band in Hz.
    pub band_low_hz: f64,
    /// Upper edge of the heart-rate band in Hz.
    pub band_high_hz: f64,
    /// Butterworth bandpass order (may be reduced for short buffers).
    pub filter_order: usize,
    /// Sample rate assumed when timestamps cannot establish one.
    pub fallback_fps: f64,
    /// Validated BPM range; anything outside is rejected.
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_samples: 60,
            band_low_hz: 0.7,
            band_high_hz: 4.0,
            filter_order: 5,
            fallback_fps: 30.0,
            min_bpm: 40.0,
            max_bpm: 180.0,
        }
    }
}

/// Estimate heart rate in BPM from the collected trace.
///
/// The green channel carries the photoplethysmography signal. The trace is
/// mean-detrended and bandpass-filtered, then a spectral estimate and an
/// inter-beat-interval estimate are averaged when they agree to within 20%;
/// otherwise the spectral estimate stands alone. Each stage that cannot
/// produce a result fails the whole estimation; a number outside the
/// configured BPM range is rejected rather than clamped.
pub fn estimate(samples: &[Sample], config: &EstimatorConfig) -> Result<f64, PulseError> {
    if samples.len() < config.min_samples {
        return Err(PulseError::InsufficientSamples {
            got: samples.len(),
            needed: config.min_samples,
        });
    }

    let sample_rate = effective_sample_rate(samples, config.fallback_fps);
    let trace = detrended_green(samples);

    // Steep filters ring on short buffers; back the order off rather than
    // corrupt the trace.
    let order = config.filter_order.min((trace.len() / 12).max(2));
    let filter = Bandpass::new(config.band_low_hz, config.band_high_hz, sample_rate, order);
    let filtered = filter.filtfilt(&trace);

    let spectral_bpm =
        spectral::dominant_bpm(&filtered, sample_rate, config.band_low_hz, config.band_high_hz)
            .ok_or(PulseError::NoSpectralPeak)?;

    // The interval estimator is a cross-check; when the trace is too messy
    // for it, or the two estimates disagree grossly, the spectral estimate
    // stands alone.
    let bpm = match peaks::interval_bpm(&filtered, sample_rate, config.band_high_hz) {
        Some(interval_bpm) if (interval_bpm - spectral_bpm).abs() <= 0.2 * spectral_bpm => {
            (spectral_bpm + interval_bpm) / 2.0
        }
        _ => spectral_bpm,
    };

    if bpm < config.min_bpm || bpm > config.max_bpm {
        return Err(PulseError::HeartRateOutOfRange { bpm });
    }
    Ok(bpm)
}

/// Sample rate implied by the first and last timestamps, or the fallback
/// when the span is degenerate.
fn effective_sample_rate(samples: &[Sample], fallback_fps: f64) -> f64 {
    let span = samples[samples.len() - 1].timestamp - samples[0].timestamp;
    if span > 0.0 && samples.len() > 1 {
        (samples.len() - 1) as f64 / span
    } else {
        fallback_fps
    }
}

fn detrended_green(samples: &[Sample]) -> Vec<f64> {
    let mean = samples.iter().map(|s| s.green).sum::<f64>() / samples.len() as f64;
    samples.iter().map(|s| s.green - mean).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn pulse_trace(bpm: f64, fps: f64, seconds: f64) -> Vec<Sample> {
        let n = (fps * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / fps;
                let green = 150.0 + 10.0 * (TAU * bpm / 60.0 * t).sin();
                Sample::new(t, [198.0, green, 140.0])
            })
            .collect()
    }

    #[test]
    fn recovers_a_synthetic_pulse() {
        let samples = pulse_trace(72.0, 30.0, 10.0);
        let bpm = estimate(&samples, &EstimatorConfig::default()).unwrap();
        assert!((bpm - 72.0).abs() < 3.6, "got {bpm}");
    }

    #[test]
    fn accuracy_holds_across_the_validated_band() {
        // 20 s at 30 fps gives 0.05 Hz spectral bins, so every rate in the
        // validated range should come back within a few BPM, including the
        // upper end where the beats sit only ~10 samples apart.
        for &bpm in &[48.0, 72.0, 100.0, 132.0, 165.0, 174.0] {
            let samples = pulse_trace(bpm, 30.0, 20.0);
            let got = estimate(&samples, &EstimatorConfig::default()).unwrap();
            assert!(
                (got - bpm).abs() < 0.05 * bpm,
                "expected {bpm} BPM, got {got}"
            );
        }
    }

    #[test]
    fn too_few_samples_is_an_error() {
        let samples = pulse_trace(72.0, 30.0, 1.0);
        let err = estimate(&samples, &EstimatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PulseError::InsufficientSamples { got: 30, needed: 60 }
        ));
    }

    #[test]
    fn one_sample_under_the_threshold_is_still_an_error() {
        let mut samples = pulse_trace(72.0, 30.0, 2.0);
        samples.truncate(59);
        let err = estimate(&samples, &EstimatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PulseError::InsufficientSamples { got: 59, needed: 60 }
        ));
        samples.push(Sample::new(2.0, [198.0, 150.0, 140.0]));
        // At exactly the threshold, estimation proceeds.
        assert!(!matches!(
            estimate(&samples, &EstimatorConfig::default()),
            Err(PulseError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn flat_trace_produces_no_estimate() {
        let samples: Vec<Sample> = (0..300)
            .map(|i| Sample::new(i as f64 / 30.0, [198.0, 150.0, 140.0]))
            .collect();
        assert!(estimate(&samples, &EstimatorConfig::default()).is_err());
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        // 4.5 Hz modulation is above the band, but force a wide band so the
        // estimate itself lands outside the validated range.
        let samples = pulse_trace(220.0, 30.0, 10.0);
        let config = EstimatorConfig {
            band_high_hz: 6.0,
            ..EstimatorConfig::default()
        };
        let err = estimate(&samples, &config).unwrap_err();
        assert!(matches!(err, PulseError::HeartRateOutOfRange { .. }));
    }

    #[test]
    fn sample_rate_is_taken_from_timestamps() {
        // 72 BPM trace timed at 15 fps; a hardcoded 30 fps assumption would
        // read it as 144 BPM.
        let samples = pulse_trace(72.0, 15.0, 10.0);
        let bpm = estimate(&samples, &EstimatorConfig::default()).unwrap();
        assert!((bpm - 72.0).abs() < 4.0, "got {bpm}");
    }
}
