//! Frequency-domain heart-rate estimation.

use num_complex::Complex;
use rustfft::FftPlanner;

/// Locate the dominant in-band frequency of `signal` and return it as BPM.
///
/// The spectrum is searched only between `low_hz` and `high_hz`; the DC bin
/// is never a candidate. Returns `None` when no FFT bin falls inside the
/// band, which happens for very short buffers where the bin spacing exceeds
/// the band width.
pub fn dominant_bpm(signal: &[f64], sample_rate: f64, low_hz: f64, high_hz: f64) -> Option<f64> {
    let n = signal.len();
    if n < 4 || sample_rate <= 0.0 {
        return None;
    }

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&value| Complex::new(value, 0.0))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let bin_hz = sample_rate / n as f64;
    let mut best: Option<(f64, f64)> = None;
    for (bin, value) in buffer.iter().enumerate().take(n / 2).skip(1) {
        let freq = bin as f64 * bin_hz;
        if freq < low_hz || freq > high_hz {
            continue;
        }
        let power = value.norm_sqr();
        // A zero-power bin is not a peak; a flat trace must yield nothing.
        if power > f64::EPSILON && best.map_or(true, |(_, best_power)| power > best_power) {
            best = Some((freq, power));
        }
    }

    best.map(|(freq, _)| freq * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn finds_a_clean_tone() {
        let fs = 30.0;
        let signal: Vec<f64> = (0..300)
            .map(|i| (TAU * 1.2 * i as f64 / fs).sin())
            .collect();
        let bpm = dominant_bpm(&signal, fs, 0.7, 4.0).unwrap();
        // 300 samples at 30 Hz give 0.1 Hz bins, so 1.2 Hz lands on a bin.
        assert!((bpm - 72.0).abs() < 3.1, "got {bpm}");
    }

    #[test]
    fn ignores_out_of_band_energy() {
        let fs = 30.0;
        let signal: Vec<f64> = (0..300)
            .map(|i| {
                let t = i as f64 / fs;
                (TAU * 1.0 * t).sin() + 3.0 * (TAU * 6.0 * t).sin()
            })
            .collect();
        let bpm = dominant_bpm(&signal, fs, 0.7, 4.0).unwrap();
        assert!((bpm - 60.0).abs() < 3.1, "got {bpm}");
    }

    #[test]
    fn too_short_a_buffer_yields_nothing() {
        assert!(dominant_bpm(&[1.0, 2.0], 30.0, 0.7, 4.0).is_none());
    }
}
