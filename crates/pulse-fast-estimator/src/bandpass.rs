//! Butterworth bandpass filtering for the photoplethysmography trace.
//!
//! The bandpass is realized as a highpass cascade at the low cutoff followed
//! by a lowpass cascade at the high cutoff, each designed via the bilinear
//! transform as second-order sections (plus a first-order tail for odd
//! orders). Filtering is applied forward and then backward so the output is
//! zero-phase; a phase-shifted trace would bias the inter-beat intervals.

use std::f64::consts::PI;

/// One direct-form-I second-order section.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn apply(&self, signal: &mut [f64]) {
        let (mut x1, mut x2) = (0.0, 0.0);
        let (mut y1, mut y2) = (0.0, 0.0);
        for value in signal.iter_mut() {
            let x0 = *value;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            *value = y0;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
        }
    }
}

/// First-order tail used when the filter order is odd.
#[derive(Debug, Clone, Copy)]
struct FirstOrder {
    b0: f64,
    b1: f64,
    a1: f64,
}

impl FirstOrder {
    fn apply(&self, signal: &mut [f64]) {
        let mut x1 = 0.0;
        let mut y1 = 0.0;
        for value in signal.iter_mut() {
            let x0 = *value;
            let y0 = self.b0 * x0 + self.b1 * x1 - self.a1 * y1;
            *value = y0;
            x1 = x0;
            y1 = y0;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Response {
    Lowpass,
    Highpass,
}

/// Butterworth cascade for one cutoff (all sections share the cutoff; the
/// pole angles distribute the damping across the sections).
#[derive(Debug, Clone)]
struct Cascade {
    sections: Vec<Biquad>,
    tail: Option<FirstOrder>,
}

impl Cascade {
    fn design(response: Response, cutoff_hz: f64, sample_rate: f64, order: usize) -> Self {
        let k = (PI * cutoff_hz / sample_rate).tan();
        let k2 = k * k;

        let pairs = order / 2;
        let mut sections = Vec::with_capacity(pairs);
        for pair in 0..pairs {
            let theta = PI * (2.0 * pair as f64 + 1.0) / (2.0 * order as f64);
            let damping = 2.0 * theta.cos();
            let norm = 1.0 / (1.0 + damping * k + k2);
            let a1 = 2.0 * (k2 - 1.0) * norm;
            let a2 = (1.0 - damping * k + k2) * norm;
            let section = match response {
                Response::Lowpass => {
                    let b0 = k2 * norm;
                    Biquad {
                        b0,
                        b1: 2.0 * b0,
                        b2: b0,
                        a1,
                        a2,
                    }
                }
                Response::Highpass => {
                    let b0 = norm;
                    Biquad {
                        b0,
                        b1: -2.0 * b0,
                        b2: b0,
                        a1,
                        a2,
                    }
                }
            };
            sections.push(section);
        }

        let tail = (order % 2 == 1).then(|| {
            let norm = 1.0 / (1.0 + k);
            let a1 = (k - 1.0) * norm;
            match response {
                Response::Lowpass => FirstOrder {
                    b0: k * norm,
                    b1: k * norm,
                    a1,
                },
                Response::Highpass => FirstOrder {
                    b0: norm,
                    b1: -norm,
                    a1,
                },
            }
        });

        Self { sections, tail }
    }

    fn apply(&self, signal: &mut [f64]) {
        for section in &self.sections {
            section.apply(signal);
        }
        if let Some(tail) = &self.tail {
            tail.apply(signal);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bandpass {
    highpass: Cascade,
    lowpass: Cascade,
}

impl Bandpass {
    /// Design an order-`order` Butterworth bandpass with the given band edges.
    ///
    /// Both edges must sit below the Nyquist frequency; callers are expected
    /// to check the sample rate before designing.
    pub fn new(low_hz: f64, high_hz: f64, sample_rate: f64, order: usize) -> Self {
        Self {
            highpass: Cascade::design(Response::Highpass, low_hz, sample_rate, order),
            lowpass: Cascade::design(Response::Lowpass, high_hz, sample_rate, order),
        }
    }

    /// Zero-phase filtering: forward pass, then the same cascade over the
    /// reversed output.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        let mut out = signal.to_vec();
        self.apply_once(&mut out);
        out.reverse();
        self.apply_once(&mut out);
        out.reverse();
        out
    }

    fn apply_once(&self, signal: &mut [f64]) {
        self.highpass.apply(signal);
        self.lowpass.apply(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn sine(freq: f64, fs: f64, seconds: f64) -> Vec<f64> {
        let n = (fs * seconds) as usize;
        (0..n).map(|i| (TAU * freq * i as f64 / fs).sin()).collect()
    }

    fn rms(signal: &[f64]) -> f64 {
        let skip = signal.len() / 4;
        let body = &signal[skip..signal.len() - skip];
        (body.iter().map(|v| v * v).sum::<f64>() / body.len() as f64).sqrt()
    }

    #[test]
    fn passband_tone_survives() {
        let filter = Bandpass::new(0.7, 4.0, 30.0, 5);
        let input = sine(1.2, 30.0, 20.0);
        let output = filter.filtfilt(&input);
        assert!(rms(&output) > 0.7 * rms(&input));
    }

    #[test]
    fn out_of_band_tones_are_attenuated() {
        let filter = Bandpass::new(0.7, 4.0, 30.0, 5);
        for freq in [0.1, 8.0] {
            let input = sine(freq, 30.0, 20.0);
            let output = filter.filtfilt(&input);
            assert!(
                rms(&output) < 0.05 * rms(&input),
                "tone at {freq} Hz leaked through"
            );
        }
    }

    #[test]
    fn dc_offset_is_removed() {
        let filter = Bandpass::new(0.7, 4.0, 30.0, 5);
        let input = vec![5.0; 600];
        let output = filter.filtfilt(&input);
        let tail_mean =
            output[300..].iter().sum::<f64>() / 300.0;
        assert!(tail_mean.abs() < 0.05);
    }
}
