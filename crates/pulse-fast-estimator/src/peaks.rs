//! Time-domain heart-rate estimation from inter-beat intervals.

/// Estimate BPM from the spacing of signal peaks.
///
/// A peak is a local maximum above zero (the trace is detrended before it
/// reaches this function). Peaks closer together than the refractory window
/// are merged into the taller one, which suppresses filter ripple without
/// swallowing real beats: the window sits at three quarters of the shortest
/// in-band period, so any rate up to `max_hz` keeps its peaks distinct.
/// Needs at least two surviving peaks.
pub fn interval_bpm(signal: &[f64], sample_rate: f64, max_hz: f64) -> Option<f64> {
    if sample_rate <= 0.0 || max_hz <= 0.0 {
        return None;
    }
    let min_spacing = ((sample_rate / max_hz) * 0.75).max(1.0) as usize;
    let peaks = find_peaks(signal, min_spacing);
    if peaks.len() < 2 {
        return None;
    }

    let total_span = (peaks[peaks.len() - 1] - peaks[0]) as f64 / sample_rate;
    let mean_interval = total_span / (peaks.len() - 1) as f64;
    if mean_interval <= 0.0 {
        return None;
    }
    Some(60.0 / mean_interval)
}

fn find_peaks(signal: &[f64], min_spacing: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..signal.len().saturating_sub(1) {
        if signal[i] <= 0.0 {
            continue;
        }
        if signal[i] <= signal[i - 1] || signal[i] < signal[i + 1] {
            continue;
        }
        match peaks.last_mut() {
            Some(last) if i - *last < min_spacing => {
                if signal[i] > signal[*last] {
                    *last = i;
                }
            }
            _ => peaks.push(i),
        }
    }
    peaks
}
