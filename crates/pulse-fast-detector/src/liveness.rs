/// Blink-based liveness gate.
///
/// A still photograph never blinks: the gate refuses to pass samples until
/// it has seen the subject's eyes disappear and reappear within a plausible
/// blink duration. Once confirmed it stays confirmed for the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LivenessState {
    Idle,
    /// Eyes went absent at `since` (stream seconds).
    BlinkStarted { since: f64 },
    Confirmed,
}

#[derive(Debug, Clone)]
pub struct BlinkGate {
    state: LivenessState,
    min_blink_secs: f64,
    max_blink_secs: f64,
}

impl BlinkGate {
    pub const DEFAULT_MIN_BLINK_SECS: f64 = 0.1;
    pub const DEFAULT_MAX_BLINK_SECS: f64 = 2.0;

    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_MIN_BLINK_SECS, Self::DEFAULT_MAX_BLINK_SECS)
    }

    pub fn with_window(min_blink_secs: f64, max_blink_secs: f64) -> Self {
        Self {
            state: LivenessState::Idle,
            min_blink_secs,
            max_blink_secs,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, LivenessState::Confirmed)
    }

    /// Feed one observation for a frame in which a face was found.
    ///
    /// Frames without a face detection must not call this: no-face frames
    /// cause no transition.
    ///
    /// An eye absence shorter than the minimum is treated as detector noise;
    /// one longer than the maximum is not a blink either. While the eyes
    /// stay absent past the maximum the gate simply remains armed, and a
    /// reappearance that late re-arms from `Idle`.
    pub fn observe(&mut self, eyes_found: bool, now_secs: f64) {
        self.state = match self.state {
            LivenessState::Idle => {
                if eyes_found {
                    LivenessState::Idle
                } else {
                    LivenessState::BlinkStarted { since: now_secs }
                }
            }
            LivenessState::BlinkStarted { since } => {
                if !eyes_found {
                    LivenessState::BlinkStarted { since }
                } else {
                    let elapsed = now_secs - since;
                    if elapsed >= self.min_blink_secs && elapsed <= self.max_blink_secs {
                        LivenessState::Confirmed
                    } else {
                        LivenessState::Idle
                    }
                }
            }
            LivenessState::Confirmed => LivenessState::Confirmed,
        };
    }

    pub fn reset(&mut self) {
        self.state = LivenessState::Idle;
    }
}

impl Default for BlinkGate {
    fn default() -> Self {
        Self::new()
    }
}
