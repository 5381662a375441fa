//! Lowpass-feedback comb filter.

/// Comb filter with damping, the parallel building block of the stock reverb.
///
/// A delayed copy of the output is lowpassed (one-pole) and fed back, so high
/// frequencies decay faster than lows, the classic Schroeder/Freeverb
/// recirculating comb.
pub struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl CombFilter {
    /// Create a comb with the given delay length in samples (minimum 1).
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            pos: 0,
            feedback: 0.5,
            damping: 0.5,
            filter_state: 0.0,
        }
    }

    /// Set feedback gain in `[0, 1)`; higher means longer decay.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.98);
    }

    /// Set damping in `[0, 1]`; higher absorbs more high frequencies.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_state = output * (1.0 - self.damping) + self.filter_state * self.damping;
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }

    /// Clear the delay line and filter history.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
        self.filter_state = 0.0;
    }
}
