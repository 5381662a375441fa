//! Schroeder allpass filter.

/// Allpass diffusion stage, the series building block of the stock reverb.
///
/// Passes all frequencies at equal gain while smearing phase, which turns the
/// discrete comb echoes into a dense tail.
pub struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    /// Create an allpass with the given delay length in samples (minimum 1).
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            pos: 0,
            feedback: 0.5,
        }
    }

    /// Set the feedback coefficient in `[0, 1)`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.98);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let output = delayed - input;
        self.buffer[self.pos] = input + delayed * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }

    /// Clear the delay line.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_stays_finite() {
        let mut allpass = AllpassFilter::new(5);
        for i in 0..10000 {
            let out = allpass.process((i as f32 * 0.1).sin());
            assert!(out.is_finite());
        }
    }

    #[test]
    fn silence_in_silence_out_after_reset() {
        let mut allpass = AllpassFilter::new(3);
        allpass.process(0.7);
        allpass.reset();
        for _ in 0..10 {
            assert_eq!(allpass.process(0.0), 0.0);
        }
    }
}
