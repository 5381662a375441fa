//! Flat linear gain.

use corte_core::Effect;

/// Multiplies every sample by a fixed linear gain.
pub struct Gain {
    gain: f32,
}

impl Gain {
    /// Create a gain unit with the given linear factor.
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    /// Current linear gain factor.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Set the linear gain factor.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}

impl Effect for Gain {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    fn set_sample_rate(&mut self, _sample_rate: f64) {}

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_samples() {
        let mut gain = Gain::new(0.5);
        assert_eq!(gain.process(1.0), 0.5);
        assert_eq!(gain.process(-0.4), -0.2);
    }

    #[test]
    fn unity_gain_is_identity() {
        let mut gain = Gain::new(1.0);
        let input = [0.1, -0.2, 0.3];
        let mut output = [0.0; 3];
        gain.process_block(&input, &mut output);
        assert_eq!(output, input);
    }
}
