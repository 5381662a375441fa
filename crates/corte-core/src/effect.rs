//! The [`Effect`] trait for 1:1 effect units.

/// An audio effect unit processing samples 1:1.
///
/// Effect units sit between the source and the sink of a render graph. The
/// trait is object-safe so chains can be assembled at runtime from caller
/// selections. Implementations must be deterministic: for a fixed parameter
/// set and input sequence they produce the same output every run, which is
/// what makes offline exports idempotent.
pub trait Effect {
    /// Process a single sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    ///
    /// The default calls [`Effect::process`] per sample; units may override
    /// for block-wise work.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate, recomputing any rate-dependent state.
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Clear internal state (delay lines, filter history) without changing
    /// parameters.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scale(f32);

    impl Effect for Scale {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f64) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn default_block_processing_matches_per_sample() {
        let mut effect = Scale(2.0);
        let input = [1.0, -0.5, 0.25];
        let mut output = [0.0; 3];
        effect.process_block(&input, &mut output);
        assert_eq!(output, [2.0, -1.0, 0.5]);

        let mut buffer = [1.0, -0.5, 0.25];
        effect.process_block_inplace(&mut buffer);
        assert_eq!(buffer, [2.0, -1.0, 0.5]);
    }
}
