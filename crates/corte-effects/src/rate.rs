//! Playback-rate change by linear-interpolation resampling.

use corte_core::PcmBuffer;

/// Resamples scheduled material by a rate multiplier.
///
/// A rate of 2.0 plays material in half the time (half the frames); 0.5
/// doubles it. The conversion runs at schedule time, before the render loop
/// pulls, so the graph's per-frame path stays strictly 1:1. Each scheduled
/// clip is converted independently with the read phase starting at zero.
///
/// The multiplier must be finite and greater than zero; the graph builder
/// validates caller input before constructing a converter.
pub struct RateConverter {
    rate: f64,
}

impl RateConverter {
    /// Create a converter with the given rate multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is not finite and positive. Callers validate
    /// user-supplied rates and surface a configuration error instead.
    pub fn new(rate: f64) -> Self {
        assert!(rate.is_finite() && rate > 0.0, "rate multiplier must be > 0");
        Self { rate }
    }

    /// The rate multiplier.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Number of output frames produced for the given input length.
    ///
    /// Output frame `k` reads input position `k * rate`; frames are produced
    /// while that position stays inside the input.
    pub fn output_frames(&self, input_frames: usize) -> usize {
        if input_frames == 0 {
            return 0;
        }
        ((input_frames - 1) as f64 / self.rate) as usize + 1
    }

    /// Resample a buffer into a freshly allocated one of the same format.
    pub fn convert(&self, input: &PcmBuffer) -> corte_core::Result<PcmBuffer> {
        let in_len = input.frame_len();
        let out_len = self.output_frames(in_len);
        let mut output = PcmBuffer::allocate(input.format(), out_len.max(1))?;

        for channel in 0..input.channel_count() {
            let src = input.channel(channel);
            let dst = output.channel_mut(channel);
            for (k, slot) in dst.iter_mut().take(out_len).enumerate() {
                let pos = k as f64 * self.rate;
                let i0 = pos as usize;
                let i1 = (i0 + 1).min(in_len - 1);
                let frac = (pos - i0 as f64) as f32;
                *slot = src[i0] * (1.0 - frac) + src[i1] * frac;
            }
        }
        output.set_frame_len(out_len);
        Ok(output)
    }
}
