//! Freeverb-style reverb with named presets.

use corte_core::{AllpassFilter, CombFilter, Effect};

/// Freeverb comb delay lengths at the 44.1 kHz reference rate.
/// Mutually prime to avoid stacked resonances.
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Freeverb allpass delay lengths at the 44.1 kHz reference rate.
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Reference sample rate for the tuning constants.
const REFERENCE_RATE: f64 = 44100.0;

/// Output gain applied to the summed comb bank.
const WET_SCALE: f32 = 0.015;

/// Scale a delay length from the reference rate to the target rate.
fn scale_to_rate(samples: usize, target_rate: f64) -> usize {
    ((samples as f64 * target_rate / REFERENCE_RATE).round() as usize).max(1)
}

/// Named reverb presets, mirroring the room sizes the export tool offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbPreset {
    /// Small room, short decay.
    SmallRoom,
    /// Medium hall, the export tool's default.
    #[default]
    MediumHall,
    /// Large hall, long decay.
    LargeHall,
}

impl ReverbPreset {
    /// Comb (feedback, damping) for this preset.
    fn tuning(self) -> (f32, f32) {
        match self {
            ReverbPreset::SmallRoom => (0.78, 0.5),
            ReverbPreset::MediumHall => (0.86, 0.4),
            ReverbPreset::LargeHall => (0.92, 0.3),
        }
    }
}

/// Algorithmic reverb: 8 parallel damped combs into 4 series allpasses.
///
/// The wet/dry `mix` is expressed in `[0, 100]` (percent wet) to match the
/// chain configuration surface; values outside the range are clamped.
pub struct Reverb {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
    preset: ReverbPreset,
    mix: f32,
    sample_rate: f64,
}

impl Reverb {
    /// Create a reverb for the given sample rate with a preset and a wet/dry
    /// mix in `[0, 100]`.
    pub fn new(sample_rate: f64, preset: ReverbPreset, mix: f32) -> Self {
        let combs =
            COMB_TUNINGS_44K.map(|delay| CombFilter::new(scale_to_rate(delay, sample_rate)));
        let allpasses =
            ALLPASS_TUNINGS_44K.map(|delay| AllpassFilter::new(scale_to_rate(delay, sample_rate)));
        let mut reverb = Self {
            combs,
            allpasses,
            preset,
            mix: mix.clamp(0.0, 100.0),
            sample_rate,
        };
        reverb.apply_preset();
        reverb
    }

    /// The active preset.
    pub fn preset(&self) -> ReverbPreset {
        self.preset
    }

    /// Wet/dry mix in `[0, 100]`.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Set the wet/dry mix in `[0, 100]` (clamped).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 100.0);
    }

    fn apply_preset(&mut self) {
        let (feedback, damping) = self.preset.tuning();
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damping(damping);
        }
        for allpass in &mut self.allpasses {
            allpass.set_feedback(0.5);
        }
    }
}

impl Effect for Reverb {
    fn process(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet *= WET_SCALE;
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        let mix = self.mix / 100.0;
        input * (1.0 - mix) + wet * mix
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.combs =
            COMB_TUNINGS_44K.map(|delay| CombFilter::new(scale_to_rate(delay, sample_rate)));
        self.allpasses =
            ALLPASS_TUNINGS_44K.map(|delay| AllpassFilter::new(scale_to_rate(delay, sample_rate)));
        self.apply_preset();
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}
