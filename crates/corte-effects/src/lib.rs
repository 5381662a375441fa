//! Stock effect units for corte render chains.
//!
//! Render graphs wire a source through zero or more of these units into the
//! sink. The units here cover the chains the export tool ships with:
//!
//! - [`Gain`] - flat linear gain, also the unit tests' workhorse
//! - [`Reverb`] - Freeverb-style reverb with named presets and a wet/dry mix
//!   in `[0, 100]`
//! - [`RateConverter`] - playback-rate change by linear-interpolation
//!   resampling, applied to scheduled material before rendering
//!
//! Effect DSP is deliberately modest; corte is about the offline rendering
//! and composition machinery around these units, not about novel DSP.

mod gain;
mod rate;
mod reverb;

pub use gain::Gain;
pub use rate::RateConverter;
pub use reverb::{Reverb, ReverbPreset};
