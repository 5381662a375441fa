//! Corte Core - primitives for offline audio rendering
//!
//! This crate provides the foundational types shared by every corte pipeline:
//!
//! - [`AudioFormat`] - sample rate / channel layout description. Every buffer
//!   and file operation in one pipeline shares exactly one format; mismatches
//!   are hard errors, never silently resampled.
//! - [`PcmBuffer`] - fixed-capacity planar sample buffer with a valid frame
//!   length, the unit moved between file I/O and the render graph.
//! - Frame arithmetic: [`AudioFormat::frame_at`] and friends implement the
//!   one rounding rule used everywhere (truncate toward zero).
//! - [`Effect`] - object-safe trait for block-based 1:1 effect units.
//! - [`CombFilter`] / [`AllpassFilter`] - the filter primitives the stock
//!   reverb is built from.

mod allpass;
mod buffer;
mod comb;
mod effect;
mod format;

pub use allpass::AllpassFilter;
pub use buffer::PcmBuffer;
pub use comb::CombFilter;
pub use effect::Effect;
pub use format::{AudioFormat, FrameCount, FramePosition};

/// Error types for core buffer and format operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffer allocation was requested with an unusable size.
    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    /// The audio format cannot describe real audio.
    #[error("invalid audio format: {sample_rate} Hz, {channels} channel(s)")]
    InvalidFormat {
        /// Requested sample rate in Hz.
        sample_rate: f64,
        /// Requested channel count.
        channels: u16,
    },
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
