//! Audio format description and frame arithmetic.
//!
//! All second-to-frame conversions in corte go through [`AudioFormat`] so that
//! one rounding rule holds across every call site: truncate toward zero, with
//! `frame_count = end_frame - start_frame` for half-open `[start, end)` ranges.

use crate::{Error, Result};

/// A sample-frame index into a file or stream. Signed so positions can be
/// compared and subtracted without wrapping.
pub type FramePosition = i64;

/// A number of sample frames.
pub type FrameCount = u64;

/// Sample rate and channel layout of a render pipeline.
///
/// Samples are non-interleaved `f32` throughout; the format only carries the
/// parameters that must agree between buffers, files, and graph nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
}

impl AudioFormat {
    /// Create a validated format.
    pub fn new(sample_rate: f64, channels: u16) -> Result<Self> {
        let format = Self {
            sample_rate,
            channels,
        };
        if !format.is_valid() {
            return Err(Error::InvalidFormat {
                sample_rate,
                channels,
            });
        }
        Ok(format)
    }

    /// A format is valid when it can describe real audio: a finite positive
    /// sample rate and at least one channel.
    pub fn is_valid(&self) -> bool {
        self.sample_rate.is_finite() && self.sample_rate > 0.0 && self.channels > 0
    }

    /// Frame index for a point in time, truncated toward zero.
    pub fn frame_at(&self, seconds: f64) -> FramePosition {
        (seconds * self.sample_rate) as FramePosition
    }

    /// Frame index nearest to a point in time.
    ///
    /// For times that were themselves computed from a frame count
    /// (`frames / sample_rate`), the division is rarely exact in f64 and
    /// truncation can land one frame early; rounding recovers the original
    /// frame. Use this for destination placement of cumulative durations,
    /// [`AudioFormat::frame_at`] for caller-supplied range boundaries.
    pub fn frame_near(&self, seconds: f64) -> FramePosition {
        (seconds * self.sample_rate).round() as FramePosition
    }

    /// Number of frames in the half-open interval `[from_secs, to_secs)`.
    ///
    /// A zero-or-negative interval yields zero frames, not an error.
    pub fn frames_in(&self, from_secs: f64, to_secs: f64) -> FrameCount {
        let start = self.frame_at(from_secs);
        let end = self.frame_at(to_secs);
        if end <= start { 0 } else { (end - start) as FrameCount }
    }

    /// Time in seconds at a frame index.
    pub fn seconds_at(&self, frame: FramePosition) -> f64 {
        frame as f64 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_formats() {
        assert!(AudioFormat::new(0.0, 2).is_err());
        assert!(AudioFormat::new(-44100.0, 2).is_err());
        assert!(AudioFormat::new(f64::NAN, 2).is_err());
        assert!(AudioFormat::new(44100.0, 0).is_err());
        assert!(AudioFormat::new(44100.0, 2).is_ok());
    }

    #[test]
    fn frame_conversion_truncates_toward_zero() {
        let format = AudioFormat::new(44100.0, 1).unwrap();
        assert_eq!(format.frame_at(1.0), 44100);
        // 0.9999 * 44100 = 44095.59 -> 44095, never rounded up
        assert_eq!(format.frame_at(0.9999), 44095);
        assert_eq!(format.frame_at(0.0), 0);
    }

    #[test]
    fn frame_near_round_trips_frame_counts() {
        // 15 / 44100 * 44100 lands just below 15.0 in f64; truncation loses
        // a frame, rounding does not.
        let format = AudioFormat::new(44100.0, 1).unwrap();
        for frames in [1_i64, 15, 29, 13231, 44100, 65537] {
            let seconds = format.seconds_at(frames);
            assert_eq!(format.frame_near(seconds), frames);
        }
        assert_eq!(format.frame_at(format.seconds_at(15)), 14);
    }

    #[test]
    fn frames_in_is_end_minus_start() {
        let format = AudioFormat::new(48000.0, 2).unwrap();
        assert_eq!(format.frames_in(0.0, 1.0), 48000);
        assert_eq!(format.frames_in(1.0, 3.5), 120000);
    }

    #[test]
    fn empty_or_reversed_interval_yields_zero_frames() {
        let format = AudioFormat::new(48000.0, 1).unwrap();
        assert_eq!(format.frames_in(2.0, 2.0), 0);
        assert_eq!(format.frames_in(5.0, 1.0), 0);
    }
}
