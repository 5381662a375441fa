//! Per-time-range volume automation.

use crate::{Error, Result};

/// A point on the gain timeline: a time and a linear gain in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMarker {
    /// Time in seconds on the destination timeline.
    pub time_secs: f64,
    /// Linear gain in `[0, 1]`.
    pub gain: f32,
}

/// A linear gain ramp between two markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSegment {
    /// Ramp start.
    pub start: VolumeMarker,
    /// Ramp end; must be strictly later than the start.
    pub end: VolumeMarker,
}

/// An ordered set of non-overlapping volume ramps.
///
/// Between ramps the gain holds: unity before the first ramp, then the most
/// recently finished ramp's end gain until the next ramp begins.
#[derive(Debug, Clone, Default)]
pub struct VolumeAutomation {
    segments: Vec<VolumeSegment>,
}

impl VolumeAutomation {
    /// Validate and build an automation curve.
    ///
    /// Fails with [`Error::InvalidAutomation`] if any gain leaves `[0, 1]`,
    /// any ramp has a non-positive duration, or two ramps overlap in time.
    pub fn new(segments: Vec<VolumeSegment>) -> Result<Self> {
        for (i, segment) in segments.iter().enumerate() {
            for marker in [&segment.start, &segment.end] {
                if !(0.0..=1.0).contains(&marker.gain) {
                    return Err(Error::InvalidAutomation(format!(
                        "ramp {i}: gain {} outside [0, 1]",
                        marker.gain
                    )));
                }
                if !marker.time_secs.is_finite() {
                    return Err(Error::InvalidAutomation(format!(
                        "ramp {i}: non-finite time"
                    )));
                }
            }
            if segment.end.time_secs <= segment.start.time_secs {
                return Err(Error::InvalidAutomation(format!(
                    "ramp {i}: end {} not after start {}",
                    segment.end.time_secs, segment.start.time_secs
                )));
            }
        }
        for pair in segments.windows(2) {
            if pair[1].start.time_secs < pair[0].end.time_secs {
                return Err(Error::InvalidAutomation(format!(
                    "ramps overlap at {}s",
                    pair[1].start.time_secs
                )));
            }
        }
        Ok(Self { segments })
    }

    /// The validated ramps in time order.
    pub fn segments(&self) -> &[VolumeSegment] {
        &self.segments
    }

    /// True when no ramps are defined.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Linear gain at a point in time.
    ///
    /// Inside a ramp this is the linear interpolation between its endpoints;
    /// at `t == start.time` it is exactly `start.gain` and at
    /// `t == end.time` exactly `end.gain`.
    pub fn gain_at(&self, time_secs: f64) -> f32 {
        let mut held = 1.0;
        for segment in &self.segments {
            if time_secs < segment.start.time_secs {
                break;
            }
            if time_secs <= segment.end.time_secs {
                let span = segment.end.time_secs - segment.start.time_secs;
                let progress = ((time_secs - segment.start.time_secs) / span) as f32;
                return segment.start.gain + (segment.end.gain - segment.start.gain) * progress;
            }
            held = segment.end.gain;
        }
        held
    }

    /// Apply the curve in place to one channel of samples whose first sample
    /// falls at `start_secs` on the destination timeline.
    pub fn apply_to_channel(&self, samples: &mut [f32], start_secs: f64, sample_rate: f64) {
        if self.segments.is_empty() {
            return;
        }
        for (i, sample) in samples.iter_mut().enumerate() {
            let t = start_secs + i as f64 / sample_rate;
            *sample *= self.gain_at(t);
        }
    }
}
