//! Splitting a source interval into per-segment files.

use crate::chain::ChainSpec;
use crate::renderer::{RenderPolicy, SegmentRenderer};
use crate::{Error, Result};
use corte_io::{AudioFileReader, AudioFileWriter};
use std::path::{Path, PathBuf};

/// Default segment length in seconds when the caller does not choose one.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 5.0;

/// Default maximum frames per render call.
pub const DEFAULT_MAX_FRAMES: usize = 4096;

/// A produced segment: its timeline position and its output file.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Zero-based index in timeline order.
    pub index: usize,
    /// Segment start in seconds of the source timeline.
    pub start_secs: f64,
    /// Segment end in seconds (exclusive).
    pub end_secs: f64,
    /// File the segment was rendered to.
    pub path: PathBuf,
}

impl Segment {
    /// Segment duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// How to partition the source timeline.
///
/// Both partition modes are supported contracts, selected by the caller;
/// neither is layered on the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentPlan {
    /// Split `[from_secs, to_secs)` into consecutive `segment_length` pieces;
    /// the last piece is clamped to the interval end and may be shorter.
    Interval {
        /// Interval start in seconds.
        from_secs: f64,
        /// Interval end in seconds (exclusive).
        to_secs: f64,
        /// Nominal segment length in seconds.
        segment_length: f64,
    },
    /// Exactly `count` equal-length pieces starting at `start_secs`.
    Count {
        /// First segment's start in seconds.
        start_secs: f64,
        /// Length of every segment in seconds.
        segment_length: f64,
        /// Number of segments.
        count: usize,
    },
}

impl SegmentPlan {
    /// Expand the plan into `(start, end)` second pairs.
    pub fn intervals(&self) -> Result<Vec<(f64, f64)>> {
        match *self {
            SegmentPlan::Interval {
                from_secs,
                to_secs,
                segment_length,
            } => {
                if !(segment_length.is_finite() && segment_length > 0.0) {
                    return Err(Error::InvalidPlan(format!(
                        "segment length must be > 0, got {segment_length}"
                    )));
                }
                if to_secs < from_secs {
                    return Err(Error::InvalidPlan(format!(
                        "interval end {to_secs} precedes start {from_secs}"
                    )));
                }
                let mut intervals = Vec::new();
                let mut start = from_secs;
                while start < to_secs {
                    let end = (start + segment_length).min(to_secs);
                    intervals.push((start, end));
                    start = end;
                }
                Ok(intervals)
            }
            SegmentPlan::Count {
                start_secs,
                segment_length,
                count,
            } => {
                if !(segment_length.is_finite() && segment_length > 0.0) {
                    return Err(Error::InvalidPlan(format!(
                        "segment length must be > 0, got {segment_length}"
                    )));
                }
                Ok((0..count)
                    .map(|i| {
                        let start = start_secs + i as f64 * segment_length;
                        (start, start + segment_length)
                    })
                    .collect())
            }
        }
    }
}

/// Renders each planned sub-interval of a source to its own file.
///
/// Per segment: read the source frame range into one buffer, build and arm a
/// fresh graph from the chain factory, schedule the buffer as the sole
/// source, render, then stop and release the graph. Fails fast on the first
/// segment error, surfacing which index failed.
pub struct Segmenter {
    chain: ChainSpec,
    max_frames: usize,
    renderer: SegmentRenderer,
}

impl Segmenter {
    /// Create a segmenter for the given chain with default tuning.
    pub fn new(chain: ChainSpec) -> Self {
        Self {
            chain,
            max_frames: DEFAULT_MAX_FRAMES,
            renderer: SegmentRenderer::new(),
        }
    }

    /// Override the per-pull maximum frame count.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Override the render loop policy.
    pub fn with_policy(mut self, policy: RenderPolicy) -> Self {
        self.renderer = SegmentRenderer::with_policy(policy);
        self
    }

    /// Split `source` according to `plan`, writing one file per segment at
    /// `{dest_dir}/{stem}_{index}.{ext}`. Returns the segments in timeline
    /// order.
    ///
    /// A failed segment leaves its partial file in place and aborts the
    /// remaining segments.
    pub fn run(
        &self,
        source: &Path,
        plan: &SegmentPlan,
        dest_dir: &Path,
        stem: &str,
        ext: &str,
    ) -> Result<Vec<Segment>> {
        self.run_with(source, plan, dest_dir, stem, ext, |_| {})
    }

    /// Like [`Segmenter::run`], invoking `observer` after each completed
    /// segment. Used by callers that report progress.
    pub fn run_with(
        &self,
        source: &Path,
        plan: &SegmentPlan,
        dest_dir: &Path,
        stem: &str,
        ext: &str,
        mut observer: impl FnMut(&Segment),
    ) -> Result<Vec<Segment>> {
        let mut reader = AudioFileReader::open(source)?;
        let intervals = plan.intervals()?;
        let mut segments = Vec::with_capacity(intervals.len());

        for (index, (start_secs, end_secs)) in intervals.into_iter().enumerate() {
            let path = dest_dir.join(format!("{stem}_{index}.{ext}"));
            self.render_segment(&mut reader, start_secs, end_secs, &path)
                .map_err(|source| Error::Segment {
                    index,
                    source: Box::new(source),
                })?;
            tracing::info!(
                index,
                start_secs,
                end_secs,
                path = %path.display(),
                "rendered segment"
            );
            let segment = Segment {
                index,
                start_secs,
                end_secs,
                path,
            };
            observer(&segment);
            segments.push(segment);
        }
        Ok(segments)
    }

    fn render_segment(
        &self,
        reader: &mut AudioFileReader,
        start_secs: f64,
        end_secs: f64,
        path: &Path,
    ) -> Result<()> {
        let format = reader.format();
        let source_buffer = reader.read_seconds(start_secs, end_secs)?;

        let mut graph = self.chain.build_graph(format)?;
        graph.enable_offline_mode(format, self.max_frames)?;
        graph.start()?;
        let ticket = graph.schedule_buffer(source_buffer)?;

        let mut writer = AudioFileWriter::create(path, format)?;
        self.renderer.render(&mut graph, &mut writer, ticket.frames())?;
        writer.finalize()?;
        graph.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_plan_covers_the_whole_range() {
        let plan = SegmentPlan::Interval {
            from_secs: 0.0,
            to_secs: 30.0,
            segment_length: 10.0,
        };
        let intervals = plan.intervals().unwrap();
        assert_eq!(intervals, vec![(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
    }

    #[test]
    fn final_interval_is_clamped() {
        let plan = SegmentPlan::Interval {
            from_secs: 0.0,
            to_secs: 12.5,
            segment_length: 5.0,
        };
        let intervals = plan.intervals().unwrap();
        assert_eq!(intervals, vec![(0.0, 5.0), (5.0, 10.0), (10.0, 12.5)]);
    }

    #[test]
    fn empty_interval_yields_no_segments() {
        let plan = SegmentPlan::Interval {
            from_secs: 3.0,
            to_secs: 3.0,
            segment_length: 5.0,
        };
        assert!(plan.intervals().unwrap().is_empty());
    }

    #[test]
    fn count_plan_produces_exactly_n() {
        let plan = SegmentPlan::Count {
            start_secs: 1.0,
            segment_length: 2.0,
            count: 3,
        };
        let intervals = plan.intervals().unwrap();
        assert_eq!(intervals, vec![(1.0, 3.0), (3.0, 5.0), (5.0, 7.0)]);
    }

    #[test]
    fn invalid_plans_are_rejected() {
        assert!(matches!(
            SegmentPlan::Interval {
                from_secs: 0.0,
                to_secs: 10.0,
                segment_length: 0.0,
            }
            .intervals(),
            Err(Error::InvalidPlan(_))
        ));
        assert!(matches!(
            SegmentPlan::Interval {
                from_secs: 10.0,
                to_secs: 0.0,
                segment_length: 5.0,
            }
            .intervals(),
            Err(Error::InvalidPlan(_))
        ));
        assert!(matches!(
            SegmentPlan::Count {
                start_secs: 0.0,
                segment_length: -1.0,
                count: 2,
            }
            .intervals(),
            Err(Error::InvalidPlan(_))
        ));
    }
}
