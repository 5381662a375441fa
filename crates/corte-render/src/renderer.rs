//! The bounded offline render loop.

use crate::graph::{OfflineGraph, RenderStatus};
use crate::{Error, Result};
use corte_core::{FrameCount, PcmBuffer};
use corte_io::AudioFileWriter;

/// Destination for rendered buffers, appended strictly in order.
///
/// The file writer is the production sink; tests substitute an in-memory one.
pub trait FrameSink {
    /// Append every valid frame of `buffer`.
    fn append(&mut self, buffer: &PcmBuffer) -> Result<()>;
}

impl FrameSink for AudioFileWriter {
    fn append(&mut self, buffer: &PcmBuffer) -> Result<()> {
        self.write(buffer)?;
        Ok(())
    }
}

/// Tuning for the render loop's starvation tolerance.
#[derive(Debug, Clone, Copy)]
pub struct RenderPolicy {
    /// Consecutive pulls yielding no frames before the loop gives up with
    /// [`Error::RenderStarvation`]. The scheduled source may legitimately
    /// need a few empty pulls to catch up, but an unconditional loop would
    /// spin forever on a drained schedule.
    pub max_empty_pulls: usize,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            max_empty_pulls: 1000,
        }
    }
}

/// Drives an armed, started graph for a bounded number of frames.
///
/// Repeatedly pulls `min(remaining, graph_max)` frames and appends each
/// produced buffer to the sink, stopping exactly when the cumulative count
/// reaches the target. The loop never requests more than `remaining`, so it
/// can never overshoot: the final pull's request equals the frames still
/// owed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentRenderer {
    policy: RenderPolicy,
}

impl SegmentRenderer {
    /// Create a renderer with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with an explicit starvation policy.
    pub fn with_policy(policy: RenderPolicy) -> Self {
        Self { policy }
    }

    /// Render exactly `target_frames` frames from `graph` into `sink`.
    ///
    /// On failure the sink is left with whatever was appended so far; the
    /// caller decides what to do with partial output.
    pub fn render(
        &self,
        graph: &mut OfflineGraph,
        sink: &mut dyn FrameSink,
        target_frames: FrameCount,
    ) -> Result<FrameCount> {
        let mut buffer = PcmBuffer::allocate(graph.format(), graph.max_frame_count().max(1))?;
        let mut remaining = target_frames;
        let mut empty_pulls = 0usize;

        while remaining > 0 {
            let request = remaining.min(graph.max_frame_count() as FrameCount);
            match graph.render_offline(request, &mut buffer)? {
                RenderStatus::Produced(0) | RenderStatus::InsufficientData => {
                    empty_pulls += 1;
                    if empty_pulls >= self.policy.max_empty_pulls {
                        return Err(Error::RenderStarvation { empty_pulls });
                    }
                }
                RenderStatus::Produced(produced) => {
                    empty_pulls = 0;
                    sink.append(&buffer)?;
                    remaining -= produced as FrameCount;
                    tracing::trace!(produced, remaining, "render pull");
                }
                RenderStatus::CannotDoInCurrentContext => {
                    return Err(Error::RenderFailure(
                        "graph cannot render in its current state".into(),
                    ));
                }
            }
        }

        tracing::debug!(frames = target_frames, "segment render complete");
        Ok(target_frames)
    }
}
