//! Offline render graph: a validated source → effects → sink chain.
//!
//! The graph is built once per export call by [`GraphBuilder`], armed with
//! [`OfflineGraph::enable_offline_mode`], started, pulled to completion with
//! [`OfflineGraph::render_offline`], and stopped. It is never shared across
//! concurrent exports.

use crate::{Error, Result};
use corte_core::{AudioFormat, Effect, FrameCount, PcmBuffer};
use corte_effects::RateConverter;
use corte_io::AudioFileReader;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Configuration and state machine errors for the render graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphConfigError {
    /// Two connected nodes disagree on format.
    #[error("connected nodes disagree on format: {expected:?} vs {found:?}")]
    FormatMismatch {
        /// Format of the graph.
        expected: AudioFormat,
        /// Format the offending node declared.
        found: AudioFormat,
    },

    /// `enable_offline_mode` was called on an already-armed graph.
    #[error("offline mode already enabled")]
    AlreadyArmed,

    /// An operation was attempted in the wrong state.
    #[error("operation requires state {required:?}, graph is {actual:?}")]
    InvalidState {
        /// State the operation needs.
        required: GraphState,
        /// State the graph is in.
        actual: GraphState,
    },

    /// A node parameter outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Lifecycle of an offline graph.
///
/// `Unarmed → Armed (enable_offline_mode) → Running (start) → Stopped (stop)`.
/// Scheduling source material is valid in `Armed` and `Running`; rendering
/// only in `Running`. `Stopped` is terminal and releases scheduled material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Built but not yet configured for offline rendering.
    Unarmed,
    /// Offline mode enabled; maximum render call size is fixed.
    Armed,
    /// Started; `render_offline` may pull frames.
    Running,
    /// Stopped; all scheduled material released.
    Stopped,
}

/// Result of one `render_offline` pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The graph produced this many frames (may be fewer than requested).
    Produced(usize),
    /// No scheduled material was available to pull from.
    InsufficientData,
    /// The graph is not running; the call cannot be serviced.
    CannotDoInCurrentContext,
}

struct ClipState {
    frames: FrameCount,
    consumed: AtomicBool,
}

/// Handle returned by scheduling operations, resolved when the render loop
/// has pulled the scheduled material to its end.
///
/// This replaces completion callbacks: observe [`ScheduleTicket::is_consumed`]
/// after render pulls instead of registering ambient callback state.
#[derive(Clone)]
pub struct ScheduleTicket(Arc<ClipState>);

impl ScheduleTicket {
    /// Number of frames this material will contribute to the render output
    /// (after any rate conversion).
    pub fn frames(&self) -> FrameCount {
        self.0.frames
    }

    /// True once every frame of the material has been pulled.
    pub fn is_consumed(&self) -> bool {
        self.0.consumed.load(Ordering::Acquire)
    }
}

struct ScheduledClip {
    buffer: PcmBuffer,
    cursor: usize,
    state: Arc<ClipState>,
}

/// One effect stage: one unit per channel, advanced in lock-step.
struct Stage {
    units: Vec<Box<dyn Effect + Send>>,
}

/// Builder for a validated, immutable chain description.
///
/// Construction failures are typed results; a built graph is guaranteed to
/// have every node agreeing on one [`AudioFormat`].
pub struct GraphBuilder {
    format: AudioFormat,
    stages: Vec<Stage>,
    rate: Option<RateConverter>,
}

impl GraphBuilder {
    /// Start a builder for the given pipeline format.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            stages: Vec::new(),
            rate: None,
        }
    }

    /// The pipeline format every node must agree on.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Append an effect stage, one unit per channel.
    ///
    /// Fails with [`GraphConfigError::InvalidParameter`] when the unit count
    /// does not match the channel count.
    pub fn stage(
        mut self,
        units: Vec<Box<dyn Effect + Send>>,
    ) -> std::result::Result<Self, GraphConfigError> {
        if units.len() != usize::from(self.format.channels) {
            return Err(GraphConfigError::InvalidParameter(format!(
                "stage has {} unit(s) for {} channel(s)",
                units.len(),
                self.format.channels
            )));
        }
        self.stages.push(Stage { units });
        Ok(self)
    }

    /// Append an effect stage whose units declare their own format.
    ///
    /// Fails with [`GraphConfigError::FormatMismatch`] if the declared format
    /// disagrees with the graph's.
    pub fn stage_with_format(
        self,
        format: AudioFormat,
        units: Vec<Box<dyn Effect + Send>>,
    ) -> std::result::Result<Self, GraphConfigError> {
        if format != self.format {
            return Err(GraphConfigError::FormatMismatch {
                expected: self.format,
                found: format,
            });
        }
        self.stage(units)
    }

    /// Set a playback-rate multiplier applied to scheduled material.
    ///
    /// Fails with [`GraphConfigError::InvalidParameter`] unless the
    /// multiplier is finite and greater than zero.
    pub fn rate(mut self, multiplier: f64) -> std::result::Result<Self, GraphConfigError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(GraphConfigError::InvalidParameter(format!(
                "rate multiplier must be > 0, got {multiplier}"
            )));
        }
        self.rate = Some(RateConverter::new(multiplier));
        Ok(self)
    }

    /// Finish construction. The returned graph is unarmed.
    pub fn build(self) -> OfflineGraph {
        tracing::debug!(
            sample_rate = self.format.sample_rate,
            channels = self.format.channels,
            stages = self.stages.len(),
            rate_change = self.rate.is_some(),
            "built render graph"
        );
        OfflineGraph {
            format: self.format,
            stages: self.stages,
            rate: self.rate,
            state: GraphState::Unarmed,
            max_frames: 0,
            rendered_frames: 0,
            queue: VecDeque::new(),
            scheduled_frames: 0,
        }
    }
}

/// An ordered chain of effect units with one source slot and one sink,
/// rendered offline under manual control.
///
/// Rendering is synchronous and CPU-bound; `render_offline` never blocks on
/// real time and is deterministic for a given schedule.
pub struct OfflineGraph {
    format: AudioFormat,
    stages: Vec<Stage>,
    rate: Option<RateConverter>,
    state: GraphState,
    max_frames: usize,
    rendered_frames: FrameCount,
    queue: VecDeque<ScheduledClip>,
    scheduled_frames: FrameCount,
}

impl OfflineGraph {
    /// The pipeline format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// The maximum frames a single render call may produce (0 until armed).
    pub fn max_frame_count(&self) -> usize {
        self.max_frames
    }

    /// Cumulative frames produced by render calls, i.e. the manual rendering
    /// sample time.
    pub fn rendered_frames(&self) -> FrameCount {
        self.rendered_frames
    }

    /// Frames scheduled but not yet pulled.
    pub fn scheduled_frames(&self) -> FrameCount {
        self.scheduled_frames
    }

    /// Switch the graph from unarmed to armed, fixing the maximum frames any
    /// single render call may produce.
    ///
    /// Fails with [`GraphConfigError::AlreadyArmed`] if called twice, and
    /// with [`GraphConfigError::FormatMismatch`] when the requested render
    /// format differs from the chain's.
    pub fn enable_offline_mode(
        &mut self,
        format: AudioFormat,
        max_frames: usize,
    ) -> std::result::Result<(), GraphConfigError> {
        if self.state != GraphState::Unarmed {
            return Err(GraphConfigError::AlreadyArmed);
        }
        if format != self.format {
            return Err(GraphConfigError::FormatMismatch {
                expected: self.format,
                found: format,
            });
        }
        if max_frames == 0 {
            return Err(GraphConfigError::InvalidParameter(
                "maximum frame count must be at least 1".into(),
            ));
        }
        self.max_frames = max_frames;
        self.state = GraphState::Armed;
        Ok(())
    }

    /// Begin rendering. Resets effect state so runs are reproducible.
    pub fn start(&mut self) -> std::result::Result<(), GraphConfigError> {
        if self.state != GraphState::Armed {
            return Err(GraphConfigError::InvalidState {
                required: GraphState::Armed,
                actual: self.state,
            });
        }
        for stage in &mut self.stages {
            for unit in &mut stage.units {
                unit.reset();
            }
        }
        self.state = GraphState::Running;
        Ok(())
    }

    /// Stop rendering and release all scheduled material. Terminal.
    pub fn stop(&mut self) {
        self.queue.clear();
        self.scheduled_frames = 0;
        self.state = GraphState::Stopped;
    }

    /// Schedule a buffer as source material.
    ///
    /// Valid in `Armed` or `Running`. The buffer must match the graph format.
    /// If the chain includes a rate change it is applied here, so the
    /// returned ticket reports the frames the material will contribute to
    /// the output.
    pub fn schedule_buffer(&mut self, buffer: PcmBuffer) -> Result<ScheduleTicket> {
        if !matches!(self.state, GraphState::Armed | GraphState::Running) {
            return Err(GraphConfigError::InvalidState {
                required: GraphState::Armed,
                actual: self.state,
            }
            .into());
        }
        if buffer.format() != self.format {
            return Err(GraphConfigError::FormatMismatch {
                expected: self.format,
                found: buffer.format(),
            }
            .into());
        }
        let buffer = match &self.rate {
            Some(converter) => converter.convert(&buffer)?,
            None => buffer,
        };
        let state = Arc::new(ClipState {
            frames: buffer.frame_len() as FrameCount,
            consumed: AtomicBool::new(buffer.is_empty()),
        });
        self.scheduled_frames += buffer.frame_len() as FrameCount;
        tracing::debug!(frames = buffer.frame_len(), "scheduled source buffer");
        if !buffer.is_empty() {
            self.queue.push_back(ScheduledClip {
                buffer,
                cursor: 0,
                state: Arc::clone(&state),
            });
        }
        Ok(ScheduleTicket(state))
    }

    /// Schedule an entire file as source material.
    pub fn schedule_file(&mut self, reader: &mut AudioFileReader) -> Result<ScheduleTicket> {
        let total = reader.total_frames();
        let mut buffer = PcmBuffer::allocate(reader.format(), (total as usize).max(1))?;
        if total > 0 {
            reader.read(&mut buffer, total, 0)?;
        }
        self.schedule_buffer(buffer)
    }

    /// Pull up to `requested` frames from the scheduled material, through the
    /// effect stages, into `buffer`.
    ///
    /// The request is bounded by the armed maximum. Returns
    /// [`RenderStatus::InsufficientData`] when nothing is scheduled and
    /// [`RenderStatus::CannotDoInCurrentContext`] when the graph is not
    /// running.
    pub fn render_offline(
        &mut self,
        requested: FrameCount,
        buffer: &mut PcmBuffer,
    ) -> Result<RenderStatus> {
        if self.state != GraphState::Running {
            return Ok(RenderStatus::CannotDoInCurrentContext);
        }
        if buffer.format() != self.format {
            return Err(Error::FormatMismatch {
                expected: self.format,
                found: buffer.format(),
            });
        }

        let limit = (requested as usize)
            .min(self.max_frames)
            .min(buffer.capacity());

        // Pull from the front of the schedule queue until the request is
        // filled or the queue runs dry.
        let mut pulled = 0;
        while pulled < limit {
            let Some(clip) = self.queue.front_mut() else {
                break;
            };
            let available = clip.buffer.frame_len() - clip.cursor;
            let take = available.min(limit - pulled);
            for channel in 0..buffer.channel_count() {
                let src = &clip.buffer.channel(channel)[clip.cursor..clip.cursor + take];
                buffer.channel_mut(channel)[pulled..pulled + take].copy_from_slice(src);
            }
            clip.cursor += take;
            pulled += take;
            if clip.cursor == clip.buffer.frame_len() {
                clip.state.consumed.store(true, Ordering::Release);
                self.queue.pop_front();
            }
        }

        if pulled == 0 && limit > 0 {
            return Ok(RenderStatus::InsufficientData);
        }

        for stage in &mut self.stages {
            for (channel, unit) in stage.units.iter_mut().enumerate() {
                unit.process_block_inplace(&mut buffer.channel_mut(channel)[..pulled]);
            }
        }

        buffer.set_frame_len(pulled);
        self.scheduled_frames -= pulled as FrameCount;
        self.rendered_frames += pulled as FrameCount;
        Ok(RenderStatus::Produced(pulled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corte_effects::Gain;

    fn mono() -> AudioFormat {
        AudioFormat::new(48000.0, 1).unwrap()
    }

    fn ramp_buffer(format: AudioFormat, len: usize) -> PcmBuffer {
        let mut buf = PcmBuffer::allocate(format, len).unwrap();
        for c in 0..buf.channel_count() {
            for (i, slot) in buf.channel_mut(c).iter_mut().enumerate() {
                *slot = i as f32;
            }
        }
        buf.set_frame_len(len);
        buf
    }

    fn armed_graph(format: AudioFormat, max_frames: usize) -> OfflineGraph {
        let mut graph = GraphBuilder::new(format).build();
        graph.enable_offline_mode(format, max_frames).unwrap();
        graph.start().unwrap();
        graph
    }

    #[test]
    fn arming_twice_fails() {
        let format = mono();
        let mut graph = GraphBuilder::new(format).build();
        graph.enable_offline_mode(format, 512).unwrap();
        assert!(matches!(
            graph.enable_offline_mode(format, 512),
            Err(GraphConfigError::AlreadyArmed)
        ));
    }

    #[test]
    fn arming_with_foreign_format_fails() {
        let format = mono();
        let other = AudioFormat::new(44100.0, 1).unwrap();
        let mut graph = GraphBuilder::new(format).build();
        assert!(matches!(
            graph.enable_offline_mode(other, 512),
            Err(GraphConfigError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn stage_with_foreign_format_fails() {
        let format = mono();
        let other = AudioFormat::new(96000.0, 1).unwrap();
        let result = GraphBuilder::new(format)
            .stage_with_format(other, vec![Box::new(Gain::new(1.0))]);
        assert!(matches!(
            result,
            Err(GraphConfigError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn scheduling_before_arming_fails() {
        let format = mono();
        let mut graph = GraphBuilder::new(format).build();
        let buffer = ramp_buffer(format, 16);
        assert!(graph.schedule_buffer(buffer).is_err());
    }

    #[test]
    fn render_without_start_cannot_service() {
        let format = mono();
        let mut graph = GraphBuilder::new(format).build();
        graph.enable_offline_mode(format, 64).unwrap();
        let mut out = PcmBuffer::allocate(format, 64).unwrap();
        assert_eq!(
            graph.render_offline(64, &mut out).unwrap(),
            RenderStatus::CannotDoInCurrentContext
        );
    }

    #[test]
    fn pull_is_bounded_by_armed_maximum() {
        let format = mono();
        let mut graph = armed_graph(format, 32);
        graph.schedule_buffer(ramp_buffer(format, 100)).unwrap();

        let mut out = PcmBuffer::allocate(format, 128).unwrap();
        match graph.render_offline(128, &mut out).unwrap() {
            RenderStatus::Produced(n) => assert_eq!(n, 32),
            status => panic!("unexpected status {status:?}"),
        }
        assert_eq!(graph.rendered_frames(), 32);
    }

    #[test]
    fn empty_queue_reports_insufficient_data() {
        let format = mono();
        let mut graph = armed_graph(format, 64);
        let mut out = PcmBuffer::allocate(format, 64).unwrap();
        assert_eq!(
            graph.render_offline(64, &mut out).unwrap(),
            RenderStatus::InsufficientData
        );
    }

    #[test]
    fn pull_spans_clip_boundaries() {
        let format = mono();
        let mut graph = armed_graph(format, 64);
        let first = graph.schedule_buffer(ramp_buffer(format, 10)).unwrap();
        let second = graph.schedule_buffer(ramp_buffer(format, 10)).unwrap();

        let mut out = PcmBuffer::allocate(format, 64).unwrap();
        match graph.render_offline(15, &mut out).unwrap() {
            RenderStatus::Produced(n) => assert_eq!(n, 15),
            status => panic!("unexpected status {status:?}"),
        }
        // First clip drained, second partially pulled.
        assert!(first.is_consumed());
        assert!(!second.is_consumed());
        assert_eq!(out.channel(0)[9], 9.0);
        assert_eq!(out.channel(0)[10], 0.0);

        match graph.render_offline(5, &mut out).unwrap() {
            RenderStatus::Produced(n) => assert_eq!(n, 5),
            status => panic!("unexpected status {status:?}"),
        }
        assert!(second.is_consumed());
        assert_eq!(graph.scheduled_frames(), 0);
    }

    #[test]
    fn effect_stage_processes_each_channel_independently() {
        let format = AudioFormat::new(48000.0, 2).unwrap();
        let mut graph = GraphBuilder::new(format)
            .stage(vec![Box::new(Gain::new(2.0)), Box::new(Gain::new(3.0))])
            .unwrap()
            .build();
        graph.enable_offline_mode(format, 16).unwrap();
        graph.start().unwrap();

        let mut input = PcmBuffer::allocate(format, 4).unwrap();
        input.channel_mut(0).fill(1.0);
        input.channel_mut(1).fill(1.0);
        input.set_frame_len(4);
        graph.schedule_buffer(input).unwrap();

        let mut out = PcmBuffer::allocate(format, 16).unwrap();
        graph.render_offline(4, &mut out).unwrap();
        assert_eq!(out.channel(0), [2.0, 2.0, 2.0, 2.0]);
        assert_eq!(out.channel(1), [3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn rate_change_shortens_scheduled_material() {
        let format = mono();
        let mut graph = GraphBuilder::new(format).rate(2.0).unwrap().build();
        graph.enable_offline_mode(format, 64).unwrap();
        graph.start().unwrap();

        let ticket = graph.schedule_buffer(ramp_buffer(format, 100)).unwrap();
        assert_eq!(ticket.frames(), 50);
        assert_eq!(graph.scheduled_frames(), 50);
    }

    #[test]
    fn invalid_rate_is_a_configuration_error() {
        let format = mono();
        assert!(matches!(
            GraphBuilder::new(format).rate(0.0),
            Err(GraphConfigError::InvalidParameter(_))
        ));
        assert!(matches!(
            GraphBuilder::new(format).rate(-1.5),
            Err(GraphConfigError::InvalidParameter(_))
        ));
    }

    #[test]
    fn stop_releases_scheduled_material() {
        let format = mono();
        let mut graph = armed_graph(format, 64);
        graph.schedule_buffer(ramp_buffer(format, 10)).unwrap();
        graph.stop();
        assert_eq!(graph.state(), GraphState::Stopped);
        assert_eq!(graph.scheduled_frames(), 0);

        let mut out = PcmBuffer::allocate(format, 64).unwrap();
        assert_eq!(
            graph.render_offline(8, &mut out).unwrap(),
            RenderStatus::CannotDoInCurrentContext
        );
    }

    #[test]
    fn empty_buffer_ticket_is_immediately_consumed() {
        let format = mono();
        let mut graph = armed_graph(format, 64);
        let empty = PcmBuffer::allocate(format, 4).unwrap();
        let ticket = graph.schedule_buffer(empty).unwrap();
        assert!(ticket.is_consumed());
        assert_eq!(ticket.frames(), 0);
    }
}
