//! Offline rendering and segment composition for corte.
//!
//! This crate is the core of the export tool: it drives a manual
//! (non-realtime) render loop to completion with exact frame bookkeeping,
//! splits sources into per-segment files, and stitches independently
//! rendered segments back into continuous tracks.
//!
//! - [`OfflineGraph`] / [`GraphBuilder`] - validated source → effects → sink
//!   chain with an offline pull-based render call and an explicit arm/start
//!   state machine
//! - [`ChainSpec`] - the caller-facing chain factory (identity, reverb, rate)
//! - [`SegmentRenderer`] - bounded render loop appending produced buffers to
//!   a sink until a target frame count is reached, never overshooting
//! - [`Segmenter`] - partitions an interval into segments and renders each
//!   one to its own file
//! - [`Composer`] - reassembles files by raw concatenation through a render
//!   graph or by timeline composition with volume-ramp automation

mod automation;
mod chain;
mod composer;
mod graph;
mod renderer;
mod segmenter;

pub use automation::{VolumeAutomation, VolumeMarker, VolumeSegment};
pub use chain::ChainSpec;
pub use composer::{
    CancelToken, Composer, ExportOutcome, Timeline, TimelineClip, TimelineExporter,
    WavTimelineExporter,
};
pub use graph::{GraphBuilder, GraphConfigError, GraphState, OfflineGraph, RenderStatus, ScheduleTicket};
pub use renderer::{FrameSink, RenderPolicy, SegmentRenderer};
pub use segmenter::{
    DEFAULT_MAX_FRAMES, DEFAULT_SEGMENT_LENGTH, Segment, SegmentPlan, Segmenter,
};

use corte_core::AudioFormat;

/// Error types for rendering and composition.
///
/// Any failure during a single segment or export task aborts that task and
/// is surfaced with the task identity attached; partial output files are
/// left in place for diagnosis, never deleted here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Render graph construction or state machine misuse.
    #[error("graph configuration error: {0}")]
    GraphConfig(#[from] GraphConfigError),

    /// The underlying render call failed.
    #[error("render failed: {0}")]
    RenderFailure(String),

    /// The render loop made no progress across too many consecutive pulls.
    #[error("render starvation: no frames produced after {empty_pulls} consecutive pulls")]
    RenderStarvation {
        /// Number of consecutive empty pulls observed.
        empty_pulls: usize,
    },

    /// Inputs of a composition do not share the target format.
    #[error("format mismatch: expected {expected:?}, found {found:?}")]
    FormatMismatch {
        /// Target format of the pipeline.
        expected: AudioFormat,
        /// Format actually encountered.
        found: AudioFormat,
    },

    /// A segment plan that cannot be executed.
    #[error("invalid segment plan: {0}")]
    InvalidPlan(String),

    /// Volume automation that is unordered, overlapping, or out of range.
    #[error("invalid volume automation: {0}")]
    InvalidAutomation(String),

    /// The timeline export delegate reported failure.
    #[error("timeline export failed: {0}")]
    ExportFailed(String),

    /// The timeline export was cancelled before completion.
    #[error("timeline export cancelled")]
    ExportCancelled,

    /// A per-segment failure, carrying which segment aborted the task.
    #[error("segment {index} failed: {source}")]
    Segment {
        /// Index of the failing segment in timeline order.
        index: usize,
        /// The underlying failure.
        source: Box<Error>,
    },

    /// File collaborator error.
    #[error(transparent)]
    Io(#[from] corte_io::Error),

    /// Buffer allocation or format error.
    #[error(transparent)]
    Core(#[from] corte_core::Error),
}

/// Convenience result type for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;
