//! Reassembling segment files into continuous output.
//!
//! Two structurally different strategies that must agree on resulting
//! duration and ordering:
//!
//! - **raw concatenation** renders every input file, in order, through one
//!   long-lived graph into one output file;
//! - **timeline composition** places inputs on a shared time axis and
//!   delegates mixing and encoding to a [`TimelineExporter`], optionally
//!   applying volume-ramp automation.

use crate::automation::VolumeAutomation;
use crate::chain::ChainSpec;
use crate::renderer::{RenderPolicy, SegmentRenderer};
use crate::segmenter::DEFAULT_MAX_FRAMES;
use crate::{Error, Result};
use corte_core::{FrameCount, PcmBuffer};
use corte_io::{AudioFileReader, AudioFileWriter, probe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Caller-supplied cancellation signal for timeline exports.
///
/// Cloning shares the flag; any clone can cancel. No partial-file cleanup is
/// performed on cancellation: an interrupted destination is invalid and the
/// export must be re-run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Outcome of a delegated timeline export, surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The destination file was written completely.
    Completed,
    /// The export failed; the reason comes from the delegate.
    Failed(String),
    /// The export observed its cancellation token before completion.
    Cancelled,
}

/// One input placed on the destination timeline.
#[derive(Debug, Clone)]
pub struct TimelineClip {
    /// Source file.
    pub source: PathBuf,
    /// Where the clip starts on the destination timeline, in seconds.
    pub start_secs: f64,
    /// Sub-range of the source in seconds, or the whole file when `None`.
    pub source_range: Option<(f64, f64)>,
}

/// An ordered set of clips on a shared time axis.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    clips: Vec<TimelineClip>,
}

impl Timeline {
    /// Build a timeline from explicitly placed clips.
    pub fn new(clips: Vec<TimelineClip>) -> Self {
        Self { clips }
    }

    /// Build a timeline placing each source back-to-back: every clip starts
    /// at the cumulative duration of the clips before it.
    pub fn sequential(sources: &[PathBuf]) -> Result<Self> {
        let mut clips = Vec::with_capacity(sources.len());
        let mut start_secs = 0.0;
        for source in sources {
            let info = probe(source)?;
            clips.push(TimelineClip {
                source: source.clone(),
                start_secs,
                source_range: None,
            });
            start_secs += info.duration_secs;
        }
        Ok(Self { clips })
    }

    /// The clips in timeline order.
    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    /// True when the timeline holds no clips.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Mixing/encoding delegate for timeline composition.
pub trait TimelineExporter {
    /// Produce `destination` from the timeline, checking `cancel` between
    /// units of work. Internal errors are reported as
    /// [`ExportOutcome::Failed`] with their reason, never panics.
    fn export(
        &self,
        timeline: &Timeline,
        automation: Option<&VolumeAutomation>,
        destination: &Path,
        cancel: &CancelToken,
    ) -> ExportOutcome;
}

/// In-process exporter that mixes clips into a WAV destination.
///
/// Clips are summed where they overlap; the automation curve is applied to
/// the mixed result over the destination timeline.
#[derive(Debug, Clone, Copy)]
pub struct WavTimelineExporter {
    /// Frames read and written per unit of work (and per cancellation check).
    pub block_frames: usize,
}

impl Default for WavTimelineExporter {
    fn default() -> Self {
        Self {
            block_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl WavTimelineExporter {
    fn try_export(
        &self,
        timeline: &Timeline,
        automation: Option<&VolumeAutomation>,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<ExportOutcome> {
        let Some(first) = timeline.clips().first() else {
            return Ok(ExportOutcome::Failed("timeline has no clips".into()));
        };
        let format = probe(&first.source)?.format;

        // Lay every clip out in frames and find the total length.
        let mut placements = Vec::with_capacity(timeline.clips().len());
        let mut total_frames: u64 = 0;
        for clip in timeline.clips() {
            let info = probe(&clip.source)?;
            if info.format != format {
                return Err(Error::FormatMismatch {
                    expected: format,
                    found: info.format,
                });
            }
            let (source_start, frames) = match clip.source_range {
                Some((from, to)) => (format.frame_at(from), format.frames_in(from, to)),
                None => (0, info.total_frames),
            };
            // Clip starts are usually cumulative durations (frames divided by
            // the rate); rounding recovers the exact frame where truncation
            // would place the clip one frame early and overlap its
            // predecessor.
            let dest_start = format.frame_near(clip.start_secs).max(0) as u64;
            total_frames = total_frames.max(dest_start + frames);
            placements.push((clip.source.clone(), source_start, frames, dest_start));
        }

        let channels = usize::from(format.channels);
        let mut mix: Vec<Vec<f32>> = (0..channels)
            .map(|_| vec![0.0; total_frames as usize])
            .collect();

        for (source, source_start, frames, dest_start) in placements {
            let mut reader = AudioFileReader::open(&source)?;
            let mut buffer = PcmBuffer::allocate(format, self.block_frames)?;
            let mut done: u64 = 0;
            while done < frames {
                if cancel.is_cancelled() {
                    return Ok(ExportOutcome::Cancelled);
                }
                let chunk = (frames - done).min(self.block_frames as u64);
                let read = reader.read(&mut buffer, chunk, source_start + done as i64)?;
                for (channel, mixed) in mix.iter_mut().enumerate() {
                    let offset = (dest_start + done) as usize;
                    for (i, &sample) in buffer.channel(channel).iter().enumerate() {
                        mixed[offset + i] += sample;
                    }
                }
                done += read as u64;
            }
        }

        if let Some(automation) = automation {
            for channel in &mut mix {
                automation.apply_to_channel(channel, 0.0, format.sample_rate);
            }
        }

        let mut writer = AudioFileWriter::create(destination, format)?;
        let mut buffer = PcmBuffer::allocate(format, self.block_frames)?;
        let mut written = 0usize;
        while written < total_frames as usize {
            if cancel.is_cancelled() {
                return Ok(ExportOutcome::Cancelled);
            }
            let chunk = (total_frames as usize - written).min(self.block_frames);
            for (channel, mixed) in mix.iter().enumerate() {
                buffer.channel_mut(channel)[..chunk]
                    .copy_from_slice(&mixed[written..written + chunk]);
            }
            buffer.set_frame_len(chunk);
            writer.write(&buffer)?;
            written += chunk;
        }
        writer.finalize()?;
        Ok(ExportOutcome::Completed)
    }
}

impl TimelineExporter for WavTimelineExporter {
    fn export(
        &self,
        timeline: &Timeline,
        automation: Option<&VolumeAutomation>,
        destination: &Path,
        cancel: &CancelToken,
    ) -> ExportOutcome {
        match self.try_export(timeline, automation, destination, cancel) {
            Ok(outcome) => outcome,
            Err(err) => ExportOutcome::Failed(err.to_string()),
        }
    }
}

/// Reassembles files into one continuous output, by either strategy.
#[derive(Debug, Clone, Copy)]
pub struct Composer {
    max_frames: usize,
    renderer: SegmentRenderer,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    /// Create a composer with default tuning.
    pub fn new() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            renderer: SegmentRenderer::new(),
        }
    }

    /// Override the per-pull maximum frame count for concatenation.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Override the render loop policy for concatenation.
    pub fn with_policy(mut self, policy: RenderPolicy) -> Self {
        self.renderer = SegmentRenderer::with_policy(policy);
        self
    }

    /// Raw sample concatenation through one long-lived render graph.
    ///
    /// Schedules each input in order and renders exactly its frame length
    /// before moving to the next, so frames accumulate with no gaps or
    /// overlaps. Every input must share the first input's format; a
    /// mismatch fails with [`Error::FormatMismatch`].
    pub fn concatenate(
        &self,
        inputs: &[PathBuf],
        chain: &ChainSpec,
        destination: &Path,
    ) -> Result<FrameCount> {
        let Some(first) = inputs.first() else {
            return Err(Error::InvalidPlan("no input files to concatenate".into()));
        };
        let format = probe(first)?.format;

        let mut graph = chain.build_graph(format)?;
        graph.enable_offline_mode(format, self.max_frames)?;
        graph.start()?;

        let mut writer = AudioFileWriter::create(destination, format)?;
        for input in inputs {
            let mut reader = AudioFileReader::open(input)?;
            if reader.format() != format {
                return Err(Error::FormatMismatch {
                    expected: format,
                    found: reader.format(),
                });
            }
            let ticket = graph.schedule_file(&mut reader)?;
            self.renderer
                .render(&mut graph, &mut writer, ticket.frames())?;
        }
        let total = writer.frames_written();
        writer.finalize()?;
        graph.stop();
        tracing::info!(
            inputs = inputs.len(),
            total_frames = total,
            destination = %destination.display(),
            "concatenation complete"
        );
        Ok(total)
    }

    /// Timeline composition, delegated to an exporter.
    ///
    /// The delegate's outcome is surfaced verbatim: failure becomes
    /// [`Error::ExportFailed`] with its reason, cancellation becomes
    /// [`Error::ExportCancelled`].
    pub fn compose(
        &self,
        timeline: &Timeline,
        automation: Option<&VolumeAutomation>,
        exporter: &dyn TimelineExporter,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        match exporter.export(timeline, automation, destination, cancel) {
            ExportOutcome::Completed => {
                tracing::info!(
                    clips = timeline.clips().len(),
                    destination = %destination.display(),
                    "timeline export complete"
                );
                Ok(())
            }
            ExportOutcome::Failed(reason) => Err(Error::ExportFailed(reason)),
            ExportOutcome::Cancelled => Err(Error::ExportCancelled),
        }
    }
}
