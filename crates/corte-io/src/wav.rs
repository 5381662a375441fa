//! WAV reading with frame-indexed access, and append-only writing.

use crate::{Error, Result};
use corte_core::{AudioFormat, FrameCount, FramePosition, PcmBuffer};
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Metadata extracted from a WAV header without loading sample data.
#[derive(Debug, Clone)]
pub struct AudioFileInfo {
    /// Sample rate and channel layout.
    pub format: AudioFormat,
    /// Total number of sample frames.
    pub total_frames: FrameCount,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
}

/// Read WAV metadata without loading samples.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<AudioFileInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let format = format_of(spec)?;
    let total_frames = reader.duration() as FrameCount;
    Ok(AudioFileInfo {
        format,
        total_frames,
        duration_secs: total_frames as f64 / format.sample_rate,
        bits_per_sample: spec.bits_per_sample,
    })
}

fn format_of(spec: hound::WavSpec) -> Result<AudioFormat> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) | (SampleFormat::Int, 8 | 16 | 24 | 32) => {}
        (format, bits) => {
            return Err(Error::UnsupportedFormat(format!(
                "{bits}-bit {format:?} samples"
            )));
        }
    }
    AudioFormat::new(f64::from(spec.sample_rate), spec.channels).map_err(Error::from)
}

/// Open WAV source supporting frame-indexed random-access reads.
pub struct AudioFileReader {
    reader: WavReader<BufReader<File>>,
    format: AudioFormat,
    total_frames: FrameCount,
    sample_format: SampleFormat,
    bits_per_sample: u16,
}

impl AudioFileReader {
    /// Open a WAV file for reading.
    ///
    /// Fails with [`Error::NotFound`] if the path does not exist and
    /// [`Error::UnsupportedFormat`] for encodings corte cannot normalize.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let format = format_of(spec)?;
        let total_frames = reader.duration() as FrameCount;
        tracing::debug!(
            path = %path.display(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            total_frames,
            "opened audio file for reading"
        );
        Ok(Self {
            reader,
            format,
            total_frames,
            sample_format: spec.sample_format,
            bits_per_sample: spec.bits_per_sample,
        })
    }

    /// The file's audio format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Total number of sample frames in the file.
    pub fn total_frames(&self) -> FrameCount {
        self.total_frames
    }

    /// Read up to `frame_count` frames starting at `at_frame` into `buffer`.
    ///
    /// Returns the number of frames actually read, which is less than
    /// requested only at end-of-file. Fails with [`Error::OutOfRange`] when
    /// the requested range extends past the end of the file, so a caller can
    /// never silently get a truncated mid-file read.
    pub fn read(
        &mut self,
        buffer: &mut PcmBuffer,
        frame_count: FrameCount,
        at_frame: FramePosition,
    ) -> Result<usize> {
        if buffer.format() != self.format {
            return Err(Error::FormatMismatch {
                expected: self.format,
                found: buffer.format(),
            });
        }
        if frame_count == 0 {
            buffer.set_frame_len(0);
            return Ok(0);
        }
        if at_frame < 0 || at_frame as u64 + frame_count > self.total_frames {
            return Err(Error::OutOfRange {
                position: at_frame,
                requested: frame_count,
                total: self.total_frames,
            });
        }
        if frame_count > buffer.capacity() as u64 {
            return Err(Error::BufferTooSmall {
                capacity: buffer.capacity(),
                requested: frame_count,
            });
        }

        self.reader.seek(at_frame as u32)?;

        let channels = usize::from(self.format.channels);
        let wanted = frame_count as usize * channels;
        let mut interleaved = Vec::with_capacity(wanted);
        match self.sample_format {
            SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    interleaved.push(sample?);
                }
            }
            SampleFormat::Int => {
                let max_val = (1i64 << (self.bits_per_sample - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(wanted) {
                    interleaved.push(sample? as f32 / max_val);
                }
            }
        }

        let frames_read = interleaved.len() / channels;
        for channel in 0..channels {
            let dst = buffer.channel_mut(channel);
            for frame in 0..frames_read {
                dst[frame] = interleaved[frame * channels + channel];
            }
        }
        buffer.set_frame_len(frames_read);
        Ok(frames_read)
    }

    /// Read the half-open range `[from_secs, to_secs)` into a fresh buffer.
    ///
    /// A zero-or-negative range yields an empty buffer, not an error.
    pub fn read_seconds(&mut self, from_secs: f64, to_secs: f64) -> Result<PcmBuffer> {
        let frame_count = self.format.frames_in(from_secs, to_secs);
        let mut buffer =
            PcmBuffer::allocate(self.format, (frame_count as usize).max(1))?;
        if frame_count > 0 {
            self.read(&mut buffer, frame_count, self.format.frame_at(from_secs))?;
        }
        Ok(buffer)
    }
}

/// Open WAV destination with an exclusive append cursor.
///
/// Written as 32-bit float WAV; creating a writer truncates any existing
/// file at the path. Call [`AudioFileWriter::finalize`] to flush the header;
/// dropping without finalizing leaves best-effort cleanup to `hound`.
pub struct AudioFileWriter {
    writer: WavWriter<BufWriter<File>>,
    format: AudioFormat,
    frames_written: FrameCount,
}

impl AudioFileWriter {
    /// Create (or truncate) a WAV file for sequential writing.
    pub fn create<P: AsRef<Path>>(path: P, format: AudioFormat) -> Result<Self> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate as u32,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec)?;
        tracing::debug!(
            path = %path.display(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "created audio file for writing"
        );
        Ok(Self {
            writer,
            format,
            frames_written: 0,
        })
    }

    /// The destination's audio format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> FrameCount {
        self.frames_written
    }

    /// Append exactly `buffer.frame_len()` frames.
    pub fn write(&mut self, buffer: &PcmBuffer) -> Result<()> {
        if buffer.format() != self.format {
            return Err(Error::FormatMismatch {
                expected: self.format,
                found: buffer.format(),
            });
        }
        let channels = buffer.channel_count();
        for frame in 0..buffer.frame_len() {
            for channel in 0..channels {
                self.writer.write_sample(buffer.channel(channel)[frame])?;
            }
        }
        self.frames_written += buffer.frame_len() as FrameCount;
        Ok(())
    }

    /// Flush sample data and finalize the WAV header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
