//! Audio file I/O for corte.
//!
//! This crate is the file collaborator boundary of the render core:
//!
//! - [`AudioFileReader`] - frame-indexed random-access reads from a WAV source
//! - [`AudioFileWriter`] - sequential append writes to a WAV destination
//! - [`probe`] - format and length metadata without loading samples
//!
//! All sample data crosses the boundary as planar `f32` in a
//! [`PcmBuffer`](corte_core::PcmBuffer); integer WAV files are normalized on
//! read. A writer holds an exclusive append cursor for its destination;
//! callers must not open two writers on one path.

mod wav;

pub use wav::{AudioFileInfo, AudioFileReader, AudioFileWriter, probe};

use corte_core::AudioFormat;
use std::path::PathBuf;

/// Error types for audio file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source file does not exist.
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but its encoding is not supported.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A read was requested beyond the end of the file.
    #[error(
        "read out of range: {requested} frame(s) at frame {position}, but the file has {total}"
    )]
    OutOfRange {
        /// Requested start frame.
        position: i64,
        /// Requested frame count.
        requested: u64,
        /// Total frames in the file.
        total: u64,
    },

    /// A buffer or file with a different format was passed to a handle.
    #[error("format mismatch: expected {expected:?}, found {found:?}")]
    FormatMismatch {
        /// Format the handle was opened with.
        expected: AudioFormat,
        /// Format actually supplied.
        found: AudioFormat,
    },

    /// The destination buffer cannot hold the requested frames.
    #[error("buffer too small: capacity {capacity} frame(s), read requested {requested}")]
    BufferTooSmall {
        /// Buffer capacity in frames.
        capacity: usize,
        /// Frames requested.
        requested: u64,
    },

    /// WAV container error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Buffer allocation or format error from the core.
    #[error(transparent)]
    Core(#[from] corte_core::Error),
}

/// Convenience result type for audio file operations.
pub type Result<T> = std::result::Result<T, Error>;
