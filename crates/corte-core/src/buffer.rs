//! Fixed-capacity planar PCM buffer.

use crate::{AudioFormat, Error, Result};

/// A fixed-capacity sample buffer with a valid frame length.
///
/// Samples are stored planar (one `Vec<f32>` per channel), each channel
/// `capacity` frames long. `frame_len` tracks how many leading frames hold
/// valid audio; it is mutated by read and render operations and consumed by
/// write operations. Frames are always written lock-step across channels:
/// there is no way to advance one channel without the others.
pub struct PcmBuffer {
    format: AudioFormat,
    capacity: usize,
    frame_len: usize,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    /// Allocate a zero-filled buffer.
    ///
    /// Fails with [`Error::Allocation`] if `capacity` is zero, and with
    /// [`Error::InvalidFormat`] if the format cannot describe real audio.
    pub fn allocate(format: AudioFormat, capacity: usize) -> Result<Self> {
        if !format.is_valid() {
            return Err(Error::InvalidFormat {
                sample_rate: format.sample_rate,
                channels: format.channels,
            });
        }
        if capacity == 0 {
            return Err(Error::Allocation(
                "capacity must be at least one frame".into(),
            ));
        }
        let channels = (0..format.channels).map(|_| vec![0.0; capacity]).collect();
        Ok(Self {
            format,
            capacity,
            frame_len: 0,
            channels,
        })
    }

    /// The format this buffer was allocated for.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Maximum number of frames the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of leading frames holding valid audio.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// True if no frames are valid.
    pub fn is_empty(&self) -> bool {
        self.frame_len == 0
    }

    /// Set the valid frame count after a read or render filled the store.
    ///
    /// # Panics
    ///
    /// Panics if `frame_len > capacity`; the invariant `frame_len <= capacity`
    /// is unconditional.
    pub fn set_frame_len(&mut self, frame_len: usize) {
        assert!(
            frame_len <= self.capacity,
            "frame_len {frame_len} exceeds capacity {}",
            self.capacity
        );
        self.frame_len = frame_len;
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Valid samples of one channel (`frame_len` frames).
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel][..self.frame_len]
    }

    /// Full backing store of one channel (`capacity` frames), for filling.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    /// Zero all samples and mark the buffer empty.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
        self.frame_len = 0;
    }

    /// Copy one frame from another buffer, lock-step across channels.
    ///
    /// # Panics
    ///
    /// Panics if the channel counts differ or either index is out of range.
    pub fn copy_frame_from(&mut self, dst_frame: usize, src: &PcmBuffer, src_frame: usize) {
        assert_eq!(self.channels.len(), src.channels.len());
        for (dst, src) in self.channels.iter_mut().zip(src.channels.iter()) {
            dst[dst_frame] = src[src_frame];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> AudioFormat {
        AudioFormat::new(48000.0, 2).unwrap()
    }

    #[test]
    fn allocate_zero_filled() {
        let buf = PcmBuffer::allocate(stereo(), 256).unwrap();
        assert_eq!(buf.capacity(), 256);
        assert_eq!(buf.frame_len(), 0);
        assert_eq!(buf.channel_count(), 2);
        assert!(buf.channels.iter().all(|c| c.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn allocate_rejects_zero_capacity() {
        assert!(matches!(
            PcmBuffer::allocate(stereo(), 0),
            Err(Error::Allocation(_))
        ));
    }

    #[test]
    fn allocate_rejects_invalid_format() {
        let bad = AudioFormat {
            sample_rate: 0.0,
            channels: 2,
        };
        assert!(matches!(
            PcmBuffer::allocate(bad, 64),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn frame_len_bounded_by_capacity() {
        let mut buf = PcmBuffer::allocate(stereo(), 64).unwrap();
        buf.set_frame_len(64);
        assert_eq!(buf.frame_len(), 64);
    }

    #[test]
    #[should_panic]
    fn frame_len_beyond_capacity_panics() {
        let mut buf = PcmBuffer::allocate(stereo(), 64).unwrap();
        buf.set_frame_len(65);
    }

    #[test]
    fn clear_resets_length() {
        let mut buf = PcmBuffer::allocate(stereo(), 64).unwrap();
        buf.channel_mut(0)[0] = 1.0;
        buf.set_frame_len(1);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.channel_mut(0)[0], 0.0);
    }

    #[test]
    fn copy_frame_moves_all_channels() {
        let mut a = PcmBuffer::allocate(stereo(), 4).unwrap();
        let mut b = PcmBuffer::allocate(stereo(), 4).unwrap();
        b.channel_mut(0)[2] = 0.25;
        b.channel_mut(1)[2] = -0.5;
        b.set_frame_len(3);
        a.copy_frame_from(0, &b, 2);
        a.set_frame_len(1);
        assert_eq!(a.channel(0)[0], 0.25);
        assert_eq!(a.channel(1)[0], -0.5);
    }
}
