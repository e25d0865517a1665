//! Planar multi-channel sample blocks.

use crate::MAX_BLOCK_SIZE;

/// A block of audio, one contiguous lane of `MAX_BLOCK_SIZE` samples per
/// channel.
///
/// Storage is allocated once in [`AudioBlock::new`]; resizing the block with
/// [`set_frames`](AudioBlock::set_frames) only moves the valid-frame marker,
/// so blocks can be reused on the render thread without allocating.
#[derive(Debug, Clone, Default)]
pub struct AudioBlock {
    data: Vec<f32>,
    channels: usize,
    frames: usize,
}

impl AudioBlock {
    /// Allocate a silent block with zero valid frames.
    pub fn new(channels: usize) -> Self {
        Self {
            data: vec![0.0; channels * MAX_BLOCK_SIZE],
            channels,
            frames: 0,
        }
    }

    /// Allocate a silent block with `frames` valid frames.
    pub fn with_frames(channels: usize, frames: usize) -> Self {
        let mut block = Self::new(channels);
        block.set_frames(frames);
        block
    }

    /// Build a block from per-channel sample slices.
    ///
    /// All lanes take the length of the shortest slice, capped at
    /// `MAX_BLOCK_SIZE`.
    pub fn from_channels(lanes: &[&[f32]]) -> Self {
        let frames = lanes
            .iter()
            .map(|lane| lane.len())
            .min()
            .unwrap_or(0)
            .min(MAX_BLOCK_SIZE);

        let mut block = Self::with_frames(lanes.len(), frames);
        for (c, lane) in lanes.iter().enumerate() {
            block.channel_mut(c).copy_from_slice(&lane[..frames]);
        }
        block
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Set the number of valid frames (clamped to `MAX_BLOCK_SIZE`).
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(MAX_BLOCK_SIZE);
    }

    /// Valid samples of one channel.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * MAX_BLOCK_SIZE;
        &self.data[start..start + self.frames]
    }

    /// Valid samples of one channel, mutable.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * MAX_BLOCK_SIZE;
        &mut self.data[start..start + self.frames]
    }

    /// Zero the valid region of every channel.
    pub fn clear(&mut self) {
        for c in 0..self.channels {
            self.channel_mut(c).fill(0.0);
        }
    }

    /// Copy `source` into this block, taking over its frame count.
    ///
    /// Channels missing from `source` are zeroed.
    pub fn copy_from(&mut self, source: &AudioBlock) {
        self.set_frames(source.frames);
        for c in 0..self.channels {
            if c < source.channels {
                self.channel_mut(c).copy_from_slice(source.channel(c));
            } else {
                self.channel_mut(c).fill(0.0);
            }
        }
    }

    /// Fill the block from an interleaved buffer holding `channels` lanes.
    pub fn read_interleaved(&mut self, interleaved: &[f32], channels: usize) {
        let channels = channels.max(1);
        self.set_frames(interleaved.len() / channels);
        for c in 0..self.channels {
            let lane = self.channel_mut(c);
            if c < channels {
                for (s, frame) in lane.iter_mut().zip(interleaved.chunks_exact(channels)) {
                    *s = frame[c];
                }
            } else {
                lane.fill(0.0);
            }
        }
    }

    /// Write the block into an interleaved buffer holding `channels` lanes.
    ///
    /// Output lanes beyond this block's channel count receive silence.
    pub fn write_interleaved(&self, interleaved: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for (s, frame) in interleaved
            .chunks_exact_mut(channels)
            .take(self.frames)
            .enumerate()
        {
            for (c, out) in frame.iter_mut().enumerate() {
                *out = if c < self.channels {
                    self.data[c * MAX_BLOCK_SIZE + s]
                } else {
                    0.0
                };
            }
        }
    }
}
