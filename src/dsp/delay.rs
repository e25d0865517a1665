/*
Circular Delay Line
===================

A delay line is a ring of samples with a write cursor that walks forward one
slot per sample. Looking N slots behind the cursor gives the input from N
samples ago.

Read before write
-----------------

For every sample we first read, then write:

  1. read:  i1 = (cursor - floor(frames_back)) mod len
            i2 = (i1 - 1) mod len
            out = buf[i1] + (buf[i2] - buf[i1]) * frac(frames_back)

  2. write: cursor = (cursor + 1) mod len
            buf[cursor] = sample

Because the cursor advances before the write, the slot at `cursor` always
holds the *previous* sample when we read. A read with `frames_back = 0`
therefore returns last sample's input, and an input sample re-appears at the
output `frames_back + 1` samples later.

Linear interpolation
--------------------

Fractional delays blend the two neighbours around the requested position.
`frac = 0` reads `buf[i1]` exactly, `frac -> 1` slides toward the older
`buf[i2]`. This keeps delay-time automation smooth instead of snapping between
whole-sample positions.
*/

/// One channel of delay memory.
///
/// The buffer is sized once at construction and never resized, so reads and
/// writes are O(1) and never allocate.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a silent delay line holding `length` samples (at least one).
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            write_pos: 0,
        }
    }

    /// Allocate enough memory for `max_seconds` at `sample_rate`.
    pub fn for_duration(max_seconds: f32, sample_rate: f32) -> Self {
        let length = (max_seconds.max(0.0) * sample_rate).ceil() as usize;
        Self::new(length)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Read `frames_back` samples behind the write cursor, interpolating
    /// linearly between the two nearest stored samples.
    #[inline]
    pub fn read(&self, frames_back: f32) -> f32 {
        let len = self.buffer.len();
        let frames_back = frames_back.max(0.0);

        let whole = frames_back as usize;
        let frac = frames_back - whole as f32;

        let i1 = (self.write_pos + len - whole % len) % len;
        let i2 = (i1 + len - 1) % len;

        let s1 = self.buffer[i1];
        let s2 = self.buffer[i2];

        s1 + (s2 - s1) * frac
    }

    /// Advance the cursor, then store `sample` at the new position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.buffer[self.write_pos] = sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_buffer_from_duration() {
        let line = DelayLine::for_duration(5.0, 48_000.0);
        assert_eq!(line.len(), 240_000);
    }

    #[test]
    fn zero_length_request_still_allocates_one_slot() {
        let line = DelayLine::new(0);
        assert_eq!(line.len(), 1);
        assert_eq!(line.read(3.0), 0.0);
    }

    #[test]
    fn write_advances_cursor_before_storing() {
        let mut line = DelayLine::new(4);
        assert_eq!(line.write_pos(), 0);

        line.write(1.0);
        assert_eq!(line.write_pos(), 1);
        // The sample just written sits under the cursor
        assert_eq!(line.read(0.0), 1.0);
    }

    #[test]
    fn whole_sample_reads_look_back_in_time() {
        let mut line = DelayLine::new(8);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            line.write(sample);
        }

        assert_eq!(line.read(0.0), 4.0);
        assert_eq!(line.read(1.0), 3.0);
        assert_eq!(line.read(3.0), 1.0);
    }

    #[test]
    fn fractional_reads_interpolate_toward_older_sample() {
        let mut line = DelayLine::new(8);
        line.write(0.0);
        line.write(1.0);

        // Halfway between the newest (1.0) and the one before it (0.0)
        assert!((line.read(0.5) - 0.5).abs() < 1e-6);
        assert!((line.read(0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn cursor_wraps_around_the_ring() {
        let mut line = DelayLine::new(3);
        for sample in [1.0, 2.0, 3.0, 4.0, 5.0] {
            line.write(sample);
        }

        assert_eq!(line.write_pos(), 2);
        assert_eq!(line.read(0.0), 5.0);
        assert_eq!(line.read(1.0), 4.0);
        assert_eq!(line.read(2.0), 3.0);
    }

    #[test]
    fn full_length_read_wraps_to_cursor() {
        let mut line = DelayLine::new(4);
        line.write(7.0);
        assert_eq!(line.read(4.0), line.read(0.0));
    }
}
