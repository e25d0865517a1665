//! Test signal for the demo: short decaying saw plucks on a fixed pattern.

const PATTERN: [f32; 8] = [110.0, 0.0, 165.0, 0.0, 220.0, 146.83, 0.0, 130.81];

pub struct Plucks {
    sample_rate: f32,
    step_len: usize,
    position: usize,
    step: usize,
    phase: f32,
    freq: f32,
    level: f32,
    decay: f32,
}

impl Plucks {
    pub fn new(sample_rate: f32, bpm: f32) -> Self {
        // Eighth notes
        let step_len = (sample_rate * 30.0 / bpm) as usize;
        Self {
            sample_rate,
            step_len: step_len.max(1),
            position: 0,
            step: 0,
            phase: 0.0,
            freq: 0.0,
            level: 0.0,
            decay: (-1.0 / (0.15 * sample_rate)).exp(),
        }
    }

    /// Fill one interleaved buffer, same signal on every channel.
    pub fn fill(&mut self, interleaved: &mut [f32], channels: usize) {
        for frame in interleaved.chunks_exact_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }

    fn next_sample(&mut self) -> f32 {
        if self.position == 0 {
            let freq = PATTERN[self.step % PATTERN.len()];
            if freq > 0.0 {
                self.freq = freq;
                self.level = 0.4;
                self.phase = 0.0;
            }
            self.step += 1;
        }
        self.position = (self.position + 1) % self.step_len;

        self.phase = (self.phase + self.freq / self.sample_rate).fract();
        self.level *= self.decay;
        (2.0 * self.phase - 1.0) * self.level
    }
}
