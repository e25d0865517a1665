use std::f64::consts::PI;

/*
Biquad Low-Pass (RBJ Cookbook)
==============================

A biquad is a second-order recursive filter. Each output sample is a weighted
sum of the current input, the two previous inputs and the two previous
outputs:

    y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]

The five weights come from Robert Bristow-Johnson's "Audio EQ Cookbook"
low-pass design, normalised by a0 so the recursion needs no division:

    w0     = 2*pi*cutoff / sample_rate
    alpha  = sin(w0) / (2*q)
    a0     = 1 + alpha
    a1     = -2*cos(w0)        / a0
    a2     = (1 - alpha)       / a0
    b0     = (1 - cos(w0)) / 2 / a0
    b1     = (1 - cos(w0))     / a0
    b2     = b0

Stability
---------

For cutoff in (0, sample_rate/2) and q > 0 both poles sit strictly inside the
unit circle, so the filter cannot blow up. The parameter layer keeps cutoff in
[10, min(sr/2, 20000)] and q in [1, 100].

Why cache coefficients?
-----------------------

sin() and cos() per sample are the expensive part. Coefficients only change
when (cutoff, q) change, so `CoefficientCache` remembers the last pair and
skips the trig when it sees the same pair again. A sample-rate automated
parameter that holds still costs one comparison per sample.
*/

/// Normalised biquad coefficients (a0 already divided out).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    /// RBJ second-order low-pass.
    pub fn lowpass(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz as f64 / sample_rate as f64;
        let alpha = w0.sin() / (2.0 * q as f64);
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha;
        let b0 = (1.0 - cos_w0) / 2.0 / a0;

        Self {
            b0: b0 as f32,
            b1: ((1.0 - cos_w0) / a0) as f32,
            b2: b0 as f32,
            a1: (-2.0 * cos_w0 / a0) as f32,
            a2: ((1.0 - alpha) / a0) as f32,
        }
    }
}

/// Low-pass coefficients keyed by the last `(cutoff, q)` pair.
pub struct CoefficientCache {
    coefficients: BiquadCoefficients,
    last: Option<(f32, f32)>,
    sample_rate: f32,
    recomputations: u64,
}

impl CoefficientCache {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            coefficients: BiquadCoefficients::default(),
            last: None,
            sample_rate,
            recomputations: 0,
        }
    }

    /// Coefficients for `(cutoff_hz, q)`, recomputed only if the pair changed.
    #[inline]
    pub fn update(&mut self, cutoff_hz: f32, q: f32) -> BiquadCoefficients {
        if self.last != Some((cutoff_hz, q)) {
            self.coefficients = BiquadCoefficients::lowpass(cutoff_hz, q, self.sample_rate);
            self.last = Some((cutoff_hz, q));
            self.recomputations += 1;
        }
        self.coefficients
    }

    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coefficients
    }

    /// How many times the coefficients have actually been recomputed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

/// Per-channel filter memory: two past inputs, two past outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    /// Filter one sample and shift the history.
    #[inline]
    pub fn process(&mut self, x: f32, c: &BiquadCoefficients) -> f32 {
        let y0 = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;

        self.y2 = self.y1;
        self.y1 = y0;

        y0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_has_unity_dc_gain() {
        let c = BiquadCoefficients::lowpass(1_000.0, 1.0, 48_000.0);
        let dc = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
        assert!((dc - 1.0).abs() < 1e-4, "dc gain {dc}");
    }

    #[test]
    fn b2_mirrors_b0_and_b1_doubles_it() {
        let c = BiquadCoefficients::lowpass(2_500.0, 4.0, 44_100.0);
        assert_eq!(c.b0, c.b2);
        assert!((c.b1 - 2.0 * c.b0).abs() < 1e-6);
    }

    #[test]
    fn cache_skips_unchanged_pairs() {
        let mut cache = CoefficientCache::new(48_000.0);
        assert_eq!(cache.recomputations(), 0);

        let first = cache.update(800.0, 2.0);
        for _ in 0..1_000 {
            assert_eq!(cache.update(800.0, 2.0), first);
        }
        assert_eq!(cache.recomputations(), 1);

        cache.update(900.0, 2.0);
        cache.update(900.0, 3.0);
        cache.update(900.0, 3.0);
        assert_eq!(cache.recomputations(), 3);
    }

    #[test]
    fn state_converges_to_step_input() {
        let c = BiquadCoefficients::lowpass(500.0, 1.0, 48_000.0);
        let mut state = BiquadState::default();

        let mut y = 0.0;
        for _ in 0..4_800 {
            y = state.process(1.0, &c);
        }
        assert!((y - 1.0).abs() < 1e-3, "settled at {y}");
    }

    #[test]
    fn history_shifts_every_sample() {
        let c = BiquadCoefficients {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        };
        let mut state = BiquadState::default();
        state.process(0.5, &c);
        state.process(0.25, &c);

        assert_eq!(
            state,
            BiquadState {
                x1: 0.25,
                x2: 0.5,
                y1: 0.25,
                y2: 0.5,
            }
        );
    }
}
