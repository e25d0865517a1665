use std::sync::Arc;

use super::{AudioParam, ParamView};
use crate::MAX_BLOCK_SIZE;

/*
Exponential Approach ("set target at time")
===========================================

When the controller asks for a smoothed change, the parameter does not jump.
It closes a fixed fraction of the remaining distance every sample:

    v[n+1] = target + (v[n] - target) * k
    k      = exp(-1 / (time_constant * sample_rate))

After one time constant the parameter has covered ~63% of the way, after five
~99.3%. Once the remaining distance drops below a tiny epsilon we snap onto the
target so the parameter becomes block-constant again.

The controller may change the target at any moment; we only look at it once
per block, so a block never sees two different targets.
*/

const SNAP_EPSILON: f32 = 1e-6;

/// Render-side companion of an [`AudioParam`].
///
/// Owns the parameter's current (smoothed) value and a pre-allocated ramp
/// buffer, so producing a per-sample view never allocates.
pub struct ParamAutomation {
    param: Arc<AudioParam>,
    current: f32,
    sample_rate: f32,
    ramp: Vec<f32>,
}

impl ParamAutomation {
    pub fn new(param: Arc<AudioParam>, sample_rate: f32) -> Self {
        Self {
            current: param.value(),
            param,
            sample_rate,
            ramp: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// The value reached at the end of the last rendered block.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Advance the parameter by `frames` samples and describe the block.
    pub fn render(&mut self, frames: usize) -> ParamView<'_> {
        let (target, time_constant) = self.param.snapshot();

        if !self.current.is_finite() {
            self.current = target;
        }

        if time_constant <= 0.0 || self.current == target || frames == 0 {
            self.current = target;
            return ParamView::Constant(target);
        }

        let k = (-1.0 / (time_constant * self.sample_rate)).exp();
        let snap = SNAP_EPSILON * target.abs().max(1.0);
        let frames = frames.min(MAX_BLOCK_SIZE);

        for value in &mut self.ramp[..frames] {
            self.current = target + (self.current - target) * k;
            if !self.current.is_finite() || (self.current - target).abs() <= snap {
                self.current = target;
            }
            *value = self.current;
        }

        ParamView::PerSample(&self.ramp[..frames])
    }
}
