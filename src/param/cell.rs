use std::sync::atomic::{AtomicU64, Ordering};

use super::ParamDescriptor;

/// A parameter the control context writes and the render context reads.
///
/// Target and time constant are packed as two `f32` bit patterns into one
/// atomic word, so setting a value never blocks the audio thread and a reader
/// never pairs a new target with an old time constant. A time constant of
/// zero means "jump"; anything above zero asks the render side to approach
/// the target exponentially.
#[derive(Debug)]
pub struct AudioParam {
    descriptor: ParamDescriptor,
    state: AtomicU64,
}

fn pack(target: f32, time_constant: f32) -> u64 {
    (u64::from(target.to_bits()) << 32) | u64::from(time_constant.to_bits())
}

fn unpack(word: u64) -> (f32, f32) {
    (f32::from_bits((word >> 32) as u32), f32::from_bits(word as u32))
}

impl AudioParam {
    pub fn new(descriptor: ParamDescriptor) -> Self {
        Self {
            state: AtomicU64::new(pack(descriptor.default, 0.0)),
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &ParamDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// The latest value requested by the controller.
    pub fn value(&self) -> f32 {
        self.snapshot().0
    }

    /// Jump to `value` at the next block. Returns the clamped value.
    pub fn set_value(&self, value: f32) -> f32 {
        self.store(value, 0.0)
    }

    /// Approach `value` with time constant `time_constant` seconds.
    /// Returns the clamped target.
    pub fn set_target(&self, value: f32, time_constant: f32) -> f32 {
        self.store(value, time_constant.max(0.0))
    }

    /// `(target, time_constant)` as one per-block reading.
    pub(crate) fn snapshot(&self) -> (f32, f32) {
        unpack(self.state.load(Ordering::Acquire))
    }

    fn store(&self, value: f32, time_constant: f32) -> f32 {
        let value = self.descriptor.clamp(value);
        let time_constant = if time_constant.is_finite() {
            time_constant
        } else {
            0.0
        };
        self.state.store(pack(value, time_constant), Ordering::Release);
        value
    }
}
