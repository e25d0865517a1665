//! Parameter plumbing between the control and render contexts.
//!
//! The controller writes [`AudioParam`] cells; the render side turns each
//! cell into a [`ParamView`] once per block through [`ParamAutomation`].
//! DSP code only ever sees views and assumes values are already clamped.

/*
Block-Constant vs Per-Sample Parameters
=======================================

A host hands a processor one array per parameter for every block:

  length 1      the value is constant for the whole block ("block-constant")
  length N      one value per sample ("per-sample", sample-accurate automation)

Processors read both shapes the same way:

    value_at(s) = values[s] if present, otherwise values[0]

`ParamView` is that rule as a type. `Constant(v)` is the length-1 case without
the slice; `PerSample(&[..])` is the automated case. A length-1 `PerSample`
behaves exactly like `Constant`.

When do we hand out a per-sample view?
--------------------------------------

Only while a parameter is ramping toward a new target. A settled parameter is
always block-constant, which lets processors hoist work (coefficient updates,
for instance) out of the sample loop.
*/

mod automation;
mod cell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{BusError, Result};

pub use automation::ParamAutomation;
pub use cell::AudioParam;

/// How often a host may change a parameter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationRate {
    /// May change every sample.
    Audio,
    /// Constant across a block.
    Control,
}

/// Static description of one named parameter.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub rate: AutomationRate,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl ParamDescriptor {
    /// Describe an audio-rate parameter.
    pub const fn audio(name: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            rate: AutomationRate::Audio,
            default,
            min,
            max,
        }
    }

    /// Clamp `value` into the declared range. Non-finite input falls back to
    /// the default, even where the range itself is unbounded.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Parameter values for one block, as seen by a processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamView<'a> {
    Constant(f32),
    PerSample(&'a [f32]),
}

impl ParamView<'_> {
    /// Value for sample `index`, falling back to the first value.
    #[inline]
    pub fn at(&self, index: usize) -> f32 {
        match self {
            ParamView::Constant(value) => *value,
            ParamView::PerSample(values) => values
                .get(index)
                .or_else(|| values.first())
                .copied()
                .unwrap_or(0.0),
        }
    }

    /// Boolean reading of a gate parameter (any non-zero value is "on").
    #[inline]
    pub fn gate_at(&self, index: usize) -> bool {
        self.at(index) != 0.0
    }

    /// True when every sample of the block sees the same value.
    pub fn is_constant(&self) -> bool {
        match self {
            ParamView::Constant(_) => true,
            ParamView::PerSample(values) => values.len() <= 1,
        }
    }
}

impl From<f32> for ParamView<'_> {
    fn from(value: f32) -> Self {
        ParamView::Constant(value)
    }
}

impl<'a> From<&'a [f32]> for ParamView<'a> {
    fn from(values: &'a [f32]) -> Self {
        ParamView::PerSample(values)
    }
}

/// Anything exposing named parameters to the control layer.
pub trait ParamSource {
    fn parameter(&self, name: &str) -> Option<&AudioParam>;

    /// Set a parameter immediately, returning the clamped value.
    fn set_param(&self, name: &str, value: f32) -> Result<f32> {
        self.parameter(name)
            .map(|param| param.set_value(value))
            .ok_or_else(|| BusError::UnknownParameter(name.to_owned()))
    }

    /// Ramp a parameter toward `value` with the given time constant (seconds).
    fn set_param_target(&self, name: &str, value: f32, time_constant: f32) -> Result<f32> {
        self.parameter(name)
            .map(|param| param.set_target(value, time_constant))
            .ok_or_else(|| BusError::UnknownParameter(name.to_owned()))
    }
}
