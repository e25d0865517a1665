//! Realtime-safe effect chain bus.
//!
//! An [`EffectBus`] holds eight ordered effect slots wired between an input
//! and an output tap. Slots are filled with [`EffectHandle`]s (a fractional
//! feedback delay or a biquad low-pass); the matching [`BusRenderer`] runs on
//! the audio thread and picks up topology changes between blocks.
//!
//! ```ignore
//! use effect_bus::{BusConfig, EffectBus, EffectHandle, ParamSource, SlotIndex};
//!
//! let (mut bus, mut renderer) = EffectBus::new(BusConfig::default());
//! let delay = EffectHandle::delay(2, 48_000.0);
//! delay.set_param("time", 0.25)?;
//! bus.assign(SlotIndex::FIRST, Some(&delay))?;
//! // audio thread: renderer.render(&input, &mut output);
//! ```

pub mod block;
pub mod bus; // Effect chain ownership and rendering
pub mod dsp; // Delay line and biquad primitives
pub mod error;
pub mod param; // Parameter cells, views and automation
pub mod unit; // Effect units and their processing nodes

pub use block::AudioBlock;
pub use bus::{
    slot::{SlotIndex, NUM_EFFECT_SLOTS},
    topology::{Edge, EdgeSet, NodeId},
    BusConfig, BusRenderer, EffectBus, ScriptValue,
};
pub use error::{BusError, Result};
pub use param::{AudioParam, ParamDescriptor, ParamSource, ParamView};
pub use unit::{EffectHandle, EffectKind, EffectNode};

/// Largest block the render context processes in one call.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Time constant (seconds) used when the controller ramps a smoothed parameter.
pub const PARAM_TIME_CONSTANT: f32 = 0.01;
