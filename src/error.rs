use thiserror::Error;

use crate::bus::slot::{SlotIndex, NUM_EFFECT_SLOTS};

/// Errors reported synchronously to the control context.
///
/// Nothing here ever reaches the render path; `BusRenderer::render` is
/// infallible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusError {
    #[error("slot value must be an effect or empty")]
    InvalidSlotValue,

    #[error("effect slot index {0} is out of range (0..{NUM_EFFECT_SLOTS})")]
    IndexOutOfRange(usize),

    #[error("effect is already assigned to slot {0}")]
    UnitAlreadyAssigned(SlotIndex),

    #[error("render queue is full, topology change not applied")]
    QueueFull,

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
}

pub type Result<T> = std::result::Result<T, BusError>;
