use std::fmt;

use crate::error::BusError;

/// Number of effect slots on every bus.
pub const NUM_EFFECT_SLOTS: usize = 8;

/// Position of an effect slot, guaranteed to be in `0..NUM_EFFECT_SLOTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: SlotIndex = SlotIndex(0);
    pub const LAST: SlotIndex = SlotIndex(NUM_EFFECT_SLOTS as u8 - 1);

    /// `Some` when `index` names a slot.
    pub const fn new(index: usize) -> Option<Self> {
        if index < NUM_EFFECT_SLOTS {
            Some(SlotIndex(index as u8))
        } else {
            None
        }
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Every slot in ascending order.
    pub fn all() -> impl DoubleEndedIterator<Item = SlotIndex> {
        (0..NUM_EFFECT_SLOTS as u8).map(SlotIndex)
    }
}

impl TryFrom<usize> for SlotIndex {
    type Error = BusError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        SlotIndex::new(index).ok_or(BusError::IndexOutOfRange(index))
    }
}

impl From<SlotIndex> for usize {
    fn from(index: SlotIndex) -> Self {
        index.get()
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
