//! The effect chain bus: eight ordered slots between two fixed taps.
//!
//! [`EffectBus`] is the control-side owner. It validates and plans every
//! slot mutation, then hands it to the [`BusRenderer`] on the audio thread
//! through a lock-free queue.

pub mod command;
pub mod render;
pub mod slot;
pub mod topology;

use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{BusError, Result},
    param::{AudioParam, ParamDescriptor, ParamSource},
    unit::{EffectHandle, EffectNode},
    PARAM_TIME_CONSTANT,
};

use self::{
    command::TopologyChange,
    slot::{SlotIndex, NUM_EFFECT_SLOTS},
    topology::{plan_rewire, EdgeSet, NodeId},
};

pub use render::BusRenderer;

/// Bus output gain: unity by default, never negative.
pub const GAIN: ParamDescriptor = ParamDescriptor::audio("gain", 1.0, 0.0, f32::INFINITY);

/// Bus bypass gate.
pub const BYPASS: ParamDescriptor = ParamDescriptor::audio("bypass", 0.0, 0.0, 1.0);

/// Construction settings for a bus and its renderer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusConfig {
    pub channels: usize,
    pub sample_rate: f32,
    /// Topology changes that may wait for the renderer at once.
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48_000.0,
            queue_capacity: 64,
        }
    }
}

/// A value written to or read from an effect slot by a scripting host.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Effect(EffectHandle),
}

impl ScriptValue {
    /// Interpret the value as slot contents: an effect, or empty.
    pub fn into_effect(self) -> Result<Option<EffectHandle>> {
        match self {
            ScriptValue::Undefined => Ok(None),
            ScriptValue::Effect(effect) => Ok(Some(effect)),
            _ => Err(BusError::InvalidSlotValue),
        }
    }
}

impl From<EffectHandle> for ScriptValue {
    fn from(effect: EffectHandle) -> Self {
        ScriptValue::Effect(effect)
    }
}

impl From<Option<EffectHandle>> for ScriptValue {
    fn from(effect: Option<EffectHandle>) -> Self {
        effect.map_or(ScriptValue::Undefined, ScriptValue::Effect)
    }
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Occupied {
        effect: EffectHandle,
        node: NodeId,
    },
}

impl Slot {
    fn node(&self) -> Option<NodeId> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { node, .. } => Some(*node),
        }
    }

    fn effect(&self) -> Option<&EffectHandle> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { effect, .. } => Some(effect),
        }
    }
}

/// Control-side owner of an effect chain.
///
/// All mutations are synchronous and validated here; the renderer only ever
/// sees complete, already-planned changes.
pub struct EffectBus {
    config: BusConfig,
    slots: [Slot; NUM_EFFECT_SLOTS],
    edges: EdgeSet,
    gain: Arc<AudioParam>,
    bypass: Arc<AudioParam>,
    changes: Producer<TopologyChange>,
    retired: Consumer<Box<EffectNode>>,
    /// Nodes sent off for removal, with the unit that will take them back.
    retiring: Vec<(NodeId, EffectHandle)>,
}

impl EffectBus {
    /// Create a bus with every slot empty and its renderer.
    ///
    /// The renderer belongs on the audio thread; the bus stays with the
    /// controller.
    pub fn new(config: BusConfig) -> (Self, BusRenderer) {
        let channels = config.channels.max(1);
        let queue_capacity = config.queue_capacity.max(1);

        let (changes, change_rx) = RingBuffer::new(queue_capacity);
        // Every change retires at most one node, plus the renderer's own
        // nodes when it shuts down.
        let retire_capacity = queue_capacity + 2 * NUM_EFFECT_SLOTS;
        let (retired_tx, retired) = RingBuffer::new(retire_capacity);

        let gain = Arc::new(AudioParam::new(GAIN));
        let bypass = Arc::new(AudioParam::new(BYPASS));

        let renderer = BusRenderer::new(
            channels,
            config.sample_rate,
            change_rx,
            retired_tx,
            Arc::clone(&gain),
            Arc::clone(&bypass),
        );

        log::info!(
            "effect bus created: {} channels at {} Hz, {} queued changes",
            channels,
            config.sample_rate,
            queue_capacity
        );

        let bus = Self {
            config: BusConfig {
                channels,
                queue_capacity,
                ..config
            },
            slots: Default::default(),
            edges: EdgeSet::direct(),
            gain,
            bypass,
            changes,
            retired,
            retiring: Vec::with_capacity(retire_capacity),
        };
        (bus, renderer)
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Put `effect` into slot `index`, or clear the slot with `None`.
    ///
    /// A unit may occupy one slot at a time: assigning it to a second slot
    /// fails with [`BusError::UnitAlreadyAssigned`], and assigning it to the
    /// slot it already holds changes nothing. On error the chain is left
    /// untouched.
    pub fn assign(&mut self, index: SlotIndex, effect: Option<&EffectHandle>) -> Result<()> {
        self.collect_garbage();

        if let Some(effect) = effect {
            if let Some(owner) = self.slot_of(effect) {
                if owner == index {
                    return Ok(());
                }
                log::warn!("{} unit {} already occupies slot {}", effect.kind(), effect.id(), owner);
                return Err(BusError::UnitAlreadyAssigned(owner));
            }
        }

        let current = self.slots[index.get()].node();
        if current.is_none() && effect.is_none() {
            return Ok(());
        }

        if self.changes.is_full() {
            log::warn!("render queue full, slot {} left unchanged", index);
            return Err(BusError::QueueFull);
        }

        let node = effect.map(|effect| Box::new(effect.acquire_node()));
        let replacement = node.as_ref().map(|node| node.id());

        let occupancy = self.occupancy();
        let Some(rewire) = plan_rewire(&occupancy, index, replacement) else {
            return Ok(());
        };

        let change = TopologyChange {
            slot: index,
            rewire,
            insert: node,
            remove: current,
        };
        if self.changes.push(change).is_err() {
            return Err(BusError::QueueFull);
        }

        self.edges.apply(&rewire);
        let slot = match (effect, replacement) {
            (Some(effect), Some(node)) => Slot::Occupied {
                effect: effect.clone(),
                node,
            },
            _ => Slot::Empty,
        };
        let previous = std::mem::replace(&mut self.slots[index.get()], slot);
        if let Slot::Occupied { effect, node } = previous {
            self.retiring.push((node, effect));
        }

        match effect {
            Some(effect) => log::debug!("slot {}: {} unit {}", index, effect.kind(), effect.id()),
            None => log::debug!("slot {}: cleared", index),
        }
        Ok(())
    }

    /// Empty slot `index`.
    pub fn clear(&mut self, index: SlotIndex) -> Result<()> {
        self.assign(index, None)
    }

    /// Scripting entry point: assign a loosely typed value to a raw index.
    pub fn set_effect(&mut self, index: usize, value: ScriptValue) -> Result<()> {
        let index = SlotIndex::try_from(index)?;
        let effect = value.into_effect()?;
        self.assign(index, effect.as_ref())
    }

    /// Scripting entry point: the unit in a raw index, or `Undefined`.
    pub fn get_effect(&self, index: usize) -> Result<ScriptValue> {
        let index = SlotIndex::try_from(index)?;
        Ok(self.effect(index).cloned().into())
    }

    /// The unit in slot `index`, if any.
    pub fn effect(&self, index: SlotIndex) -> Option<&EffectHandle> {
        self.slots[index.get()].effect()
    }

    /// Graph node standing in slot `index`.
    pub fn node_id(&self, index: SlotIndex) -> Option<NodeId> {
        self.slots[index.get()].node()
    }

    /// Slot currently holding `effect`.
    pub fn slot_of(&self, effect: &EffectHandle) -> Option<SlotIndex> {
        SlotIndex::all().find(|index| self.effect(*index) == Some(effect))
    }

    /// Occupied slots in chain order.
    pub fn chain(&self) -> impl Iterator<Item = (SlotIndex, &EffectHandle)> {
        SlotIndex::all().filter_map(|index| self.effect(index).map(|effect| (index, effect)))
    }

    /// Edges as the controller last committed them.
    ///
    /// The renderer converges on the same set once it has drained the queue.
    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    /// Ramp the output gain toward `gain` (clamped to `>= 0`).
    pub fn set_gain(&self, gain: f32) -> f32 {
        self.gain.set_target(gain, PARAM_TIME_CONSTANT)
    }

    pub fn gain(&self) -> f32 {
        self.gain.value()
    }

    /// Switch the bus between its chain and the direct input path.
    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.set_value(if bypass { 1.0 } else { 0.0 });
    }

    pub fn bypass(&self) -> bool {
        self.bypass.value() != 0.0
    }

    /// Release nodes the renderer has handed back to the units that made
    /// them. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let mut collected = 0;
        while let Ok(node) = self.retired.pop() {
            match self.owner_of(node.id()) {
                Some(effect) => effect.release_node(*node),
                None => log::warn!("retired {} node {:?} has no owner", node.kind(), node.id()),
            }
            collected += 1;
        }
        collected
    }

    /// Number of nodes sent for removal that the renderer has not handed back.
    pub fn pending_retirements(&self) -> usize {
        self.retiring.len()
    }

    /// Unit a retired node belongs to. Nodes of still occupied slots come
    /// back when the renderer shuts down first.
    fn owner_of(&mut self, id: NodeId) -> Option<EffectHandle> {
        match self.retiring.iter().position(|(node, _)| *node == id) {
            Some(pos) => Some(self.retiring.swap_remove(pos).1),
            None => self
                .slots
                .iter()
                .find(|slot| slot.node() == Some(id))
                .and_then(Slot::effect)
                .cloned(),
        }
    }

    fn occupancy(&self) -> [Option<NodeId>; NUM_EFFECT_SLOTS] {
        std::array::from_fn(|i| self.slots[i].node())
    }
}

impl ParamSource for EffectBus {
    fn parameter(&self, name: &str) -> Option<&AudioParam> {
        match name {
            "gain" => Some(&self.gain),
            "bypass" => Some(&self.bypass),
            _ => None,
        }
    }
}

/// The renderer notices the closed queue at its next block and hands back
/// every node it still runs.
impl Drop for EffectBus {
    fn drop(&mut self) {
        self.collect_garbage();
        log::info!("effect bus dropped");
    }
}
