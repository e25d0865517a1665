use rtrb::{Consumer, Producer};

use super::{
    slot::SlotIndex,
    topology::{NodeId, Rewire},
};
use crate::unit::EffectNode;

/// One slot mutation, handed from the controller to the renderer.
///
/// The renderer applies the whole change between two blocks: it inserts the
/// new node, rewires the edges, and retires the old node in one step.
#[derive(Debug)]
pub struct TopologyChange {
    pub slot: SlotIndex,
    pub rewire: Rewire,
    /// Node taking over the slot, built on the control side.
    pub insert: Option<Box<EffectNode>>,
    /// Node leaving the slot; the renderer sends it back for release.
    pub remove: Option<NodeId>,
}

/// Source of topology changes for the render context.
pub trait ChangeReceiver {
    fn pop(&mut self) -> Option<TopologyChange>;
}

impl ChangeReceiver for Consumer<TopologyChange> {
    fn pop(&mut self) -> Option<TopologyChange> {
        Consumer::pop(self).ok()
    }
}

/// Destination for nodes the render context no longer runs.
///
/// Hands the node back when the queue cannot take it, or when nobody is left
/// to collect it.
pub trait RetireSender {
    fn retire(&mut self, node: Box<EffectNode>) -> Result<(), Box<EffectNode>>;
}

impl RetireSender for Producer<Box<EffectNode>> {
    fn retire(&mut self, node: Box<EffectNode>) -> Result<(), Box<EffectNode>> {
        if self.is_abandoned() {
            return Err(node);
        }
        self.push(node).map_err(|rtrb::PushError::Full(node)| node)
    }
}
