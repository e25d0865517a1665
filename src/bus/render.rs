//! Audio-thread half of the bus.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use super::{
    command::{ChangeReceiver, RetireSender, TopologyChange},
    slot::NUM_EFFECT_SLOTS,
    topology::{EdgeSet, NodeId},
};
use crate::{
    block::AudioBlock,
    param::{AudioParam, ParamAutomation},
    unit::EffectNode,
    MAX_BLOCK_SIZE,
};

/*
Render Loop
===========

Per block, on the audio thread:

  1. drain pending `TopologyChange`s; each one lands whole (insert node,
     rewire edges, hand the removed node back). Once the controller has
     dropped, every node is handed back and the chain collapses to the
     direct edge.
  2. feed the chain: the bus input, or silence while the bus is bypassed
  3. walk the chain in edge order, ping-ponging between two scratch blocks
  4. output tap: chain output (or the bus input while bypassed) × gain

No step allocates, locks or logs. All buffers and the node table are sized
at construction.
*/

/// Render-side half of an [`EffectBus`](super::EffectBus).
///
/// Lives on the audio thread. Only the owning bus can mutate its topology,
/// through the change queue.
pub struct BusRenderer {
    channels: usize,
    changes: Consumer<TopologyChange>,
    retired: Producer<Box<EffectNode>>,
    edges: EdgeSet,
    nodes: Vec<Box<EffectNode>>,
    order: Vec<usize>,
    ping: AudioBlock,
    pong: AudioBlock,
    host_in: AudioBlock,
    host_out: AudioBlock,
    gain: ParamAutomation,
    bypass: ParamAutomation,
}

impl BusRenderer {
    pub(super) fn new(
        channels: usize,
        sample_rate: f32,
        changes: Consumer<TopologyChange>,
        retired: Producer<Box<EffectNode>>,
        gain: Arc<AudioParam>,
        bypass: Arc<AudioParam>,
    ) -> Self {
        Self {
            channels,
            changes,
            retired,
            edges: EdgeSet::direct(),
            nodes: Vec::with_capacity(NUM_EFFECT_SLOTS),
            order: Vec::with_capacity(NUM_EFFECT_SLOTS),
            ping: AudioBlock::new(channels),
            pong: AudioBlock::new(channels),
            host_in: AudioBlock::new(channels),
            host_out: AudioBlock::new(channels),
            gain: ParamAutomation::new(gain, sample_rate),
            bypass: ParamAutomation::new(bypass, sample_rate),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Edges as currently seen by the audio thread.
    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    /// Ids of the nodes audio flows through, in processing order.
    pub fn chain(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().map(|&i| self.nodes[i].id())
    }

    /// Render one block of at most `MAX_BLOCK_SIZE` frames.
    ///
    /// `output` takes the frame count of `input`. Output channels the bus
    /// does not carry receive silence.
    pub fn render(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
        self.apply_changes();

        let frames = input.frames();
        output.set_frames(frames);

        let Self {
            channels,
            nodes,
            order,
            ping,
            pong,
            gain,
            bypass,
            ..
        } = self;
        let channels = *channels;
        let bypass = bypass.render(frames);
        let gain = gain.render(frames);

        ping.set_frames(frames);
        for c in 0..channels {
            let lane = ping.channel_mut(c);
            if c < input.channels() {
                for (s, (out, &x)) in lane.iter_mut().zip(input.channel(c)).enumerate() {
                    *out = if bypass.gate_at(s) { 0.0 } else { x };
                }
            } else {
                lane.fill(0.0);
            }
        }

        let (mut current, mut spare) = (ping, pong);
        for &i in order.iter() {
            let node = &mut nodes[i];
            if node.render(current, spare) {
                for c in node.channels().min(channels)..channels {
                    spare.channel_mut(c).copy_from_slice(current.channel(c));
                }
            } else {
                // Killed nodes are wires
                spare.copy_from(current);
            }
            std::mem::swap(&mut current, &mut spare);
        }

        for c in 0..output.channels() {
            let wet = (c < channels).then(|| current.channel(c));
            let dry = (c < input.channels()).then(|| input.channel(c));
            let out = output.channel_mut(c);

            for (s, y) in out.iter_mut().enumerate() {
                let source = if bypass.gate_at(s) { dry } else { wet };
                *y = source.map_or(0.0, |lane| lane[s]) * gain.at(s);
            }
        }
    }

    /// Render interleaved host buffers of any length.
    ///
    /// `input` and `output` hold `channels` interleaved lanes; they are
    /// processed in chunks of at most `MAX_BLOCK_SIZE` frames.
    pub fn render_interleaved(&mut self, input: &[f32], output: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let chunk = MAX_BLOCK_SIZE * channels;

        for (in_chunk, out_chunk) in input.chunks(chunk).zip(output.chunks_mut(chunk)) {
            let mut host_in = std::mem::take(&mut self.host_in);
            let mut host_out = std::mem::take(&mut self.host_out);

            host_in.read_interleaved(in_chunk, channels);
            self.render(&host_in, &mut host_out);
            host_out.write_interleaved(out_chunk, channels);

            self.host_in = host_in;
            self.host_out = host_out;
        }

        // Tail the input could not cover
        let covered = input.len().min(output.len()) / channels * channels;
        output[covered..].fill(0.0);
    }

    fn apply_changes(&mut self) {
        let mut changed = false;

        while let Some(change) = ChangeReceiver::pop(&mut self.changes) {
            if let Some(id) = change.remove {
                if let Some(pos) = self.nodes.iter().position(|node| node.id() == id) {
                    let node = self.nodes.swap_remove(pos);
                    // The queue is sized so this cannot fail while the
                    // controller keeps collecting; a lost node is freed here.
                    let _ = self.retired.retire(node);
                }
            }
            if let Some(node) = change.insert {
                self.nodes.push(node);
            }
            self.edges.apply(&change.rewire);
            changed = true;
        }

        if changed {
            self.rebuild_order();
        }

        if self.changes.is_abandoned() && !self.nodes.is_empty() {
            self.tear_down();
        }
    }

    /// The controller is gone, so nothing can clear the slots any more. Hand
    /// every node back (or drop it when nobody collects) and fall back to the
    /// direct edge.
    fn tear_down(&mut self) {
        for mut node in self.nodes.drain(..) {
            node.kill();
            let _ = self.retired.retire(node);
        }
        self.edges.make_direct();
        self.order.clear();
    }

    fn rebuild_order(&mut self) {
        self.order.clear();
        for id in self.edges.walk() {
            if let NodeId::Effect(_) = id {
                if let Some(i) = self.nodes.iter().position(|node| node.id() == id) {
                    self.order.push(i);
                }
            }
        }
    }
}

impl Drop for BusRenderer {
    fn drop(&mut self) {
        for mut node in self.nodes.drain(..) {
            node.kill();
            let _ = self.retired.retire(node);
        }
    }
}
