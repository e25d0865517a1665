//! Effect units: control-side handles and their render-side nodes.
//!
//! An [`EffectHandle`] is what scripts hold and assign to bus slots. It owns
//! the unit's parameters and builds [`EffectNode`]s on request; the node is
//! what actually runs on the audio thread.

/// Feedback delay with fractional, per-sample delay time.
pub mod delay;
/// RBJ biquad low-pass with cached coefficients.
pub mod lowpass;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, AtomicUsize, Ordering},
        Arc,
    },
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    block::AudioBlock,
    bus::topology::NodeId,
    param::{AudioParam, ParamDescriptor, ParamSource},
};

use self::{
    delay::{DelayNode, DelayProcessor, MAX_DELAY_TIME},
    lowpass::{LowPassNode, LowPassProcessor},
};

static NEXT_UNIT_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// The closed set of effect kinds a bus slot can hold.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Delay,
    LowPass,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::Delay => f.write_str("delay"),
            EffectKind::LowPass => f.write_str("lowpass"),
        }
    }
}

enum UnitParams {
    Delay {
        max_delay_seconds: f32,
        params: [Arc<AudioParam>; 4],
    },
    LowPass {
        params: [Arc<AudioParam>; 3],
    },
}

impl UnitParams {
    fn all(&self) -> &[Arc<AudioParam>] {
        match self {
            UnitParams::Delay { params, .. } => params,
            UnitParams::LowPass { params } => params,
        }
    }
}

struct EffectUnit {
    id: u32,
    channels: usize,
    sample_rate: f32,
    params: UnitParams,
    live_nodes: Arc<AtomicUsize>,
}

/// Shared handle to one effect unit.
///
/// Clones refer to the same unit; equality is identity.
#[derive(Clone)]
pub struct EffectHandle {
    unit: Arc<EffectUnit>,
}

impl EffectHandle {
    /// Feedback delay with the default maximum delay time.
    pub fn delay(channels: usize, sample_rate: f32) -> Self {
        Self::delay_with_max(channels, sample_rate, MAX_DELAY_TIME)
    }

    /// Feedback delay whose lines hold `max_delay_seconds`.
    pub fn delay_with_max(channels: usize, sample_rate: f32, max_delay_seconds: f32) -> Self {
        let max_delay_seconds = max_delay_seconds.max(0.0);
        let params = delay::descriptors(max_delay_seconds).map(|d| Arc::new(AudioParam::new(d)));
        Self::from_params(
            channels,
            sample_rate,
            UnitParams::Delay {
                max_delay_seconds,
                params,
            },
        )
    }

    /// Second-order low-pass filter.
    pub fn lowpass(channels: usize, sample_rate: f32) -> Self {
        let params = lowpass::descriptors(sample_rate).map(|d| Arc::new(AudioParam::new(d)));
        Self::from_params(channels, sample_rate, UnitParams::LowPass { params })
    }

    fn from_params(channels: usize, sample_rate: f32, params: UnitParams) -> Self {
        Self {
            unit: Arc::new(EffectUnit {
                id: NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed),
                channels: channels.max(1),
                sample_rate,
                params,
                live_nodes: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.unit.id
    }

    pub fn kind(&self) -> EffectKind {
        match self.unit.params {
            UnitParams::Delay { .. } => EffectKind::Delay,
            UnitParams::LowPass { .. } => EffectKind::LowPass,
        }
    }

    pub fn channels(&self) -> usize {
        self.unit.channels
    }

    pub fn sample_rate(&self) -> f32 {
        self.unit.sample_rate
    }

    /// Descriptors of every parameter this unit exposes.
    pub fn descriptors(&self) -> impl Iterator<Item = &ParamDescriptor> + '_ {
        self.unit.params.all().iter().map(|p| p.descriptor())
    }

    /// Number of processing nodes built from this unit and not yet released.
    pub fn live_nodes(&self) -> usize {
        self.unit.live_nodes.load(Ordering::Acquire)
    }

    /// Build a processing node for the render context.
    pub fn acquire_node(&self) -> EffectNode {
        let id = NodeId::Effect(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));
        let channels = self.unit.channels;
        let sample_rate = self.unit.sample_rate;

        let processor = match &self.unit.params {
            UnitParams::Delay {
                max_delay_seconds,
                params,
            } => {
                let processor =
                    DelayProcessor::with_max_delay(channels, sample_rate, *max_delay_seconds);
                NodeProcessor::Delay(DelayNode::new(id, processor, params, sample_rate))
            }
            UnitParams::LowPass { params } => {
                let processor = LowPassProcessor::new(channels, sample_rate);
                NodeProcessor::LowPass(LowPassNode::new(id, processor, params, sample_rate))
            }
        };

        self.unit.live_nodes.fetch_add(1, Ordering::AcqRel);
        log::debug!("{} unit {}: acquired node {:?}", self.kind(), self.id(), id);
        EffectNode {
            processor,
            _lease: NodeLease {
                live: Arc::clone(&self.unit.live_nodes),
            },
        }
    }

    /// Take back a node previously handed out by [`acquire_node`](Self::acquire_node).
    ///
    /// Released nodes are freed; the next acquisition starts from silence.
    pub fn release_node(&self, mut node: EffectNode) {
        node.kill();
        log::debug!("{} unit {}: released node {:?}", self.kind(), self.id(), node.id());
    }
}

impl ParamSource for EffectHandle {
    fn parameter(&self, name: &str) -> Option<&AudioParam> {
        self.unit
            .params
            .all()
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }
}

impl PartialEq for EffectHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.unit, &other.unit)
    }
}

impl Eq for EffectHandle {}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("kind", &self.kind())
            .field("id", &self.unit.id)
            .field("channels", &self.unit.channels)
            .finish()
    }
}

enum NodeProcessor {
    Delay(DelayNode),
    LowPass(LowPassNode),
}

/// Counts a node against its unit's `live_nodes` until dropped.
struct NodeLease {
    live: Arc<AtomicUsize>,
}

impl Drop for NodeLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A processing node on the render path.
pub struct EffectNode {
    processor: NodeProcessor,
    _lease: NodeLease,
}

impl EffectNode {
    pub fn id(&self) -> NodeId {
        match &self.processor {
            NodeProcessor::Delay(node) => node.id(),
            NodeProcessor::LowPass(node) => node.id(),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self.processor {
            NodeProcessor::Delay(_) => EffectKind::Delay,
            NodeProcessor::LowPass(_) => EffectKind::LowPass,
        }
    }

    /// Channels the node processes; lanes above this pass through untouched.
    pub fn channels(&self) -> usize {
        match &self.processor {
            NodeProcessor::Delay(node) => node.processor().channels(),
            NodeProcessor::LowPass(node) => node.processor().channels(),
        }
    }

    /// Process one block. Returns the node's keep-alive signal.
    #[inline]
    pub fn render(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> bool {
        match &mut self.processor {
            NodeProcessor::Delay(node) => node.render(input, output),
            NodeProcessor::LowPass(node) => node.render(input, output),
        }
    }

    /// End the node's keep-alive signal.
    pub fn kill(&mut self) {
        match &mut self.processor {
            NodeProcessor::Delay(node) => node.kill(),
            NodeProcessor::LowPass(node) => node.kill(),
        }
    }
}

impl fmt::Debug for EffectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectNode")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}
