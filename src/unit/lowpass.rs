use std::sync::Arc;

use crate::{
    block::AudioBlock,
    dsp::biquad::{BiquadState, CoefficientCache},
    param::{AudioParam, ParamAutomation, ParamDescriptor, ParamView},
};

use super::NodeId;

/// Highest cutoff the filter accepts at `sample_rate`.
pub fn max_cutoff(sample_rate: f32) -> f32 {
    (sample_rate / 2.0).min(20_000.0)
}

/// Parameter descriptors in processor order: bypass, cutoff, q.
pub fn descriptors(sample_rate: f32) -> [ParamDescriptor; 3] {
    let max_cutoff = max_cutoff(sample_rate);
    [
        ParamDescriptor::audio("bypass", 0.0, 0.0, 1.0),
        ParamDescriptor::audio("cutoff", max_cutoff, 10.0, max_cutoff),
        ParamDescriptor::audio("q", 1.0, 1.0, 100.0),
    ]
}

/// One block's worth of low-pass parameters.
#[derive(Debug, Clone, Copy)]
pub struct LowPassParams<'a> {
    pub bypass: ParamView<'a>,
    pub cutoff: ParamView<'a>,
    pub q: ParamView<'a>,
}

/// Multi-channel RBJ low-pass with shared, lazily recomputed coefficients.
///
/// Filter history is per channel and survives across blocks; it is only
/// ever zero at construction.
pub struct LowPassProcessor {
    cache: CoefficientCache,
    states: Vec<BiquadState>,
    keep_alive: bool,
}

impl LowPassProcessor {
    pub fn new(channels: usize, sample_rate: f32) -> Self {
        Self {
            cache: CoefficientCache::new(sample_rate),
            states: vec![BiquadState::default(); channels.max(1)],
            keep_alive: true,
        }
    }

    pub fn channels(&self) -> usize {
        self.states.len()
    }

    /// Number of coefficient recomputations performed so far.
    pub fn recomputations(&self) -> u64 {
        self.cache.recomputations()
    }

    pub fn kill(&mut self) {
        self.keep_alive = false;
    }

    /// Render one block. Returns whether the processor wants to stay alive.
    pub fn process(
        &mut self,
        input: &AudioBlock,
        output: &mut AudioBlock,
        params: &LowPassParams<'_>,
    ) -> bool {
        let frames = input.frames();
        output.set_frames(frames);

        let channels = input.channels().min(output.channels()).min(self.states.len());
        let bypass = params.bypass;

        if params.cutoff.is_constant() && params.q.is_constant() {
            // Block-rate: one coefficient update, then a tight loop per channel
            let coefficients = self.cache.update(params.cutoff.at(0), params.q.at(0));

            for (c, state) in self.states.iter_mut().enumerate().take(channels) {
                let input_channel = input.channel(c);
                let output_channel = output.channel_mut(c);

                for s in 0..frames {
                    let x = input_channel[s];
                    let y = state.process(x, &coefficients);
                    output_channel[s] = if bypass.gate_at(s) { x } else { y };
                }
            }
        } else {
            // Sample-rate: the cache turns repeated pairs into a comparison
            for s in 0..frames {
                let coefficients = self.cache.update(params.cutoff.at(s), params.q.at(s));

                for (c, state) in self.states.iter_mut().enumerate().take(channels) {
                    let x = input.channel(c)[s];
                    let y = state.process(x, &coefficients);
                    output.channel_mut(c)[s] = if bypass.gate_at(s) { x } else { y };
                }
            }
        }

        self.keep_alive
    }
}

/// Render-side low-pass node: a processor plus its parameter automation.
pub struct LowPassNode {
    id: NodeId,
    processor: LowPassProcessor,
    bypass: ParamAutomation,
    cutoff: ParamAutomation,
    q: ParamAutomation,
}

impl LowPassNode {
    pub(crate) fn new(
        id: NodeId,
        processor: LowPassProcessor,
        params: &[Arc<AudioParam>; 3],
        sample_rate: f32,
    ) -> Self {
        let [bypass, cutoff, q] = params;
        Self {
            id,
            processor,
            bypass: ParamAutomation::new(bypass.clone(), sample_rate),
            cutoff: ParamAutomation::new(cutoff.clone(), sample_rate),
            q: ParamAutomation::new(q.clone(), sample_rate),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn processor(&self) -> &LowPassProcessor {
        &self.processor
    }

    pub(crate) fn kill(&mut self) {
        self.processor.kill();
    }

    pub fn render(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> bool {
        let frames = input.frames();
        let params = LowPassParams {
            bypass: self.bypass.render(frames),
            cutoff: self.cutoff.render(frames),
            q: self.q.render(frames),
        };
        self.processor.process(input, output, &params)
    }
}
