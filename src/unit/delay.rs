use std::sync::Arc;

use crate::{
    block::AudioBlock,
    dsp::delay::DelayLine,
    param::{AudioParam, ParamAutomation, ParamDescriptor, ParamView},
};

use super::NodeId;

/*
Feedback Delay
==============

Classic echo: the input is written into a delay line together with a scaled
copy of what the line is currently playing back. Every trip around the line
multiplies the echo by `feedback`, so echoes decay geometrically:

    feedback = 0.5:  1.0, 0.5, 0.25, 0.125, ...

Signal flow per sample:

    input ──┬────────────────────────────┬──→ (1 - mix) ──┐
            │                            │                 (+) ──→ output
            └──→ (+) ──→ [delay line] ──┬┴──→ mix ─────────┘
                  ↑                     │
                  └──── × feedback ─────┘

Parameters (all audio-rate, pre-clamped by the parameter layer):

  bypass     gate; when set the output is the dry input, the line still runs
  time       seconds behind the write cursor, [0, max_delay]
  feedback   [0, 1]
  mix        wet/dry balance, [0, 1]
*/

/// Longest delay a unit supports unless constructed otherwise (seconds).
pub const MAX_DELAY_TIME: f32 = 5.0;

/// Parameter descriptors in processor order: bypass, time, feedback, mix.
pub fn descriptors(max_delay_seconds: f32) -> [ParamDescriptor; 4] {
    [
        ParamDescriptor::audio("bypass", 0.0, 0.0, 1.0),
        ParamDescriptor::audio("time", 0.0, 0.0, max_delay_seconds),
        ParamDescriptor::audio("feedback", 0.0, 0.0, 1.0),
        ParamDescriptor::audio("mix", 0.0, 0.0, 1.0),
    ]
}

/// One block's worth of delay parameters.
#[derive(Debug, Clone, Copy)]
pub struct DelayParams<'a> {
    pub bypass: ParamView<'a>,
    pub time: ParamView<'a>,
    pub feedback: ParamView<'a>,
    pub mix: ParamView<'a>,
}

/// Multi-channel feedback delay implementing the host `process` contract.
pub struct DelayProcessor {
    lines: Vec<DelayLine>,
    sample_rate: f32,
    keep_alive: bool,
}

impl DelayProcessor {
    pub fn new(channels: usize, sample_rate: f32) -> Self {
        Self::with_max_delay(channels, sample_rate, MAX_DELAY_TIME)
    }

    /// Allocate one line per channel, each long enough for `max_delay_seconds`.
    pub fn with_max_delay(channels: usize, sample_rate: f32, max_delay_seconds: f32) -> Self {
        let lines = (0..channels.max(1))
            .map(|_| DelayLine::for_duration(max_delay_seconds, sample_rate))
            .collect();

        Self {
            lines,
            sample_rate,
            keep_alive: true,
        }
    }

    pub fn channels(&self) -> usize {
        self.lines.len()
    }

    /// Length of each channel's delay line in samples.
    pub fn line_len(&self) -> usize {
        self.lines.first().map_or(0, DelayLine::len)
    }

    /// Stop asking the host to keep this processor alive.
    pub fn kill(&mut self) {
        self.keep_alive = false;
    }

    /// Render one block. Returns whether the processor wants to stay alive.
    pub fn process(
        &mut self,
        input: &AudioBlock,
        output: &mut AudioBlock,
        params: &DelayParams<'_>,
    ) -> bool {
        let frames = input.frames();
        output.set_frames(frames);

        let channels = input.channels().min(output.channels()).min(self.lines.len());

        for (c, line) in self.lines.iter_mut().enumerate().take(channels) {
            let input_channel = input.channel(c);
            let output_channel = output.channel_mut(c);

            for s in 0..frames {
                let dry = input_channel[s];
                output_channel[s] = dry;

                let delayed = line.read(params.time.at(s) * self.sample_rate);
                line.write(dry + delayed * params.feedback.at(s));

                if params.bypass.gate_at(s) {
                    continue;
                }

                let mix = params.mix.at(s);
                output_channel[s] = output_channel[s] * (1.0 - mix) + delayed * mix;
            }
        }

        self.keep_alive
    }
}

/// Render-side delay node: a processor plus its parameter automation.
pub struct DelayNode {
    id: NodeId,
    processor: DelayProcessor,
    bypass: ParamAutomation,
    time: ParamAutomation,
    feedback: ParamAutomation,
    mix: ParamAutomation,
}

impl DelayNode {
    pub(crate) fn new(
        id: NodeId,
        processor: DelayProcessor,
        params: &[Arc<AudioParam>; 4],
        sample_rate: f32,
    ) -> Self {
        let [bypass, time, feedback, mix] = params;
        Self {
            id,
            processor,
            bypass: ParamAutomation::new(bypass.clone(), sample_rate),
            time: ParamAutomation::new(time.clone(), sample_rate),
            feedback: ParamAutomation::new(feedback.clone(), sample_rate),
            mix: ParamAutomation::new(mix.clone(), sample_rate),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn processor(&self) -> &DelayProcessor {
        &self.processor
    }

    pub(crate) fn kill(&mut self) {
        self.processor.kill();
    }

    pub fn render(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> bool {
        let frames = input.frames();
        let params = DelayParams {
            bypass: self.bypass.render(frames),
            time: self.time.render(frames),
            feedback: self.feedback.render(frames),
            mix: self.mix.render(frames),
        };
        self.processor.process(input, output, &params)
    }
}
