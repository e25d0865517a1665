//! Benchmarks for the biquad low-pass processor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use effect_bus::{
    unit::lowpass::{LowPassParams, LowPassProcessor},
    AudioBlock, ParamView,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_lowpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lowpass");

    for &size in BLOCK_SIZES {
        let signal: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let input = AudioBlock::from_channels(&[&signal, &signal]);
        let mut output = AudioBlock::new(2);

        // Settled parameters: one coefficient update per block at most
        let mut filter = LowPassProcessor::new(2, SAMPLE_RATE);
        let params = LowPassParams {
            bypass: ParamView::Constant(0.0),
            cutoff: ParamView::Constant(1_000.0),
            q: ParamView::Constant(0.707),
        };
        group.bench_with_input(BenchmarkId::new("constant", size), &size, |b, _| {
            b.iter(|| filter.process(black_box(&input), &mut output, &params))
        });

        // Cutoff sweep: a recomputation on every sample
        let cutoffs: Vec<f32> = (0..size).map(|i| 500.0 + i as f32 * 10.0).collect();
        let mut filter = LowPassProcessor::new(2, SAMPLE_RATE);
        let params = LowPassParams {
            bypass: ParamView::Constant(0.0),
            cutoff: ParamView::PerSample(&cutoffs),
            q: ParamView::Constant(2.0),
        };
        group.bench_with_input(BenchmarkId::new("swept_cutoff", size), &size, |b, _| {
            b.iter(|| filter.process(black_box(&input), &mut output, &params))
        });
    }

    group.finish();
}
