//! Benchmarks for the feedback delay processor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use effect_bus::{
    unit::delay::{DelayParams, DelayProcessor},
    AudioBlock, ParamView,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in seconds
    let delay_times: &[f32] = &[
        0.01, // 480 samples
        0.1,  // 4800 samples
        1.0,  // one second
    ];

    for &size in BLOCK_SIZES {
        let signal: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let input = AudioBlock::from_channels(&[&signal, &signal]);
        let mut output = AudioBlock::new(2);

        for &time in delay_times {
            let mut delay = DelayProcessor::new(2, SAMPLE_RATE);
            let params = DelayParams {
                bypass: ParamView::Constant(0.0),
                time: ParamView::Constant(time),
                feedback: ParamView::Constant(0.5),
                mix: ParamView::Constant(0.5),
            };
            group.bench_with_input(
                BenchmarkId::new(format!("constant_{}ms", (time * 1_000.0) as u32), size),
                &size,
                |b, _| b.iter(|| delay.process(black_box(&input), &mut output, &params)),
            );
        }

        // Per-sample time sweep (chorus-like modulation of the read offset)
        let times: Vec<f32> = (0..size)
            .map(|i| 0.01 + (i as f32 * 0.1).sin() * 0.001)
            .collect();
        let mut delay = DelayProcessor::new(2, SAMPLE_RATE);
        let params = DelayParams {
            bypass: ParamView::Constant(0.0),
            time: ParamView::PerSample(&times),
            feedback: ParamView::Constant(0.3),
            mix: ParamView::Constant(0.5),
        };
        group.bench_with_input(
            BenchmarkId::new("modulated_time", size),
            &size,
            |b, _| b.iter(|| delay.process(black_box(&input), &mut output, &params)),
        );
    }

    group.finish();
}
