//! Benchmarks for a bus with several occupied slots.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use effect_bus::{BusConfig, EffectBus, EffectHandle, ParamSource, SlotIndex};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn slot(i: usize) -> SlotIndex {
    SlotIndex::new(i).unwrap_or(SlotIndex::LAST)
}

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bus");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size * 2).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut output = vec![0.0f32; size * 2];

        // === EMPTY: taps only ===
        let (_empty_bus, mut empty) = EffectBus::new(BusConfig::default());
        group.bench_with_input(BenchmarkId::new("empty", size), &size, |b, _| {
            b.iter(|| empty.render_interleaved(black_box(&input), &mut output, 2))
        });

        // === FULL: every slot occupied, delays and filters alternating ===
        let (mut full_bus, mut full) = EffectBus::new(BusConfig::default());
        let units: Vec<EffectHandle> = (0..8)
            .map(|i| {
                let unit = if i % 2 == 0 {
                    EffectHandle::delay_with_max(2, SAMPLE_RATE, 1.0)
                } else {
                    EffectHandle::lowpass(2, SAMPLE_RATE)
                };
                let _ = unit.set_param("time", 0.05 * (i + 1) as f32);
                let _ = unit.set_param("feedback", 0.3);
                let _ = unit.set_param("mix", 0.4);
                let _ = unit.set_param("cutoff", 2_000.0 + 1_000.0 * i as f32);
                unit
            })
            .collect();
        for (i, unit) in units.iter().enumerate() {
            let _ = full_bus.assign(slot(i), Some(unit));
        }
        group.bench_with_input(BenchmarkId::new("eight_slots", size), &size, |b, _| {
            b.iter(|| full.render_interleaved(black_box(&input), &mut output, 2))
        });

        // === AUTOMATED: cutoff and gain ramps restarted every block ===
        let mut toggle = false;
        group.bench_with_input(BenchmarkId::new("eight_slots_automated", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                let target = if toggle { 0.5 } else { 1.0 };
                full_bus.set_gain(target);
                for unit in units.iter().skip(1).step_by(2) {
                    let _ = unit.set_param_target("cutoff", target * 4_000.0, 0.01);
                }
                full.render_interleaved(black_box(&input), &mut output, 2)
            })
        });
    }

    group.finish();
}
