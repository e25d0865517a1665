//! busdemo - plays plucks through an effect bus while a control thread
//! rearranges the chain.
//!
//! Run with: cargo run --bin busdemo [seconds]
//! Set RUST_LOG=debug to watch slot changes and node lifetimes.

mod source;

use std::{
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use effect_bus::{
    BusConfig, EffectBus, EffectHandle, ParamSource, SlotIndex, MAX_BLOCK_SIZE,
};
use source::Plucks;

fn slot(index: usize) -> EyreResult<SlotIndex> {
    SlotIndex::try_from(index).wrap_err("demo slot index")
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seconds: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().wrap_err("duration must be whole seconds")?,
        None => 20,
    };

    // Set up audio
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    log::info!("output: {} Hz, {} channels", sample_rate, channels);

    let (mut bus, mut renderer) = EffectBus::new(BusConfig {
        channels,
        sample_rate,
        ..BusConfig::default()
    });

    let delay = EffectHandle::delay(channels, sample_rate);
    delay.set_param("time", 0.375)?;
    delay.set_param("feedback", 0.45)?;
    delay.set_param("mix", 0.35)?;

    let filter = EffectHandle::lowpass(channels, sample_rate);
    filter.set_param("cutoff", 800.0)?;
    filter.set_param("q", 4.0)?;

    bus.assign(slot(2)?, Some(&delay))?;
    bus.assign(slot(5)?, Some(&filter))?;

    // Set up audio stream
    let mut plucks = Plucks::new(sample_rate, 120.0);
    let mut dry = vec![0.0f32; MAX_BLOCK_SIZE * channels];
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            for chunk in data.chunks_mut(dry.len()) {
                let input = &mut dry[..chunk.len()];
                plucks.fill(input, channels);
                renderer.render_interleaved(input, chunk, channels);
            }
        },
        |err| log::error!("audio stream error: {}", err),
        None,
    )?;
    stream.play()?;

    log::info!("playing for {} seconds, press Ctrl+C to stop", seconds);

    // Control loop: sweep the cutoff, swap the chain order every four seconds
    let start = Instant::now();
    let mut filter_first = false;
    let mut next_swap = Duration::from_secs(4);
    while start.elapsed() < Duration::from_secs(seconds) {
        let t = start.elapsed().as_secs_f32();
        let cutoff = 300.0 + 2_500.0 * (0.5 + 0.5 * (t * 0.8).sin());
        filter.set_param_target("cutoff", cutoff, 0.05)?;

        if start.elapsed() >= next_swap {
            next_swap += Duration::from_secs(4);
            filter_first = !filter_first;

            let (delay_slot, filter_slot) = if filter_first { (5, 2) } else { (2, 5) };
            bus.clear(slot(2)?)?;
            bus.clear(slot(5)?)?;
            bus.assign(slot(delay_slot)?, Some(&delay))?;
            bus.assign(slot(filter_slot)?, Some(&filter))?;

            let order: Vec<String> = bus
                .chain()
                .map(|(index, effect)| format!("{}:{}", index, effect.kind()))
                .collect();
            log::info!("chain is now [{}]", order.join(" -> "));
        }

        if (t as u64) % 10 == 9 {
            bus.set_bypass(true);
        } else if bus.bypass() {
            bus.set_bypass(false);
        }

        thread::sleep(Duration::from_millis(20));
    }

    bus.set_gain(0.0);
    thread::sleep(Duration::from_millis(100));
    drop(stream);
    log::info!("done");
    Ok(())
}
