use effect_bus::{BusConfig, EffectBus, EffectHandle, ParamSource, SlotIndex};
use rustfft::{num_complex::Complex, FftPlanner};

const SR: f32 = 48_000.0;
const FFT_SIZE: usize = 8_192;

/// Deterministic white noise in [-1, 1].
fn noise(len: usize) -> Vec<f32> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
        })
        .collect()
}

fn magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(samples.len());

    // Hann window keeps leakage out of the stopband
    let n = samples.len() as f32;
    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / n).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();
    fft.process(&mut buffer);

    buffer[..samples.len() / 2].iter().map(|c| c.norm()).collect()
}

fn band_energy(spectrum: &[f32], low_hz: f32, high_hz: f32) -> f32 {
    let bin_hz = SR / FFT_SIZE as f32;
    let (low, high) = ((low_hz / bin_hz) as usize, (high_hz / bin_hz) as usize);
    spectrum[low..high].iter().map(|m| m * m).sum::<f32>() / (high - low) as f32
}

fn filtered_noise(cutoff: f32, q: f32) -> Vec<f32> {
    let (mut bus, mut renderer) = EffectBus::new(BusConfig {
        channels: 1,
        sample_rate: SR,
        queue_capacity: 4,
    });
    let filter = EffectHandle::lowpass(1, SR);
    filter.set_param("cutoff", cutoff).unwrap();
    filter.set_param("q", q).unwrap();
    bus.assign(SlotIndex::FIRST, Some(&filter)).unwrap();

    // Settle the filter, then keep one FFT frame
    let input = noise(FFT_SIZE * 2);
    let mut output = vec![0.0; input.len()];
    renderer.render_interleaved(&input, &mut output, 1);
    output.split_off(FFT_SIZE)
}

#[test]
fn stopband_sits_far_below_passband() {
    let spectrum = magnitude_spectrum(&filtered_noise(1_000.0, 1.0));

    let pass = band_energy(&spectrum, 50.0, 500.0);
    let stop = band_energy(&spectrum, 10_000.0, 20_000.0);

    // Two poles fall off at 12 dB per octave, so a decade past cutoff sits
    // near 40 dB down; q = 1 (the default) adds only a small peak at cutoff
    let attenuation_db = 10.0 * (pass / stop).log10();
    assert!(attenuation_db > 40.0, "attenuation {attenuation_db} dB");
}

#[test]
fn resonance_lifts_the_cutoff_region() {
    let flat = magnitude_spectrum(&filtered_noise(2_000.0, 1.0));
    let peaked = magnitude_spectrum(&filtered_noise(2_000.0, 8.0));

    let around_cutoff = |s: &[f32]| band_energy(s, 1_800.0, 2_200.0) / band_energy(s, 50.0, 500.0);
    assert!(around_cutoff(&peaked) > 4.0 * around_cutoff(&flat));
}
