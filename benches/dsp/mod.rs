//! Benchmarks for the effect unit processors.

mod delay;
mod lowpass;

pub use delay::bench_delay;
pub use lowpass::bench_lowpass;
