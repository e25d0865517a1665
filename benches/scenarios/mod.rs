//! Bus-level scenario benchmarks.
//!
//! These run the renderer the way a host callback would, with slots filled
//! and parameters moving.

mod bus;

pub use bus::bench_bus;
