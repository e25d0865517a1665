//! Low-level DSP primitives used by the effect units.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! so effect nodes embed them directly. They stay focused on the
//! signal-processing math; parameter handling lives in the units.

/// Second-order IIR (biquad) low-pass coefficients and state.
pub mod biquad;
/// Circular delay line with linear-interpolated fractional reads.
pub mod delay;
