//! Centrally-defined coercion between the host representations.
//!
//! Every host↔device boundary that changes representation calls through
//! here. The conversions follow standard floating-point semantics:
//!
//! - `f64` → `f32` narrows with round-to-nearest; values outside the `f32`
//!   range become infinities. Lossy and non-configurable.
//! - `i32` → `f32` widens; magnitudes above 2^24 lose low bits.
//! - `f32` → `i32` truncates toward zero, saturating at the `i32` bounds
//!   (the defined behavior of Rust's `as`); NaN becomes 0.

/// Narrow one double to the float representation.
pub fn narrow(x: f64) -> f32 {
    x as f32
}

/// Widen one integer to the float representation.
pub fn widen_int(x: i32) -> f32 {
    x as f32
}

/// Truncate one float toward zero.
pub fn truncate(x: f32) -> i32 {
    x as i32
}

/// Narrow a double slice to floats.
pub fn narrow_f64(data: &[f64]) -> Vec<f32> {
    data.iter().map(|&x| narrow(x)).collect()
}

/// Widen an integer slice to floats.
pub fn widen_i32(data: &[i32]) -> Vec<f32> {
    data.iter().map(|&x| widen_int(x)).collect()
}

/// Widen a float slice to doubles. Exact.
pub fn widen_f32(data: &[f32]) -> Vec<f64> {
    data.iter().map(|&x| f64::from(x)).collect()
}

/// Truncate a float slice toward zero.
pub fn truncate_f32(data: &[f32]) -> Vec<i32> {
    data.iter().map(|&x| truncate(x)).collect()
}
