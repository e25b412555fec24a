//! This module contains the fixed, position-dependent quantizer.
//!
//! Each coefficient is divided by `max(1, 5 * (x + y + z))`, where `(x, y, z)` is its
//! position inside its own cube, and rounded to the nearest integer (halves away from
//! zero). DC and the first shell pass through untouched; the divisor grows with the
//! shell index, which pushes most high-frequency coefficients to zero. Nothing about
//! the quantizer is signaled in the bitstream.

use num_traits::ToPrimitive;

use crate::error::CubeDctError;
use crate::types::{Coordinate, CubeGeometry};

/// Per-shell step multiplier.
const STEP_PER_SHELL: f32 = 5.0;

/// The quantization step for a coordinate.
#[inline]
pub fn step(coord: Coordinate) -> f32 {
    (STEP_PER_SHELL * coord.sum() as f32).max(1.0)
}

#[inline]
pub fn quantize(coeff: f32, coord: Coordinate) -> f32 {
    (coeff / step(coord)).round()
}

#[inline]
pub fn dequantize(coeff: f32, coord: Coordinate) -> f32 {
    (coeff * step(coord)).round()
}

/// Precomputed steps for every raster offset of one cube.
fn step_table(geometry: CubeGeometry) -> Vec<f32> {
    geometry.raster_coordinates().map(step).collect()
}

/// Quantizes a whole cube batch in place. `coeffs` holds consecutive raster cubes.
pub fn quantize_batch(coeffs: &mut [f32], geometry: CubeGeometry) -> Result<(), CubeDctError> {
    let steps = step_table(geometry);
    check_batch_len(coeffs.len(), steps.len())?;
    for cube in coeffs.chunks_exact_mut(steps.len()) {
        for (c, s) in cube.iter_mut().zip(&steps) {
            *c = (*c / s).round();
        }
    }
    Ok(())
}

/// Undoes [`quantize_batch`] (up to the rounding loss) in place.
pub fn dequantize_batch(coeffs: &mut [f32], geometry: CubeGeometry) -> Result<(), CubeDctError> {
    let steps = step_table(geometry);
    check_batch_len(coeffs.len(), steps.len())?;
    for cube in coeffs.chunks_exact_mut(steps.len()) {
        for (c, s) in cube.iter_mut().zip(&steps) {
            *c = (*c * s).round();
        }
    }
    Ok(())
}

/// Converts an already-rounded coefficient to the integer the entropy coder writes.
#[inline]
pub fn to_symbol(coeff: f32) -> Result<i32, CubeDctError> {
    coeff
        .to_i32()
        .ok_or(CubeDctError::CoefficientOverflow(coeff))
}

fn check_batch_len(len: usize, volume: usize) -> Result<(), CubeDctError> {
    if len % volume != 0 {
        return Err(CubeDctError::BufferMismatch(
            len.next_multiple_of(volume),
            len,
        ));
    }
    Ok(())
}
