//! Elementwise and reduction filters: Invert, Sum Normalize, Range Normalize.
//!
//! Normalization reduces over a caller-chosen set of axes (usually the
//! spatial axes `[2, 3]`) and rescales every slice independently.
//!
//! ## Degenerate slices
//!
//! - **Zero range** (`max == min`): range normalization writes 0.0.
//! - **Zero or non-finite sum**: sum normalization leaves the slice unchanged.

use ndarray::{ArrayView4, Axis, Zip};

use super::params::check_axes;
use crate::error::Result;
use crate::grid::{finite_range, Grid};

/// Mirror values around the midpoint of the global range.
///
/// Output is `(max + min) - x` with the extrema taken over all finite values
/// in the grid, so the range itself is preserved. A grid with no finite
/// values is returned unchanged.
pub fn invert(input: ArrayView4<f32>) -> Grid {
    match finite_range(input.iter()) {
        Some((lo, hi)) => {
            let pivot = hi + lo;
            input.mapv(|v| pivot - v)
        }
        None => input.to_owned(),
    }
}

/// Divide every slice by its sum over `axes`.
pub fn sum_normalize(input: ArrayView4<f32>, axes: &[usize]) -> Result<Grid> {
    check_axes(axes)?;

    let sums = reduce_keep_dims(&input, axes, 0.0, |acc, v| acc + v);
    let mut output = input.to_owned();
    Zip::from(&mut output)
        .and_broadcast(&sums)
        .for_each(|v, &sum| {
            if sum != 0.0 && sum.is_finite() {
                *v /= sum;
            }
        });

    Ok(output)
}

/// Rescale every slice over `axes` so its minimum maps to 0 and maximum to 1.
pub fn range_normalize(input: ArrayView4<f32>, axes: &[usize]) -> Result<Grid> {
    check_axes(axes)?;

    let lows = reduce_keep_dims(&input, axes, f32::INFINITY, f32::min);
    let highs = reduce_keep_dims(&input, axes, f32::NEG_INFINITY, f32::max);

    let mut output = input.to_owned();
    Zip::from(&mut output)
        .and_broadcast(&lows)
        .and_broadcast(&highs)
        .for_each(|v, &lo, &hi| *v = rescale(*v, lo, hi));

    Ok(output)
}

/// `(v - lo) / (hi - lo)`, or 0.0 when the range is empty.
#[inline]
pub(crate) fn rescale(v: f32, lo: f32, hi: f32) -> f32 {
    let range = hi - lo;
    if range > 0.0 && range.is_finite() {
        (v - lo) / range
    } else {
        0.0
    }
}

/// Fold `axes` one at a time, keeping each reduced axis with length 1 so the
/// result broadcasts against the input.
fn reduce_keep_dims(
    input: &ArrayView4<f32>,
    axes: &[usize],
    init: f32,
    fold: fn(f32, f32) -> f32,
) -> Grid {
    let mut acc = input.to_owned();
    for &axis in axes {
        acc = acc
            .fold_axis(Axis(axis), init, |&a, &v| fold(a, v))
            .insert_axis(Axis(axis));
    }
    acc
}
