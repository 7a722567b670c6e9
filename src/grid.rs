//! Grid tensor conventions.
//!
//! A grid is a 4D `f32` array laid out as (batch, channel, height, width).
//! Every filter treats it as a batch of independent single-channel planes:
//! the (batch, channel) planes are processed in parallel with rayon and the
//! results are stacked back into a grid of the input shape.

use ndarray::{s, Array2, Array4, ArrayView2, ArrayView4};
use rayon::prelude::*;

use crate::error::{FilterError, Result};

/// Dense (batch, channel, height, width) grid tensor.
pub type Grid = Array4<f32>;

/// Apply `f` to every (batch, channel) plane in parallel.
///
/// `f` receives the plane's `(batch, channel)` index and must return a plane
/// of the same (height, width).
pub(crate) fn map_planes<F>(input: ArrayView4<f32>, f: F) -> Grid
where
    F: Fn((usize, usize), ArrayView2<f32>) -> Array2<f32> + Sync,
{
    let (batch, channels, height, width) = input.dim();

    let planes: Vec<Array2<f32>> = (0..batch * channels)
        .into_par_iter()
        .map(|i| {
            let (n, c) = (i / channels, i % channels);
            f((n, c), input.slice(s![n, c, .., ..]))
        })
        .collect();

    stack_planes(planes, (batch, channels, height, width))
}

/// Apply `f` to matching planes of two same-shaped grids in parallel.
pub(crate) fn map_plane_pairs<F>(a: ArrayView4<f32>, b: ArrayView4<f32>, f: F) -> Result<Grid>
where
    F: Fn(ArrayView2<f32>, ArrayView2<f32>) -> Array2<f32> + Sync,
{
    check_same_shape(&a, &b)?;
    let (batch, channels, height, width) = a.dim();

    let planes: Vec<Array2<f32>> = (0..batch * channels)
        .into_par_iter()
        .map(|i| {
            let (n, c) = (i / channels, i % channels);
            f(a.slice(s![n, c, .., ..]), b.slice(s![n, c, .., ..]))
        })
        .collect();

    Ok(stack_planes(planes, (batch, channels, height, width)))
}

fn stack_planes(planes: Vec<Array2<f32>>, dim: (usize, usize, usize, usize)) -> Grid {
    let channels = dim.1;
    let mut output = Grid::zeros(dim);
    for (i, plane) in planes.into_iter().enumerate() {
        output
            .slice_mut(s![i / channels, i % channels, .., ..])
            .assign(&plane);
    }
    output
}

/// Fail with `ShapeMismatch` unless both grids have identical shapes.
pub(crate) fn check_same_shape(expected: &ArrayView4<f32>, actual: &ArrayView4<f32>) -> Result<()> {
    if expected.shape() != actual.shape() {
        return Err(FilterError::shape(expected.shape(), actual.shape()));
    }
    Ok(())
}

/// Edge-replicate an offset index into `0..len`.
///
/// `len` must be non-zero.
#[inline]
pub(crate) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Minimum and maximum over the finite values, or `None` if there are none.
pub(crate) fn finite_range<'a, I>(values: I) -> Option<(f32, f32)>
where
    I: IntoIterator<Item = &'a f32>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
