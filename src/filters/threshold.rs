//! Threshold filters: Binary Threshold, Otsu's Method, Hysteresis Threshold.
//!
//! All mask outputs are exactly 0.0 or 1.0.

use std::collections::VecDeque;

use ndarray::{Array2, Array4, ArrayView2, ArrayView4, Zip};
use rayon::prelude::*;
use tracing::{debug, trace};

use super::params::check_bins;
use crate::error::{FilterError, Result};
use crate::grid::{finite_range, map_plane_pairs, Grid};

// ============================================================================
// Binary Threshold
// ============================================================================

/// `1.0` where `input >= threshold`, else `0.0`.
///
/// `threshold` is broadcast against `input` (e.g. a (N, C, 1, 1) grid from
/// [`otsus_method`], or a (1, 1, 1, 1) scalar grid).
pub fn binary_threshold(input: ArrayView4<f32>, threshold: ArrayView4<f32>) -> Result<Grid> {
    let threshold = threshold
        .broadcast(input.raw_dim())
        .ok_or_else(|| FilterError::shape(input.shape(), threshold.shape()))?;

    let mut output = Grid::zeros(input.raw_dim());
    Zip::from(&mut output)
        .and(&input)
        .and(&threshold)
        .for_each(|out, &v, &t| *out = if v >= t { 1.0 } else { 0.0 });
    Ok(output)
}

/// [`binary_threshold`] against a single scalar.
pub fn binary_threshold_scalar(input: ArrayView4<f32>, threshold: f32) -> Grid {
    input.mapv(|v| if v >= threshold { 1.0 } else { 0.0 })
}

// ============================================================================
// Otsu's Method
// ============================================================================

/// Per-plane threshold maximizing the between-class variance.
///
/// Each (batch, channel) plane gets its own histogram of `bins` equal-width
/// bins spanning the plane's finite value range. The returned threshold is
/// the upper edge of the last background bin, so
/// `binary_threshold(g, otsus_method(g, bins)?)` marks the foreground class.
///
/// # Returns
/// Grid of shape (N, C, 1, 1), broadcastable against the input.
///
/// Planes that cannot be split (constant, or all values in one bin) yield the
/// midpoint of their range; planes with no finite values yield 0.0.
/// `bins` must lie in `1..=MAX_BINS`.
pub fn otsus_method(input: ArrayView4<f32>, bins: usize) -> Result<Grid> {
    check_bins(bins)?;

    let (batch, channels, _, _) = input.dim();
    let thresholds: Vec<f32> = (0..batch * channels)
        .into_par_iter()
        .map(|i| otsu_plane(input.slice(ndarray::s![i / channels, i % channels, .., ..]), bins))
        .collect();

    debug!(bins, planes = thresholds.len(), "otsu thresholds");
    Ok(Array4::from_shape_fn((batch, channels, 1, 1), |(n, c, _, _)| {
        thresholds[n * channels + c]
    }))
}

fn otsu_plane(plane: ArrayView2<f32>, bins: usize) -> f32 {
    let Some((lo, hi)) = finite_range(plane.iter()) else {
        return 0.0;
    };
    let midpoint = lo + (hi - lo) * 0.5;
    if hi <= lo {
        return midpoint;
    }

    let lo = lo as f64;
    let range = hi as f64 - lo;
    let mut hist = vec![0u64; bins];
    for &v in plane.iter().filter(|v| v.is_finite()) {
        let idx = ((v as f64 - lo) / range * bins as f64) as usize;
        hist[idx.min(bins - 1)] += 1;
    }

    let total: f64 = hist.iter().sum::<u64>() as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut best: Option<usize> = None;
    let mut best_variance = 0.0f64;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;

    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        sum_bg += t as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;

        let between = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if between > best_variance {
            best_variance = between;
            best = Some(t);
        }
    }

    match best {
        Some(t) => (lo + range * (t + 1) as f64 / bins as f64) as f32,
        None => midpoint,
    }
}

// ============================================================================
// Hysteresis Threshold
// ============================================================================

/// 8-connected neighbourhood (dy, dx).
#[rustfmt::skip]
const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Keep strong pixels plus weak pixels connected to them through weak pixels.
///
/// Both masks must have identical shapes. A pixel is set when its value is
/// greater than 0. Connectivity is 8-neighbour. Propagation is a breadth-first
/// flood from every strong seed; each pixel is queued at most once.
pub fn hysteresis_threshold(weak: ArrayView4<f32>, strong: ArrayView4<f32>) -> Result<Grid> {
    map_plane_pairs(weak, strong, hysteresis_plane)
}

fn hysteresis_plane(weak: ArrayView2<f32>, strong: ArrayView2<f32>) -> Array2<f32> {
    let (height, width) = weak.dim();
    let mut edges = Array2::<f32>::zeros((height, width));
    let mut queue = VecDeque::new();

    for ((y, x), &s) in strong.indexed_iter() {
        if s > 0.0 {
            edges[[y, x]] = 1.0;
            queue.push_back((y, x));
        }
    }
    let seeds = queue.len();
    let mut grown = 0usize;

    while let Some((y, x)) = queue.pop_front() {
        for &(dy, dx) in &NEIGHBORS_8 {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            if ny < 0 || ny >= height as isize || nx < 0 || nx >= width as isize {
                continue;
            }
            let (ny, nx) = (ny as usize, nx as usize);
            if edges[[ny, nx]] == 0.0 && weak[[ny, nx]] > 0.0 {
                edges[[ny, nx]] = 1.0;
                grown += 1;
                queue.push_back((ny, nx));
            }
        }
    }

    trace!(seeds, grown, "hysteresis plane");
    edges
}
