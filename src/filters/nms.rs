//! Gradient non-maximum suppression mask.
//!
//! Thins a gradient magnitude grid to ridge pixels: a pixel survives when its
//! magnitude is at least that of both neighbours along its gradient
//! direction.
//!
//! ## Direction quantization
//!
//! `theta` is in radians, measured from the +W axis toward +H (row index
//! increasing). It is snapped to the nearest multiple of 45 degrees:
//!
//! | Sector | theta (deg) | Neighbour offset (dy, dx) |
//! |--------|-------------|---------------------------|
//! | 0 | 0 | (0, 1) |
//! | 1 | 45 | (1, 1) |
//! | 2 | 90 | (1, 0) |
//! | 3 | 135 | (1, -1) |
//! | 4 | 180 | (0, -1) |
//! | 5 | 225 | (-1, -1) |
//! | 6 | 270 | (-1, 0) |
//! | 7 | 315 | (-1, 1) |
//!
//! Both `p + offset` and `p - offset` are compared, read with edge
//! replication. Opposite sectors therefore give the same mask.

use std::f32::consts::FRAC_PI_4;

use ndarray::{Array2, ArrayView2, ArrayView4};
use rayon::prelude::*;

use crate::error::Result;
use crate::grid::{clamp_index, map_plane_pairs, Grid};

const DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Neighbour offset for a gradient angle. Non-finite angles use sector 0.
#[inline]
fn direction(theta: f32) -> (isize, isize) {
    if !theta.is_finite() {
        return DIRECTIONS[0];
    }
    let sector = ((theta / FRAC_PI_4).round() as i64).rem_euclid(8);
    DIRECTIONS[sector as usize]
}

/// 1.0 where `magnitude` is a local maximum along `theta`, else 0.0.
///
/// # Arguments
/// * `magnitude` - Gradient magnitude grid
/// * `theta` - Gradient direction in radians, same shape as `magnitude`
///
/// Ties keep the pixel (`>=`), so plateaus survive whole.
pub fn gradient_suppression_mask(magnitude: ArrayView4<f32>, theta: ArrayView4<f32>) -> Result<Grid> {
    map_plane_pairs(magnitude, theta, suppress_plane)
}

fn suppress_plane(magnitude: ArrayView2<f32>, theta: ArrayView2<f32>) -> Array2<f32> {
    let (height, width) = magnitude.dim();

    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| {
                    let (dy, dx) = direction(theta[[y, x]]);
                    let ahead = magnitude[[
                        clamp_index(y as isize + dy, height),
                        clamp_index(x as isize + dx, width),
                    ]];
                    let behind = magnitude[[
                        clamp_index(y as isize - dy, height),
                        clamp_index(x as isize - dx, width),
                    ]];
                    let m = magnitude[[y, x]];
                    if m >= ahead && m >= behind { 1.0 } else { 0.0 }
                })
                .collect()
        })
        .collect();

    Array2::from_shape_fn((height, width), |(y, x)| rows[y][x])
}
