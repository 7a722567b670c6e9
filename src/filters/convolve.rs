//! 2D convolution of a grid by a small kernel grid.
//!
//! Depthwise cross-correlation (the kernel is not flipped). Output keeps the
//! input's shape; the kernel is centred on each pixel so both kernel
//! dimensions must be odd.
//!
//! ## Kernel layout
//!
//! | Kernel shape | Meaning |
//! |--------------|---------|
//! | (1, 1, kh, kw) | One kernel shared by every channel |
//! | (1, C, kh, kw) | Kernel `c` applied to channel `c` |

use std::str::FromStr;

use ndarray::{s, Array2, ArrayView2, ArrayView4};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{FilterError, Result};
use crate::grid::{clamp_index, map_planes, Grid};

/// Border handling for reads outside the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Out-of-bounds reads are 0.0.
    #[default]
    Zero,
    /// Out-of-bounds reads return the nearest in-bounds pixel.
    Replicate,
}

impl FromStr for Padding {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Padding::Zero),
            "replicate" => Ok(Padding::Replicate),
            _ => Err(FilterError::invalid("padding", s, "expected one of: zero, replicate")),
        }
    }
}

/// Convolve every channel of `input` with `kernel`, zero padded.
pub fn convolve_2d(input: ArrayView4<f32>, kernel: ArrayView4<f32>) -> Result<Grid> {
    convolve_2d_padded(input, kernel, Padding::Zero)
}

/// Convolve every channel of `input` with `kernel` using `padding` at borders.
///
/// # Arguments
/// * `input` - Grid (batch, channel, height, width)
/// * `kernel` - (1, 1, kh, kw) shared kernel or (1, C, kh, kw) per-channel kernels
/// * `padding` - Border handling
///
/// # Errors
/// * `InvalidArgument` if kh or kw is even
/// * `ShapeMismatch` if the kernel batch is not 1 or its channel count is neither 1 nor C
pub fn convolve_2d_padded(
    input: ArrayView4<f32>,
    kernel: ArrayView4<f32>,
    padding: Padding,
) -> Result<Grid> {
    let channels = input.dim().1;
    let (k_batch, k_channels, k_height, k_width) = kernel.dim();

    if k_height % 2 == 0 || k_width % 2 == 0 {
        return Err(FilterError::invalid(
            "kernel",
            format!("{k_height}x{k_width}"),
            "kernel height and width must be odd",
        ));
    }
    if k_batch != 1 || (k_channels != 1 && k_channels != channels) {
        return Err(FilterError::shape(
            &[1, channels, k_height, k_width],
            kernel.shape(),
        ));
    }

    debug!(kernel = ?kernel.shape(), ?padding, "convolve 2d");

    Ok(map_planes(input, |(_, c), plane| {
        let k = if k_channels == 1 { 0 } else { c };
        correlate_plane(plane, kernel.slice(s![0, k, .., ..]), padding)
    }))
}

fn correlate_plane(plane: ArrayView2<f32>, kernel: ArrayView2<f32>, padding: Padding) -> Array2<f32> {
    let (height, width) = plane.dim();
    let (k_height, k_width) = kernel.dim();
    let half_y = (k_height / 2) as isize;
    let half_x = (k_width / 2) as isize;

    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| {
                    let mut sum = 0.0f32;
                    for ((ky, kx), &kv) in kernel.indexed_iter() {
                        let sy = y as isize + ky as isize - half_y;
                        let sx = x as isize + kx as isize - half_x;
                        let inside = sy >= 0 && sy < height as isize && sx >= 0 && sx < width as isize;
                        let v = match (inside, padding) {
                            (true, _) => plane[[sy as usize, sx as usize]],
                            (false, Padding::Zero) => continue,
                            (false, Padding::Replicate) => {
                                plane[[clamp_index(sy, height), clamp_index(sx, width)]]
                            }
                        };
                        sum += v * kv;
                    }
                    sum
                })
                .collect()
        })
        .collect();

    Array2::from_shape_fn((height, width), |(y, x)| rows[y][x])
}
