//! WebAssembly exports for GridFilter.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffer Layout
//!
//! Grids cross the boundary as flat row-major `Float32Array`s together with
//! their `(n, c, h, w)` dimensions. Outputs use the same layout, except
//! `otsus_method_wasm` which returns one threshold per (n, c) plane.
//!
//! Invalid dimensions and parameters throw a JavaScript error carrying the
//! `FilterError` message.

use ndarray::Array4;
use wasm_bindgen::prelude::*;

use crate::error::FilterError;
use crate::filters::{self, PatchStat};
use crate::grid::Grid;

impl From<FilterError> for JsValue {
    fn from(err: FilterError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

fn grid_from(data: &[f32], n: usize, c: usize, h: usize, w: usize) -> Result<Grid, FilterError> {
    Ok(Array4::from_shape_vec((n, c, h, w), data.to_vec())?)
}

fn into_flat(grid: Grid) -> Vec<f32> {
    grid.into_raw_vec_and_offset().0
}

// ============================================================================
// Normalization
// ============================================================================

/// Mirror values around the midpoint of the finite range.
#[wasm_bindgen]
pub fn invert_wasm(data: &[f32], n: usize, c: usize, h: usize, w: usize) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    Ok(into_flat(filters::invert(input.view())))
}

/// Rescale every (n, c) plane to [0, 1].
#[wasm_bindgen]
pub fn range_normalize_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    let result = filters::range_normalize(input.view(), &filters::params::SPATIAL_AXES)?;
    Ok(into_flat(result))
}

// ============================================================================
// Patch Statistics / Morphology
// ============================================================================

/// Patch statistic over a (2r+1)x(2r+1) window.
///
/// # Arguments
/// * `data` - Flat grid (length = n * c * h * w)
/// * `radius` - Patch radius
/// * `stat` - "min", "max" or "median"
#[wasm_bindgen]
pub fn patch_stat_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    radius: usize,
    stat: &str,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    let stat: PatchStat = stat.parse()?;
    Ok(into_flat(filters::patch_stat(input.view(), radius, stat)))
}

/// Local contrast normalization against the patch min and max.
#[wasm_bindgen]
pub fn patch_range_normalize_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    radius: usize,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    Ok(into_flat(filters::patch_range_normalize(input.view(), radius)))
}

/// Morphological operation: "dilate", "erode", "open" or "close".
#[wasm_bindgen]
pub fn morphological_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    operation: &str,
    radius: usize,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    let result = filters::morphological_by_name(input.view(), operation, radius)?;
    Ok(into_flat(result))
}

// ============================================================================
// Threshold / Quantize
// ============================================================================

/// 1.0 where the value is >= `threshold`, else 0.0.
#[wasm_bindgen]
pub fn binary_threshold_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    threshold: f32,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    Ok(into_flat(filters::binary_threshold_scalar(input.view(), threshold)))
}

/// Otsu threshold per (n, c) plane.
///
/// # Returns
/// Flat array of length n * c
#[wasm_bindgen]
pub fn otsus_method_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    bins: usize,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    Ok(into_flat(filters::otsus_method(input.view(), bins)?))
}

/// Hysteresis threshold of two same-shaped masks.
#[wasm_bindgen]
pub fn hysteresis_threshold_wasm(
    weak: &[f32],
    strong: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
) -> Result<Vec<f32>, JsValue> {
    let weak = grid_from(weak, n, c, h, w)?;
    let strong = grid_from(strong, n, c, h, w)?;
    Ok(into_flat(filters::hysteresis_threshold(weak.view(), strong.view())?))
}

/// Snap values to `steps` levels with "round", "floor" or "ceil".
#[wasm_bindgen]
pub fn quantize_wasm(
    data: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    steps: usize,
    mode: &str,
) -> Result<Vec<f32>, JsValue> {
    let input = grid_from(data, n, c, h, w)?;
    Ok(into_flat(filters::quantize_by_name(input.view(), steps, mode)?))
}

// ============================================================================
// Edge Thinning
// ============================================================================

/// Non-maximum suppression mask from gradient magnitude and direction.
#[wasm_bindgen]
pub fn gradient_suppression_mask_wasm(
    magnitude: &[f32],
    theta: &[f32],
    n: usize,
    c: usize,
    h: usize,
    w: usize,
) -> Result<Vec<f32>, JsValue> {
    let magnitude = grid_from(magnitude, n, c, h, w)?;
    let theta = grid_from(theta, n, c, h, w)?;
    Ok(into_flat(filters::gradient_suppression_mask(magnitude.view(), theta.view())?))
}
