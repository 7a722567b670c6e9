//! GridFilter
//!
//! Image-style filters over 4D `f32` grid tensors, implemented in Rust with
//! optional Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Grid Format
//! Every filter works on a (batch, channel, height, width) array:
//! - **Batch** and **channel** index independent 2D planes
//! - **Height** and **width** are the spatial axes the windows slide over
//!
//! Values are unconstrained floats; filters that produce masks write exactly
//! 0.0 or 1.0.
//!
//! ## Filter Architecture
//! Filters are pure functions from borrowed views to owned grids. Spatial
//! filters preserve the input shape; Otsu's method returns one threshold per
//! plane with shape (N, C, 1, 1) so it broadcasts back against the input.
//!
//! ```ignore
//! use gridfilter::filters::{otsus_method, binary_threshold};
//!
//! let t = otsus_method(grid.view(), 256)?;
//! let mask = binary_threshold(grid.view(), t.view())?;
//! ```

pub mod error;
pub mod filters;
pub mod grid;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FilterError, Result};
pub use grid::Grid;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray4, PyReadonlyArray4};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters::params::{
        DEFAULT_BINS, DEFAULT_MORPH_RADIUS, DEFAULT_RADIUS, DEFAULT_STEPS, SPATIAL_AXES,
    };
    use crate::filters::{self, Padding};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    // ========================================================================
    // Normalization
    // ========================================================================

    /// Mirror values around the midpoint of the grid's finite range.
    #[pyfunction]
    pub fn invert<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::invert(grid.as_array()).into_pyarray(py)
    }

    /// Divide each slice by its sum over `axes` (default: height, width).
    #[pyfunction]
    #[pyo3(signature = (grid, axes=None))]
    pub fn sum_normalize<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        axes: Option<Vec<usize>>,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let axes = axes.unwrap_or_else(|| SPATIAL_AXES.to_vec());
        let result = filters::sum_normalize(grid.as_array(), &axes)?;
        Ok(result.into_pyarray(py))
    }

    /// Rescale each slice over `axes` (default: height, width) to [0, 1].
    #[pyfunction]
    #[pyo3(signature = (grid, axes=None))]
    pub fn range_normalize<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        axes: Option<Vec<usize>>,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let axes = axes.unwrap_or_else(|| SPATIAL_AXES.to_vec());
        let result = filters::range_normalize(grid.as_array(), &axes)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Patch Statistics
    // ========================================================================

    /// Minimum over each (2r+1)x(2r+1) patch.
    #[pyfunction]
    #[pyo3(signature = (grid, radius=DEFAULT_RADIUS))]
    pub fn patch_min<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        radius: usize,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::patch_min(grid.as_array(), radius).into_pyarray(py)
    }

    /// Maximum over each (2r+1)x(2r+1) patch.
    #[pyfunction]
    #[pyo3(signature = (grid, radius=DEFAULT_RADIUS))]
    pub fn patch_max<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        radius: usize,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::patch_max(grid.as_array(), radius).into_pyarray(py)
    }

    /// Median over each (2r+1)x(2r+1) patch.
    #[pyfunction]
    #[pyo3(signature = (grid, radius=DEFAULT_RADIUS))]
    pub fn patch_median<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        radius: usize,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::patch_median(grid.as_array(), radius).into_pyarray(py)
    }

    /// Local contrast normalization against the patch min and max.
    #[pyfunction]
    #[pyo3(signature = (grid, radius=DEFAULT_RADIUS))]
    pub fn patch_range_normalize<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        radius: usize,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::patch_range_normalize(grid.as_array(), radius).into_pyarray(py)
    }

    // ========================================================================
    // Morphology / Convolution
    // ========================================================================

    /// Apply a morphological operation.
    ///
    /// # Arguments
    /// * `grid` - Input grid (N, C, H, W)
    /// * `operation` - One of "dilate", "erode", "open", "close"
    /// * `radius` - Patch radius (default: 3); 0 returns the input unchanged
    #[pyfunction]
    #[pyo3(signature = (grid, operation="dilate", radius=DEFAULT_MORPH_RADIUS))]
    pub fn morphological<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        operation: &str,
        radius: usize,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::morphological_by_name(grid.as_array(), operation, radius)?;
        Ok(result.into_pyarray(py))
    }

    /// Depthwise 2D cross-correlation with an odd-sized kernel.
    ///
    /// # Arguments
    /// * `grid` - Input grid (N, C, H, W)
    /// * `kernel` - (1, 1, kh, kw) shared or (1, C, kh, kw) per-channel kernel
    /// * `padding` - "zero" (default) or "replicate"
    #[pyfunction]
    #[pyo3(signature = (grid, kernel, padding="zero"))]
    pub fn convolve_2d<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        kernel: PyReadonlyArray4<'py, f32>,
        padding: &str,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let padding: Padding = padding.parse()?;
        let result = filters::convolve_2d_padded(grid.as_array(), kernel.as_array(), padding)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Threshold / Quantize
    // ========================================================================

    /// 1.0 where `grid >= threshold`, else 0.0. `threshold` broadcasts.
    #[pyfunction]
    pub fn binary_threshold<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        threshold: PyReadonlyArray4<'py, f32>,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::binary_threshold(grid.as_array(), threshold.as_array())?;
        Ok(result.into_pyarray(py))
    }

    /// 1.0 where `grid >= threshold`, else 0.0.
    #[pyfunction]
    pub fn binary_threshold_scalar<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        threshold: f32,
    ) -> Bound<'py, PyArray4<f32>> {
        filters::binary_threshold_scalar(grid.as_array(), threshold).into_pyarray(py)
    }

    /// Per-plane Otsu threshold, shape (N, C, 1, 1).
    #[pyfunction]
    #[pyo3(signature = (grid, bins=DEFAULT_BINS))]
    pub fn otsus_method<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        bins: usize,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::otsus_method(grid.as_array(), bins)?;
        Ok(result.into_pyarray(py))
    }

    /// Strong pixels plus weak pixels 8-connected to them.
    #[pyfunction]
    pub fn hysteresis_threshold<'py>(
        py: Python<'py>,
        weak: PyReadonlyArray4<'py, f32>,
        strong: PyReadonlyArray4<'py, f32>,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::hysteresis_threshold(weak.as_array(), strong.as_array())?;
        Ok(result.into_pyarray(py))
    }

    /// Snap values in [0, 1] to `steps` levels.
    ///
    /// # Arguments
    /// * `grid` - Input grid, clamped to [0, 1]
    /// * `steps` - Number of levels, 2..=1000000 (default: 256)
    /// * `mode` - "round" (default), "floor" or "ceil"
    #[pyfunction]
    #[pyo3(signature = (grid, steps=DEFAULT_STEPS, mode="round"))]
    pub fn quantize<'py>(
        py: Python<'py>,
        grid: PyReadonlyArray4<'py, f32>,
        steps: usize,
        mode: &str,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::quantize_by_name(grid.as_array(), steps, mode)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Edge Thinning
    // ========================================================================

    /// Non-maximum suppression mask from gradient magnitude and direction.
    #[pyfunction]
    pub fn gradient_suppression_mask<'py>(
        py: Python<'py>,
        magnitude: PyReadonlyArray4<'py, f32>,
        theta: PyReadonlyArray4<'py, f32>,
    ) -> PyResult<Bound<'py, PyArray4<f32>>> {
        let result = filters::gradient_suppression_mask(magnitude.as_array(), theta.as_array())?;
        Ok(result.into_pyarray(py))
    }

    #[pymodule]
    pub fn gridfilter(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Normalization
        m.add_function(wrap_pyfunction!(invert, m)?)?;
        m.add_function(wrap_pyfunction!(sum_normalize, m)?)?;
        m.add_function(wrap_pyfunction!(range_normalize, m)?)?;

        // Patch statistics
        m.add_function(wrap_pyfunction!(patch_min, m)?)?;
        m.add_function(wrap_pyfunction!(patch_max, m)?)?;
        m.add_function(wrap_pyfunction!(patch_median, m)?)?;
        m.add_function(wrap_pyfunction!(patch_range_normalize, m)?)?;

        // Morphology / convolution
        m.add_function(wrap_pyfunction!(morphological, m)?)?;
        m.add_function(wrap_pyfunction!(convolve_2d, m)?)?;

        // Threshold / quantize
        m.add_function(wrap_pyfunction!(binary_threshold, m)?)?;
        m.add_function(wrap_pyfunction!(binary_threshold_scalar, m)?)?;
        m.add_function(wrap_pyfunction!(otsus_method, m)?)?;
        m.add_function(wrap_pyfunction!(hysteresis_threshold, m)?)?;
        m.add_function(wrap_pyfunction!(quantize, m)?)?;

        // Edge thinning
        m.add_function(wrap_pyfunction!(gradient_suppression_mask, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::gridfilter;
