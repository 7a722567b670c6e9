//! Filter modules for grid tensors.
//!
//! ## Grid Layout
//!
//! Every filter takes and returns a 4D `f32` grid:
//!
//! | Axis | Name | Description |
//! |------|------|-------------|
//! | 0 | N | Batch |
//! | 1 | C | Channel |
//! | 2 | H | Height (row index) |
//! | 3 | W | Width (column index) |
//!
//! Spatial filters treat each (N, C) plane independently and preserve the
//! full shape. Normalization reduces over caller-chosen axes.
//!
//! ## Architecture
//!
//! All filters follow these principles:
//! - **Pure** - Inputs are borrowed views, outputs are freshly allocated grids
//! - **Plane parallel** - rayon over the flattened N*C plane index
//! - **Edge replication** - Window reads past the border use the nearest pixel
//!   (convolution also offers zero padding)
//! - **Validated** - Bad parameters and shapes return `FilterError`, never panic
//!
//! ## Filter Categories
//!
//! - **Normalization**: invert, sum_normalize, range_normalize
//! - **Patch statistics**: patch_min, patch_max, patch_median, patch_range_normalize
//! - **Morphology**: dilate, erode, open, close
//! - **Convolution**: convolve_2d
//! - **Threshold**: binary_threshold, otsus_method, hysteresis_threshold
//! - **Quantization**: quantize
//! - **Edge thinning**: gradient_suppression_mask

pub mod params;

pub mod normalize;
pub mod patch;
pub mod morphology;
pub mod convolve;
pub mod threshold;
pub mod quantize;
pub mod nms;

pub use convolve::{convolve_2d, convolve_2d_padded, Padding};
pub use morphology::{close, dilate, erode, morphological, morphological_by_name, open, MorphOp};
pub use nms::gradient_suppression_mask;
pub use normalize::{invert, range_normalize, sum_normalize};
pub use patch::{patch_max, patch_median, patch_min, patch_range_normalize, patch_stat, PatchStat};
pub use quantize::{quantize, quantize_by_name, QuantizeMode};
pub use threshold::{binary_threshold, binary_threshold_scalar, hysteresis_threshold, otsus_method};
