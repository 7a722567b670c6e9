//! Morphology filters: Dilate, Erode, Open, Close.
//!
//! Square structuring element of side `2r + 1` with edge replication at the
//! borders. Dilate and erode are the patch max and min; open and close are
//! their compositions.
//!
//! Radius 0 returns the input unchanged without running any pass.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView4;
use tracing::debug;

use super::patch::{patch_max, patch_min};
use crate::error::{FilterError, Result};
use crate::grid::Grid;

/// Morphological operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    Dilate,
    Erode,
    Open,
    Close,
}

impl MorphOp {
    pub const ALL: [MorphOp; 4] = [MorphOp::Dilate, MorphOp::Erode, MorphOp::Open, MorphOp::Close];

    pub fn name(self) -> &'static str {
        match self {
            MorphOp::Dilate => "dilate",
            MorphOp::Erode => "erode",
            MorphOp::Open => "open",
            MorphOp::Close => "close",
        }
    }
}

impl fmt::Display for MorphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MorphOp {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MorphOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| {
                FilterError::invalid(
                    "operation",
                    s,
                    "expected one of: dilate, erode, open, close",
                )
            })
    }
}

// ============================================================================
// Dilate / Erode
// ============================================================================

/// Apply dilation: maximum over each patch.
///
/// Bright regions grow, dark regions shrink.
pub fn dilate(input: ArrayView4<f32>, radius: usize) -> Grid {
    patch_max(input, radius)
}

/// Apply erosion: minimum over each patch.
///
/// Dark regions grow, bright regions shrink.
pub fn erode(input: ArrayView4<f32>, radius: usize) -> Grid {
    patch_min(input, radius)
}

// ============================================================================
// Compound Operations
// ============================================================================

/// Opening (erode then dilate). Removes bright features smaller than the patch.
pub fn open(input: ArrayView4<f32>, radius: usize) -> Grid {
    let eroded = erode(input, radius);
    dilate(eroded.view(), radius)
}

/// Closing (dilate then erode). Fills dark gaps smaller than the patch.
pub fn close(input: ArrayView4<f32>, radius: usize) -> Grid {
    let dilated = dilate(input, radius);
    erode(dilated.view(), radius)
}

/// Apply `op` with the given radius.
///
/// # Arguments
/// * `input` - Grid (batch, channel, height, width)
/// * `op` - Operation to apply
/// * `radius` - Patch radius; 0 returns an exact copy of `input`
pub fn morphological(input: ArrayView4<f32>, op: MorphOp, radius: usize) -> Grid {
    if radius == 0 {
        return input.to_owned();
    }

    debug!(%op, radius, "morphological filter");
    match op {
        MorphOp::Dilate => dilate(input, radius),
        MorphOp::Erode => erode(input, radius),
        MorphOp::Open => open(input, radius),
        MorphOp::Close => close(input, radius),
    }
}

/// [`morphological`] with the operation given by name.
///
/// Unknown names fail with `InvalidArgument` listing the allowed set.
pub fn morphological_by_name(input: ArrayView4<f32>, operation: &str, radius: usize) -> Result<Grid> {
    let op = operation.parse::<MorphOp>()?;
    Ok(morphological(input, op, radius))
}
