//! Parameter defaults and range checks shared by the filters.
//!
//! Defaults match the values the filters are exposed with to hosts:
//!
//! | Parameter | Default | Range |
//! |-----------|---------|-------|
//! | patch radius | 1 | >= 0 |
//! | morphological radius | 3 | >= 0 |
//! | Otsu bins | 256 | 1..=1_048_576 |
//! | quantize steps | 256 | 2..=1_000_000 |

use crate::error::{FilterError, Result};

/// Default radius for the patch min/max/median/range-normalize filters.
pub const DEFAULT_RADIUS: usize = 1;

/// Default radius for the morphological filter.
pub const DEFAULT_MORPH_RADIUS: usize = 3;

/// Default histogram bin count for Otsu's method.
pub const DEFAULT_BINS: usize = 256;

/// Default number of quantization levels.
pub const DEFAULT_STEPS: usize = 256;

/// Fewest quantization levels: black and white.
pub const MIN_STEPS: usize = 2;

/// Most quantization levels accepted.
pub const MAX_STEPS: usize = 1_000_000;

/// Largest histogram bin count accepted by Otsu's method.
pub const MAX_BINS: usize = 1 << 20;

/// Axes reduced by the normalization filters by default: height and width.
pub const SPATIAL_AXES: [usize; 2] = [2, 3];

pub(crate) fn check_bins(bins: usize) -> Result<()> {
    if !(1..=MAX_BINS).contains(&bins) {
        return Err(FilterError::invalid(
            "bins",
            bins,
            format!("must be in 1..={MAX_BINS}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_steps(steps: usize) -> Result<()> {
    if !(MIN_STEPS..=MAX_STEPS).contains(&steps) {
        return Err(FilterError::invalid(
            "steps",
            steps,
            format!("must be in {MIN_STEPS}..={MAX_STEPS}"),
        ));
    }
    Ok(())
}

/// Reduction axes must be non-empty, unique and index one of the 4 grid axes.
pub(crate) fn check_axes(axes: &[usize]) -> Result<()> {
    if axes.is_empty() {
        return Err(FilterError::invalid("axes", "[]", "at least one axis is required"));
    }
    for (i, &axis) in axes.iter().enumerate() {
        if axis >= 4 {
            return Err(FilterError::invalid(
                "axes",
                format!("{axes:?}"),
                format!("axis {axis} out of range for a 4D grid"),
            ));
        }
        if axes[..i].contains(&axis) {
            return Err(FilterError::invalid(
                "axes",
                format!("{axes:?}"),
                format!("axis {axis} repeated"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_range() {
        assert!(check_bins(0).is_err());
        assert!(check_bins(1).is_ok());
        assert!(check_bins(DEFAULT_BINS).is_ok());
        assert!(check_bins(MAX_BINS).is_ok());
        assert!(check_bins(MAX_BINS + 1).is_err());
        assert!(check_bins(usize::MAX).is_err());
    }

    #[test]
    fn test_steps_range() {
        assert!(check_steps(1).is_err());
        assert!(check_steps(MIN_STEPS).is_ok());
        assert!(check_steps(DEFAULT_STEPS).is_ok());
        assert!(check_steps(MAX_STEPS).is_ok());
        assert!(check_steps(MAX_STEPS + 1).is_err());
    }

    #[test]
    fn test_axes_validation() {
        assert!(check_axes(&SPATIAL_AXES).is_ok());
        assert!(check_axes(&[0, 1, 2, 3]).is_ok());
        assert!(check_axes(&[]).is_err());
        assert!(check_axes(&[4]).is_err());
        assert!(check_axes(&[2, 2]).is_err());
    }
}
