//! N-step quantization of unit-range grids.
//!
//! Values are clamped to [0, 1] and snapped to one of `steps` evenly spaced
//! levels `0, 1/(steps-1), ..., 1`. The rounding mode decides which level a
//! value between two levels lands on.

use std::str::FromStr;

use ndarray::ArrayView4;

use super::params::check_steps;
use crate::error::{FilterError, Result};
use crate::grid::Grid;

/// Rounding applied to `x * (steps - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantizeMode {
    /// Nearest level, ties to even.
    #[default]
    Round,
    Floor,
    Ceil,
}

/// Mode names accepted by [`QuantizeMode::from_str`].
const MODES: [(&str, QuantizeMode); 3] = [
    ("round", QuantizeMode::Round),
    ("floor", QuantizeMode::Floor),
    ("ceil", QuantizeMode::Ceil),
];

impl QuantizeMode {
    pub fn name(self) -> &'static str {
        match self {
            QuantizeMode::Round => "round",
            QuantizeMode::Floor => "floor",
            QuantizeMode::Ceil => "ceil",
        }
    }

    fn rounding(self) -> fn(f32) -> f32 {
        match self {
            QuantizeMode::Round => f32::round_ties_even,
            QuantizeMode::Floor => f32::floor,
            QuantizeMode::Ceil => f32::ceil,
        }
    }
}

impl FromStr for QuantizeMode {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MODES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|&(_, mode)| mode)
            .ok_or_else(|| FilterError::invalid("mode", s, "expected one of: round, floor, ceil"))
    }
}

/// Snap every value to one of `steps` levels in [0, 1].
///
/// # Arguments
/// * `input` - Grid; values outside [0, 1] are clamped first
/// * `steps` - Number of levels, 2..=1_000_000
/// * `mode` - Rounding mode
pub fn quantize(input: ArrayView4<f32>, steps: usize, mode: QuantizeMode) -> Result<Grid> {
    check_steps(steps)?;

    let levels = (steps - 1) as f32;
    let rounding = mode.rounding();
    Ok(input.mapv(|v| rounding(v.clamp(0.0, 1.0) * levels) / levels))
}

/// [`quantize`] with the rounding mode given by name.
pub fn quantize_by_name(input: ArrayView4<f32>, steps: usize, mode: &str) -> Result<Grid> {
    quantize(input, steps, mode.parse()?)
}
