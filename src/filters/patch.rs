//! Patch statistics: Min, Max, Median and Range Normalize over a square window.
//!
//! Every output pixel is computed from the `(2r + 1) x (2r + 1)` window
//! centred on it. Reads outside the plane use edge replication: the nearest
//! in-bounds pixel is returned.
//!
//! ## Performance
//!
//! - **Min / Max**: separable row pass then column pass, each a running
//!   extremum over a monotonic deque. O(H x W) per plane regardless of radius.
//!   Replicated border pixels never change an extremum, so the window is
//!   simply clamped to the plane.
//! - **Median**: the window is gathered as distinct source pixels, each
//!   weighted by how many replicated reads land on it, so a radius larger
//!   than the plane never reads more than H x W values. The weighted middle
//!   element is found after sorting with `total_cmp`. Rows are processed in
//!   parallel with rayon.
//!
//! ## NaN
//!
//! NaN propagates: a window containing NaN yields NaN for min, max and
//! median alike.

use std::collections::VecDeque;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView4, Zip};
use rayon::prelude::*;
use tracing::debug;

use super::normalize::rescale;
use crate::error::FilterError;
use crate::grid::{map_planes, Grid};

/// Statistic computed over each patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStat {
    Min,
    Max,
    Median,
}

impl PatchStat {
    pub const ALL: [PatchStat; 3] = [PatchStat::Min, PatchStat::Max, PatchStat::Median];

    pub fn name(self) -> &'static str {
        match self {
            PatchStat::Min => "min",
            PatchStat::Max => "max",
            PatchStat::Median => "median",
        }
    }
}

impl FromStr for PatchStat {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatchStat::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| FilterError::invalid("stat", s, "expected one of: min, max, median"))
    }
}

/// Compute `stat` over the radius-`radius` patch around every pixel.
pub fn patch_stat(input: ArrayView4<f32>, radius: usize, stat: PatchStat) -> Grid {
    debug!(stat = stat.name(), radius, shape = ?input.shape(), "patch statistic");

    match stat {
        PatchStat::Min => map_planes(input, |_, plane| plane_extremum(plane, radius, is_lower)),
        PatchStat::Max => map_planes(input, |_, plane| plane_extremum(plane, radius, is_higher)),
        PatchStat::Median => map_planes(input, |_, plane| plane_median(plane, radius)),
    }
}

/// Minimum over each patch.
pub fn patch_min(input: ArrayView4<f32>, radius: usize) -> Grid {
    patch_stat(input, radius, PatchStat::Min)
}

/// Maximum over each patch.
pub fn patch_max(input: ArrayView4<f32>, radius: usize) -> Grid {
    patch_stat(input, radius, PatchStat::Max)
}

/// Median over each patch.
pub fn patch_median(input: ArrayView4<f32>, radius: usize) -> Grid {
    patch_stat(input, radius, PatchStat::Median)
}

/// Local contrast normalization: `(x - patch_min) / (patch_max - patch_min)`.
///
/// Pixels whose patch is flat or contains NaN map to 0.0.
pub fn patch_range_normalize(input: ArrayView4<f32>, radius: usize) -> Grid {
    let lows = patch_min(input, radius);
    let highs = patch_max(input, radius);

    let mut output = input.to_owned();
    Zip::from(&mut output)
        .and(&lows)
        .and(&highs)
        .for_each(|v, &lo, &hi| *v = rescale(*v, lo, hi));
    output
}

// ============================================================================
// Min / Max
// ============================================================================

// NaN dominates everything, so it stays at the deque front while in the window.
#[inline]
fn is_lower(candidate: f32, current: f32) -> bool {
    candidate.is_nan() || candidate <= current
}

#[inline]
fn is_higher(candidate: f32, current: f32) -> bool {
    candidate.is_nan() || candidate >= current
}

/// Separable running extremum: rows first, then columns.
fn plane_extremum(plane: ArrayView2<f32>, radius: usize, dominates: fn(f32, f32) -> bool) -> Array2<f32> {
    let (height, width) = plane.dim();

    // Pass 1: horizontal
    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| sliding_extremum(plane.row(y), radius, dominates))
        .collect();
    let temp = Array2::from_shape_fn((height, width), |(y, x)| rows[y][x]);

    // Pass 2: vertical
    let columns: Vec<Vec<f32>> = (0..width)
        .into_par_iter()
        .map(|x| sliding_extremum(temp.column(x), radius, dominates))
        .collect();
    Array2::from_shape_fn((height, width), |(y, x)| columns[x][y])
}

/// Extremum of `line[i - radius ..= i + radius]` (clamped) for every `i`.
///
/// The deque holds indices whose values are strictly monotonic from front to
/// back, so the front is always the extremum of the current window.
fn sliding_extremum(line: ArrayView1<f32>, radius: usize, dominates: fn(f32, f32) -> bool) -> Vec<f32> {
    let len = line.len();
    let mut output = vec![0.0f32; len];
    let mut window: VecDeque<usize> = VecDeque::with_capacity(len.min(radius.saturating_mul(2).saturating_add(1)));
    let mut next = 0usize;

    for (i, out) in output.iter_mut().enumerate() {
        let last = i.saturating_add(radius).min(len - 1);
        while next <= last {
            while let Some(&back) = window.back() {
                if dominates(line[next], line[back]) {
                    window.pop_back();
                } else {
                    break;
                }
            }
            window.push_back(next);
            next += 1;
        }

        let first = i.saturating_sub(radius);
        while let Some(&front) = window.front() {
            if front < first {
                window.pop_front();
            } else {
                break;
            }
        }

        if let Some(&front) = window.front() {
            *out = line[front];
        }
    }

    output
}

// ============================================================================
// Median
// ============================================================================

fn plane_median(plane: ArrayView2<f32>, radius: usize) -> Array2<f32> {
    let (height, width) = plane.dim();
    let radius = radius.min(stable_radius(height, width));
    let side = 2 * radius as u128 + 1;
    // Zero-based rank of the median in the (side x side) replicated window.
    let mid = side * side / 2;

    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let source_rows: Vec<(usize, u128)> = replicated_weights(y, radius, height).collect();
            let mut source_cols: Vec<(usize, u128)> = Vec::new();
            let mut window: Vec<(f32, u128)> = Vec::new();

            (0..width)
                .map(|x| {
                    source_cols.clear();
                    source_cols.extend(replicated_weights(x, radius, width));

                    window.clear();
                    for &(sy, wy) in &source_rows {
                        for &(sx, wx) in &source_cols {
                            window.push((plane[[sy, sx]], wy * wx));
                        }
                    }
                    weighted_median(&mut window, mid)
                })
                .collect()
        })
        .collect();

    Array2::from_shape_fn((height, width), |(y, x)| rows[y][x])
}

/// Radius beyond which the median of every pixel no longer changes.
///
/// Past `max(H, W)` each source weight is linear in the radius, so every
/// rank comparison is a fixed quadratic in it whose sign settles once the
/// radius exceeds its coefficients. Also capped so `side * side` fits `u128`.
fn stable_radius(height: usize, width: usize) -> usize {
    let span = height.saturating_add(width);
    height
        .saturating_mul(width)
        .saturating_mul(span.saturating_mul(span))
        .saturating_mul(4)
        .saturating_add(2)
        .min(usize::MAX >> 2)
}

/// Distinct in-bounds sources of the reads `center - radius ..= center + radius`
/// under edge replication, with how many reads each one receives.
fn replicated_weights(center: usize, radius: usize, len: usize) -> impl Iterator<Item = (usize, u128)> {
    let first = center.saturating_sub(radius);
    let last = center.saturating_add(radius).min(len - 1);
    let below = radius.saturating_sub(center) as u128;
    let above = (center as u128 + radius as u128).saturating_sub((len - 1) as u128);

    (first..=last).map(move |i| {
        let mut weight = 1u128;
        if i == 0 {
            weight += below;
        }
        if i == len - 1 {
            weight += above;
        }
        (i, weight)
    })
}

/// Value at zero-based rank `mid` of the weighted multiset, or NaN if any
/// value is NaN.
fn weighted_median(window: &mut [(f32, u128)], mid: u128) -> f32 {
    if window.iter().any(|(v, _)| v.is_nan()) {
        return f32::NAN;
    }
    window.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen = 0u128;
    for &(value, weight) in window.iter() {
        seen += weight;
        if seen > mid {
            return value;
        }
    }
    window.last().map_or(f32::NAN, |&(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::clamp_index;
    use ndarray::Array4;

    /// Deterministic, irregular test pattern.
    fn scrambled(shape: (usize, usize, usize, usize)) -> Grid {
        Array4::from_shape_fn(shape, |(n, c, y, x)| {
            let k = (n * 131 + c * 71 + y * 37 + x * 13) % 29;
            k as f32 * 0.25 - 3.0
        })
    }

    /// O(r^2) reference with explicit edge replication.
    fn naive(input: &Grid, radius: usize, stat: PatchStat) -> Grid {
        let (_, _, height, width) = input.dim();
        let r = radius as isize;
        let mut output = input.clone();
        for ((n, c, y, x), out) in output.indexed_iter_mut() {
            let mut values = Vec::new();
            for dy in -r..=r {
                for dx in -r..=r {
                    let sy = clamp_index(y as isize + dy, height);
                    let sx = clamp_index(x as isize + dx, width);
                    values.push(input[[n, c, sy, sx]]);
                }
            }
            if values.iter().any(|v| v.is_nan()) {
                *out = f32::NAN;
                continue;
            }
            values.sort_by(|a, b| a.total_cmp(b));
            *out = match stat {
                PatchStat::Min => values[0],
                PatchStat::Max => values[values.len() - 1],
                PatchStat::Median => values[values.len() / 2],
            };
        }
        output
    }

    /// Element-wise equality that treats NaN as equal to NaN.
    fn assert_same(actual: &Grid, expected: &Grid) {
        assert_eq!(actual.dim(), expected.dim());
        for ((idx, &a), &e) in actual.indexed_iter().zip(expected.iter()) {
            assert!(a == e || (a.is_nan() && e.is_nan()), "{idx:?}: {a} != {e}");
        }
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let img = scrambled((2, 2, 5, 6));
        for stat in PatchStat::ALL {
            assert_eq!(patch_stat(img.view(), 0, stat), img, "{stat:?}");
        }
    }

    #[test]
    fn test_min_max_match_naive_reference() {
        let img = scrambled((1, 2, 9, 7));
        for radius in [1, 2, 3, 5] {
            assert_eq!(patch_min(img.view(), radius), naive(&img, radius, PatchStat::Min));
            assert_eq!(patch_max(img.view(), radius), naive(&img, radius, PatchStat::Max));
        }
    }

    #[test]
    fn test_min_max_median_match_naive_reference_with_nan() {
        let mut img = scrambled((1, 2, 9, 7));
        img[[0, 0, 4, 3]] = f32::NAN;
        img[[0, 1, 0, 6]] = f32::NAN;
        for radius in [1, 2] {
            for stat in PatchStat::ALL {
                assert_same(&patch_stat(img.view(), radius, stat), &naive(&img, radius, stat));
            }
        }
    }

    #[test]
    fn test_nan_in_window_propagates_consistently() {
        let img = Array4::from_shape_vec((1, 1, 1, 5), vec![1.0, f32::NAN, 0.0, 3.0, 4.0]).unwrap();

        let lo = patch_min(img.view(), 1);
        let hi = patch_max(img.view(), 1);
        let mid = patch_median(img.view(), 1);

        for grid in [&lo, &hi, &mid] {
            assert!(grid[[0, 0, 0, 0]].is_nan());
            assert!(grid[[0, 0, 0, 2]].is_nan());
        }
        // Windows past the NaN recover.
        assert_eq!(lo[[0, 0, 0, 3]], 0.0);
        assert_eq!(hi[[0, 0, 0, 3]], 4.0);
        assert_eq!(mid[[0, 0, 0, 3]], 3.0);
        assert_eq!(lo[[0, 0, 0, 4]], 3.0);
    }

    #[test]
    fn test_median_matches_naive_reference() {
        let img = scrambled((2, 1, 6, 8));
        for radius in [1, 2] {
            assert_eq!(
                patch_median(img.view(), radius),
                naive(&img, radius, PatchStat::Median)
            );
        }
    }

    #[test]
    fn test_max_spreads_single_peak() {
        let mut img = Array4::<f32>::zeros((1, 1, 5, 5));
        img[[0, 0, 2, 2]] = 0.8;

        let result = patch_max(img.view(), 1);

        for y in 0..5 {
            for x in 0..5 {
                let inside = (1..=3).contains(&y) && (1..=3).contains(&x);
                assert_eq!(result[[0, 0, y, x]], if inside { 0.8 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_min_border_uses_replication_not_zero() {
        // Zero padding would pull every border pixel down to 0.
        let img = Array4::from_elem((1, 1, 4, 4), 5.0f32);
        let result = patch_min(img.view(), 2);
        assert!(result.iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_radius_larger_than_plane() {
        let img = scrambled((1, 1, 3, 2));
        let lo = img.iter().cloned().fold(f32::INFINITY, f32::min);
        let result = patch_min(img.view(), 50);
        assert!(result.iter().all(|&v| v == lo));
    }

    #[test]
    fn test_median_radius_larger_than_plane() {
        let img = scrambled((1, 1, 3, 4));
        // Radius 6 already exceeds the plane; the naive reference is still cheap.
        assert_eq!(patch_median(img.view(), 6), naive(&img, 6, PatchStat::Median));
    }

    #[test]
    fn test_median_huge_radius_is_bounded() {
        let img = Array4::from_elem((1, 1, 2, 2), 1.0f32);
        let result = patch_median(img.view(), 1 << 33);
        assert!(result.iter().all(|&v| v == 1.0));

        let result = patch_median(img.view(), usize::MAX);
        assert!(result.iter().all(|&v| v == 1.0));
        assert!(patch_max(img.view(), usize::MAX).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_median_stable_beyond_settling_radius() {
        let img = scrambled((1, 1, 2, 3));
        let settled = stable_radius(2, 3);
        assert_eq!(
            patch_median(img.view(), settled),
            patch_median(img.view(), settled * 8)
        );
    }

    #[test]
    fn test_replicated_weights_sum_to_window_side() {
        for (center, radius, len) in [(0, 1, 5), (2, 1, 5), (4, 3, 5), (1, 10, 3), (0, 4, 1)] {
            let weights: Vec<(usize, u128)> = replicated_weights(center, radius, len).collect();
            let total: u128 = weights.iter().map(|&(_, w)| w).sum();
            assert_eq!(total, 2 * radius as u128 + 1);
            assert!(weights.iter().all(|&(i, _)| i < len));
        }
    }

    #[test]
    fn test_median_replicated_corner() {
        // Corner window at radius 1 sees the corner pixel four times.
        let img = Array4::from_shape_vec(
            (1, 1, 3, 3),
            vec![9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let result = patch_median(img.view(), 1);
        assert_eq!(result[[0, 0, 0, 0]], 0.0);

        let img = Array4::from_shape_vec(
            (1, 1, 3, 3),
            vec![9.0, 9.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        // Window: 9 x4 (corner), 9 x2, 9 x2, 0 x1 -> median 9
        let result = patch_median(img.view(), 1);
        assert_eq!(result[[0, 0, 0, 0]], 9.0);
    }

    #[test]
    fn test_median_removes_salt() {
        let mut img = Array4::from_elem((1, 1, 5, 5), 0.5f32);
        img[[0, 0, 2, 2]] = 1.0;
        let result = patch_median(img.view(), 1);
        assert_eq!(result[[0, 0, 2, 2]], 0.5);
    }

    #[test]
    fn test_patch_range_normalize_local_contrast() {
        let img = Array4::from_shape_vec((1, 1, 1, 5), vec![0.0, 2.0, 4.0, 4.0, 4.0]).unwrap();
        let result = patch_range_normalize(img.view(), 1);
        assert_eq!(result[[0, 0, 0, 0]], 0.0);
        assert_eq!(result[[0, 0, 0, 1]], 0.5);
        assert_eq!(result[[0, 0, 0, 2]], 1.0);
        // Flat patch
        assert_eq!(result[[0, 0, 0, 4]], 0.0);
    }

    #[test]
    fn test_empty_plane() {
        let img = Grid::zeros((1, 1, 0, 4));
        assert_eq!(patch_min(img.view(), 2).dim(), (1, 1, 0, 4));
        assert_eq!(patch_median(img.view(), 2).dim(), (1, 1, 0, 4));
    }

    #[test]
    fn test_stat_from_str() {
        assert_eq!("median".parse::<PatchStat>().unwrap(), PatchStat::Median);
        assert!("mean".parse::<PatchStat>().is_err());
    }
}
