//! Cross-filter properties checked through the public API.

use approx::assert_abs_diff_eq;
use gridfilter::filters::params::SPATIAL_AXES;
use gridfilter::filters::{
    binary_threshold, close, convolve_2d, dilate, erode, hysteresis_threshold, invert,
    morphological, open, otsus_method, patch_max, patch_median, patch_min, quantize,
    range_normalize, MorphOp, QuantizeMode,
};
use gridfilter::{FilterError, Grid};
use ndarray::{s, Array4};

/// Irregular but deterministic grid with several planes.
fn textured(shape: (usize, usize, usize, usize)) -> Grid {
    Array4::from_shape_fn(shape, |(n, c, y, x)| {
        let k = (n * 97 + c * 53 + y * 29 + x * 17 + y * x) % 41;
        k as f32 / 8.0 - 2.0
    })
}

#[test]
fn test_range_normalize_bounds_per_plane() {
    let g = textured((2, 3, 7, 9));
    let result = range_normalize(g.view(), &SPATIAL_AXES).unwrap();

    for n in 0..2 {
        for c in 0..3 {
            let plane = result.slice(s![n, c, .., ..]);
            let lo = plane.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = plane.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            assert_eq!(lo, 0.0);
            assert_eq!(hi, 1.0);
        }
    }
}

#[test]
fn test_radius_zero_patches_are_identity() {
    let g = textured((1, 2, 5, 5));
    assert_eq!(patch_min(g.view(), 0), g);
    assert_eq!(patch_max(g.view(), 0), g);
    assert_eq!(patch_median(g.view(), 0), g);
}

#[test]
fn test_patch_statistics_are_ordered() {
    let g = textured((2, 2, 8, 6));
    for radius in [1, 2] {
        let lo = patch_min(g.view(), radius);
        let mid = patch_median(g.view(), radius);
        let hi = patch_max(g.view(), radius);
        for ((&a, &b), (&c, &v)) in lo.iter().zip(mid.iter()).zip(hi.iter().zip(g.iter())) {
            assert!(a <= b && b <= c);
            assert!(a <= v && v <= c);
        }
    }
}

#[test]
fn test_open_is_dilate_of_erode() {
    let g = textured((1, 3, 9, 9));
    for radius in [1, 2, 3] {
        assert_eq!(dilate(erode(g.view(), radius).view(), radius), open(g.view(), radius));
    }
}

#[test]
fn test_open_below_close_above() {
    let g = textured((1, 1, 10, 10));
    let opened = open(g.view(), 2);
    let closed = close(g.view(), 2);
    for ((&o, &c), &v) in opened.iter().zip(closed.iter()).zip(g.iter()) {
        assert!(o <= v && v <= c);
    }
}

#[test]
fn test_morphological_preserves_shape() {
    let g = textured((2, 1, 4, 11));
    for op in MorphOp::ALL {
        assert_eq!(morphological(g.view(), op, 3).dim(), g.dim());
    }
}

#[test]
fn test_self_threshold_everywhere_one() {
    let g = textured((2, 2, 4, 4));
    let mask = binary_threshold(g.view(), g.view()).unwrap();
    assert!(mask.iter().all(|&v| v == 1.0));
}

#[test]
fn test_otsu_separates_two_clusters() {
    let g = Array4::from_shape_fn((1, 2, 6, 6), |(_, c, y, x)| {
        let base = if (x + y) % 2 == 0 { 0.2 } else { 0.7 };
        base + c as f32 * 0.05 + (x % 3) as f32 * 0.01
    });

    let t = otsus_method(g.view(), 256).unwrap();
    assert_eq!(t.dim(), (1, 2, 1, 1));

    for c in 0..2 {
        let offset = c as f32 * 0.05;
        let low_max = 0.22 + offset;
        let high_min = 0.7 + offset;
        let threshold = t[[0, c, 0, 0]];
        assert!(threshold > low_max && threshold < high_min, "plane {c}: {threshold}");
    }

    let mask = binary_threshold(g.view(), t.view()).unwrap();
    for ((_, _, y, x), &v) in mask.indexed_iter() {
        assert_eq!(v, if (x + y) % 2 == 0 { 0.0 } else { 1.0 });
    }
}

#[test]
fn test_hysteresis_strip() {
    let strong = Array4::from_shape_vec((1, 1, 1, 7), vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
    let weak = Array4::from_shape_vec((1, 1, 1, 7), vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0]).unwrap();

    let result = hysteresis_threshold(weak.view(), strong.view()).unwrap();

    let kept: Vec<usize> = result
        .iter()
        .enumerate()
        .filter(|(_, &v)| v == 1.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(kept, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_unit_kernel_convolution_is_identity() {
    let g = textured((2, 3, 5, 4));
    let kernel = Array4::from_elem((1, 1, 1, 1), 1.0f32);
    assert_eq!(convolve_2d(g.view(), kernel.view()).unwrap(), g);
}

#[test]
fn test_two_step_quantize_is_binary() {
    let g = Array4::from_shape_fn((1, 1, 4, 8), |(_, _, y, x)| (y * 8 + x) as f32 / 31.0);
    let result = quantize(g.view(), 2, QuantizeMode::Round).unwrap();
    assert!(result.iter().all(|&v| v == 0.0 || v == 1.0));
    assert!(result.iter().any(|&v| v == 0.0));
    assert!(result.iter().any(|&v| v == 1.0));
}

#[test]
fn test_invert_is_involution() {
    let g = textured((2, 2, 6, 6));
    let twice = invert(invert(g.view()).view());
    for (a, b) in twice.iter().zip(g.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-5);
    }
}

#[test]
fn test_pipeline_errors_surface_as_filter_error() {
    let g = textured((1, 2, 4, 4));
    let other = textured((1, 3, 4, 4));
    assert!(matches!(
        hysteresis_threshold(g.view(), other.view()),
        Err(FilterError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        quantize(g.view(), 1, QuantizeMode::Floor),
        Err(FilterError::InvalidArgument { .. })
    ));
}
