use nalgebra::{Matrix3, SymmetricEigen};

/// Shape decision for a capacity-filled reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeClass {
    /// The neighborhood lies (near) a single plane; one point represents it.
    Flat,
    /// Significant variance off the best-fit plane; keep a richer sample.
    Structured,
}

/// Smallest eigenvalue of the PCA covariance of `points`: the variance
/// orthogonal to the best-fit plane. Exactly coplanar input gives 0 up to
/// rounding; the value is clamped at 0 so callers can treat it as a variance.
///
/// Covariance is centroid-subtracted and normalized by n (the PCL
/// convention). This runs once per voxel on a handful of points, so the
/// general symmetric eigensolver is plenty fast.
pub fn smallest_eigenvalue(points: &[[f64; 3]]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f64;
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut cz = 0.0;
    for p in points {
        cx += p[0];
        cy += p[1];
        cz += p[2];
    }
    cx /= n;
    cy /= n;
    cz /= n;

    // Upper triangle of the symmetric 3x3 covariance
    let mut c00 = 0.0;
    let mut c01 = 0.0;
    let mut c02 = 0.0;
    let mut c11 = 0.0;
    let mut c12 = 0.0;
    let mut c22 = 0.0;
    for p in points {
        let dx = p[0] - cx;
        let dy = p[1] - cy;
        let dz = p[2] - cz;
        c00 += dx * dx;
        c01 += dx * dy;
        c02 += dx * dz;
        c11 += dy * dy;
        c12 += dy * dz;
        c22 += dz * dz;
    }

    let cov = Matrix3::new(
        c00 / n,
        c01 / n,
        c02 / n,
        c01 / n,
        c11 / n,
        c12 / n,
        c02 / n,
        c12 / n,
        c22 / n,
    );

    let eigen = SymmetricEigen::new(cov);
    eigen
        .eigenvalues
        .iter()
        .fold(f64::INFINITY, |acc, &v| acc.min(v))
        .max(0.0)
}

/// Classify a voxel neighborhood by its off-plane variance against the
/// flatness threshold τ. Pure; always succeeds.
pub fn classify(points: &[[f64; 3]], threshold: f64) -> ShapeClass {
    if smallest_eigenvalue(points) > threshold {
        ShapeClass::Structured
    } else {
        ShapeClass::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, smallest_eigenvalue, ShapeClass};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    const TAU: f64 = 1e-5;

    fn planar_patch() -> Vec<[f64; 3]> {
        // 10 points on the z = 0.25 plane, well separated
        let mut pts = Vec::new();
        for &x in &[0.1, 0.3, 0.5, 0.7, 0.9] {
            pts.push([x, 0.2, 0.25]);
            pts.push([x, 0.8, 0.25]);
        }
        pts
    }

    fn structured_patch() -> Vec<[f64; 3]> {
        // Same footprint but z alternates between two levels
        let mut pts = Vec::new();
        for (i, &x) in [0.1, 0.3, 0.5, 0.7, 0.9].iter().enumerate() {
            let z = if i % 2 == 0 { 0.1 } else { 0.9 };
            pts.push([x, 0.2, z]);
            pts.push([x, 0.8, 1.0 - z]);
        }
        pts
    }

    #[test]
    fn coplanar_points_have_zero_smallest_eigenvalue() {
        let ev = smallest_eigenvalue(&planar_patch());
        assert_abs_diff_eq!(ev, 0.0, epsilon = 1e-12);
        assert_eq!(classify(&planar_patch(), TAU), ShapeClass::Flat);
    }

    #[test]
    fn off_plane_spread_is_structured() {
        let ev = smallest_eigenvalue(&structured_patch());
        assert!(ev > TAU, "off-plane variance {} should exceed tau", ev);
        assert_eq!(classify(&structured_patch(), TAU), ShapeClass::Structured);
    }

    #[test]
    fn tilted_plane_is_still_flat() {
        // Plane z = x + 2y, not axis aligned
        let pts: Vec<[f64; 3]> = planar_patch()
            .iter()
            .map(|p| [p[0], p[1], p[0] + 2.0 * p[1]])
            .collect();
        assert_eq!(classify(&pts, TAU), ShapeClass::Flat);
    }

    #[test]
    fn degenerate_inputs_are_flat() {
        assert_eq!(smallest_eigenvalue(&[]), 0.0);
        assert_eq!(smallest_eigenvalue(&[[1.0, 2.0, 3.0]]), 0.0);
        // Collinear points: two zero eigenvalues
        let line: Vec<[f64; 3]> = (0..5).map(|i| [i as f64, 0.0, 0.0]).collect();
        assert_abs_diff_eq!(smallest_eigenvalue(&line), 0.0, epsilon = 1e-12);
        assert_eq!(classify(&line, TAU), ShapeClass::Flat);
    }

    #[test]
    fn translation_does_not_change_eigenvalue() {
        let base = structured_patch();
        let shifted: Vec<[f64; 3]> = base
            .iter()
            .map(|p| [p[0] + 1000.0, p[1] - 500.0, p[2] + 42.0])
            .collect();
        assert_abs_diff_eq!(
            smallest_eigenvalue(&base),
            smallest_eigenvalue(&shifted),
            epsilon = 1e-8
        );
    }

    proptest! {
        #[test]
        fn smallest_eigenvalue_is_nonnegative(
            pts in prop::collection::vec(
                (-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0),
                0..20
            )
        ) {
            let pts: Vec<[f64; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            prop_assert!(smallest_eigenvalue(&pts) >= 0.0);
        }
    }
}
