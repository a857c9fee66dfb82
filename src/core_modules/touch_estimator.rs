// THEORY:
// The touch estimator turns the dominant region into a single contact point.
// The outline of a foot pressed onto the floor is roughly elliptical, so the
// region's boundary is fitted with the least-squares ellipse and the ellipse
// center is reported as the touch location. The boundary pixel count doubles as
// a confidence proxy: bigger footprints produce longer boundaries.
//
// Fitting details:
// 1.  **Normalization**: Points are shifted to their centroid and scaled to unit
//     RMS radius, which keeps the scatter matrices well conditioned for
//     boundaries that are hundreds of pixels long.
// 2.  **Constrained Conic Fit**: The conic `a u² + b uv + c v² + d u + e v + f = 0`
//     is fitted in the algebraic least-squares sense under `4ac - b² = 1`, so
//     the result is always an ellipse, even for concave outlines (an L, a
//     crescent, a foot with part of the leg) whose unconstrained best fit
//     would be a hyperbola. The linear terms are eliminated first, leaving a
//     3×3 eigenproblem whose single elliptic eigenvector is the solution.
// 3.  **Degenerate Input**: Fewer than five points, or points that all lie on
//     one line, have no ellipse and yield "no fit".

use crate::core_modules::region::{Region, RegionPoint};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

pub const DEFAULT_MIN_BOUNDARY_POINTS: usize = 100;

/// A conic needs five points to be determined.
pub const MIN_FIT_POINTS: usize = 5;

const DISCRIMINANT_EPSILON: f64 = 1e-12;
const COLLINEAR_EPSILON: f64 = 1e-9;

/// A fitted ellipse in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: (f64, f64),
    pub semi_major: f64,
    pub semi_minor: f64,
    /// Orientation of the major axis in radians, in `[0, π)`.
    pub angle: f64,
}

/// Best estimate of where an object touches the floor in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
    /// Boundary pixel count of the region the point came from.
    pub boundary_points: usize,
    /// Enclosed area of that region.
    pub area: f64,
    pub ellipse: Ellipse,
}

impl TouchPoint {
    pub fn confidence(&self) -> usize {
        self.boundary_points
    }
}

/// Derives a touch point from `region`, or `None` when the region is too small
/// to be anything but noise.
pub fn estimate(region: &Region, min_boundary_points: usize) -> Option<TouchPoint> {
    let boundary_points = region.point_count();
    if boundary_points <= min_boundary_points {
        return None;
    }

    let ellipse = fit_ellipse(region.points())?;
    Some(TouchPoint {
        x: ellipse.center.0,
        y: ellipse.center.1,
        boundary_points,
        area: region.area(),
        ellipse,
    })
}

/// Least-squares ellipse through `points`.
pub fn fit_ellipse(points: &[RegionPoint]) -> Option<Ellipse> {
    if points.len() < MIN_FIT_POINTS {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
    let mean_sq_radius = points
        .iter()
        .map(|p| (p.x as f64 - mean_x).powi(2) + (p.y as f64 - mean_y).powi(2))
        .sum::<f64>()
        / n;
    let scale = mean_sq_radius.sqrt();
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }

    // Scatter matrices for quadratic terms [u², uv, v²] and linear terms [u, v, 1].
    let mut s_quad = Matrix3::<f64>::zeros();
    let mut s_mixed = Matrix3::<f64>::zeros();
    let mut s_lin = Matrix3::<f64>::zeros();
    for p in points {
        let u = (p.x as f64 - mean_x) / scale;
        let v = (p.y as f64 - mean_y) / scale;
        let quad = Vector3::new(u * u, u * v, v * v);
        let lin = Vector3::new(u, v, 1.0);
        s_quad += quad * quad.transpose();
        s_mixed += quad * lin.transpose();
        s_lin += lin * lin.transpose();
    }

    // Collinear points leave the linear scatter singular up to rounding.
    let spread = (s_lin[(0, 0)] * s_lin[(1, 1)] - s_lin[(0, 1)] * s_lin[(0, 1)]) / (n * n);
    if spread < COLLINEAR_EPSILON {
        return None;
    }

    // Linear coefficients as a function of the quadratic ones.
    let linear_map = -(s_lin.try_inverse()? * s_mixed.transpose());
    let m = s_quad + s_mixed * linear_map;
    // Inverse of the 4ac - b² constraint matrix applied from the left.
    #[rustfmt::skip]
    let system = Matrix3::new(
        m[(2, 0)] / 2.0, m[(2, 1)] / 2.0, m[(2, 2)] / 2.0,
        -m[(1, 0)], -m[(1, 1)], -m[(1, 2)],
        m[(0, 0)] / 2.0, m[(0, 1)] / 2.0, m[(0, 2)] / 2.0,
    );

    let quadratic = system
        .complex_eigenvalues()
        .iter()
        .filter(|lambda| lambda.im.abs() <= 1e-9 * (1.0 + lambda.re.abs()))
        .filter_map(|lambda| null_vector(&(system - Matrix3::identity() * lambda.re)))
        .map(|q| (4.0 * q[0] * q[2] - q[1] * q[1], q))
        .filter(|(condition, _)| *condition > 0.0)
        .max_by(|(left, _), (right, _)| left.total_cmp(right))
        .map(|(_, q)| q)?;
    let linear = linear_map * quadratic;

    let (mut a, mut b, mut c) = (quadratic[0], quadratic[1], quadratic[2]);
    let (d, e, f) = (linear[0], linear[1], linear[2]);
    if [a, b, c, d, e, f].iter().any(|k| !k.is_finite()) {
        return None;
    }

    let discriminant = 4.0 * a * c - b * b;
    if discriminant <= DISCRIMINANT_EPSILON {
        return None;
    }

    // Center: gradient of the conic vanishes.
    let u0 = (b * e - 2.0 * c * d) / discriminant;
    let v0 = (b * d - 2.0 * a * e) / discriminant;

    // Conic value at the center; the centered ellipse is Q(u, v) = -f0.
    let mut f0 = (d * u0 + e * v0) / 2.0 + f;
    if a < 0.0 {
        a = -a;
        b = -b;
        c = -c;
        f0 = -f0;
    }
    if f0 >= 0.0 {
        return None;
    }

    let half_sum = (a + c) / 2.0;
    let half_spread = (((a - c) / 2.0).powi(2) + (b / 2.0).powi(2)).sqrt();
    let lambda_small = half_sum - half_spread;
    let lambda_large = half_sum + half_spread;
    if lambda_small <= 0.0 {
        return None;
    }

    let semi_major = (-f0 / lambda_small).sqrt() * scale;
    let semi_minor = (-f0 / lambda_large).sqrt() * scale;

    // 0.5 * atan2(b, a - c) points along the eigenvector of `lambda_large`,
    // i.e. the minor axis.
    let minor_angle = 0.5 * b.atan2(a - c);
    let angle = (minor_angle + PI / 2.0).rem_euclid(PI);

    Some(Ellipse {
        center: (mean_x + u0 * scale, mean_y + v0 * scale),
        semi_major,
        semi_minor,
        angle,
    })
}

/// Unit vector spanning the null space of a rank-2 matrix.
fn null_vector(matrix: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        matrix.row(0).transpose(),
        matrix.row(1).transpose(),
        matrix.row(2).transpose(),
    ];
    let candidate = [rows[0].cross(&rows[1]), rows[0].cross(&rows[2]), rows[1].cross(&rows[2])]
        .into_iter()
        .max_by(|left, right| left.norm_squared().total_cmp(&right.norm_squared()))?;
    (candidate.norm_squared() > 0.0).then(|| candidate.normalize())
}
