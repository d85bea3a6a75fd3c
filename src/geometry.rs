//! Planar and 3-D geometry used by the registration.
//!
//! Positions are `[M, 3]` arrays (one point per row).  Every transform
//! returns a fresh array; inputs are never modified.
//!
//! Rotation planes are ordered so that a positive angle is a right-handed
//! rotation about the named axis:
//!
//! ```text
//!   axis   plane coordinates
//!   x      (y, z)
//!   y      (z, x)
//!   z      (x, y)
//! ```
use nalgebra::{Rotation3, Unit, Vector3};
use ndarray::{Array2, ArrayView1};

/// Coordinate axis of a rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    /// Projection of `p` onto the plane perpendicular to this axis, in the
    /// orientation listed in the module docs.
    #[inline]
    pub fn plane(self, p: &Vector3<f64>) -> [f64; 2] {
        match self {
            Axis::X => [p.y, p.z],
            Axis::Y => [p.z, p.x],
            Axis::Z => [p.x, p.y],
        }
    }
}

#[inline]
pub fn dist_2d(a: [f64; 2], b: [f64; 2]) -> f64 {
    dist_2d_sq(a, b).sqrt()
}

#[inline]
pub fn dist_2d_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

#[inline]
pub fn dist_3d(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

#[inline]
pub fn midpoint(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    (a + b) / 2.0
}

/// Cosine of the angle at the origin of the triangle `(0, a, b)`, by the law
/// of cosines.
///
/// Values pushed outside `[-1, 1]` by rounding are snapped to `±1`.  A
/// degenerate triangle (either point at the origin) yields NaN, which is
/// treated as `1`, i.e. no rotation.
pub fn clamped_cosine(a: [f64; 2], b: [f64; 2]) -> f64 {
    let o = [0.0, 0.0];
    let (oa, ob) = (dist_2d(o, a), dist_2d(o, b));
    let c = (dist_2d_sq(o, a) + dist_2d_sq(o, b) - dist_2d_sq(a, b)) / (2.0 * oa * ob);
    if c.is_nan() {
        1.0
    } else if c.abs() > 1.0 {
        c.signum()
    } else {
        c
    }
}

/// Signed angle (radians) that rotates `from` onto the direction of `to`
/// about the origin.
///
/// The magnitude is `acos` of [`clamped_cosine`]; the sign is positive when
/// `to` lies counter-clockwise of `from`.
pub fn planar_angle(from: [f64; 2], to: [f64; 2]) -> f64 {
    let angle = clamped_cosine(from, to).acos();
    let cross = from[0] * to[1] - from[1] * to[0];
    if cross < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Mean direction of `angles` (radians), taken on the unit circle so that
/// angles either side of `±π` do not cancel out.
///
/// ```
/// use optoreg::geometry::circular_mean;
/// let m = circular_mean(&[179f64.to_radians(), -179f64.to_radians()]);
/// assert!((m.abs() - std::f64::consts::PI).abs() < 1e-9);
/// ```
pub fn circular_mean(angles: &[f64]) -> f64 {
    let (sin, cos) = angles
        .iter()
        .fold((0.0, 0.0), |(s, c), a| (s + a.sin(), c + a.cos()));
    sin.atan2(cos)
}

/// Row `i` of `positions` as a vector.
#[inline]
pub fn point(positions: &Array2<f64>, i: usize) -> Vector3<f64> {
    to_vector(positions.row(i))
}

#[inline]
pub fn to_vector(row: ArrayView1<'_, f64>) -> Vector3<f64> {
    Vector3::new(row[0], row[1], row[2])
}

/// Rotate every point by `angle` radians about `axis` (right-handed).
pub fn rotate(positions: &Array2<f64>, axis: Axis, angle: f64) -> Array2<f64> {
    let rot = Rotation3::from_axis_angle(&axis.unit(), angle);
    let mut out = positions.clone();
    for mut row in out.rows_mut() {
        let v = rot * to_vector(row.view());
        row[0] = v.x;
        row[1] = v.y;
        row[2] = v.z;
    }
    out
}

/// Translate every point by `offset`.
pub fn shift(positions: &Array2<f64>, offset: &Vector3<f64>) -> Array2<f64> {
    let mut out = positions.clone();
    for mut row in out.rows_mut() {
        row[0] += offset.x;
        row[1] += offset.y;
        row[2] += offset.z;
    }
    out
}
