//! Mathematical utilities for element computations

pub mod gauss;
pub mod shape;

use nalgebra::{DMatrix, Matrix3, Vector3};

pub use gauss::{quad_2x2, quad_3x3, GaussPoint2d, GaussRule1d};
pub use shape::{bilinear, lagrange9, ShapeDerivatives, ShapeValues};

pub type Mat = DMatrix<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// Smallest eigenvalue of a symmetric matrix
pub fn min_eigenvalue(m: &Mat) -> f64 {
    m.clone()
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

/// Rotation whose rows are the unit vectors of a bar's local frame.
///
/// Row 0 is the bar axis `cos_x`. The other two rows complete a right
/// handed frame built without a reference vector.
pub fn bar_rotation(cos_x: &Vec3) -> Mat3 {
    let c = cos_x;
    let (row1, row2) = if c[0].abs() > 0.0 {
        (
            Vec3::new(-c[1], c[0], 0.0),
            Vec3::new(-c[0] * c[2], -c[1] * c[2], c[0] * c[0] + c[1] * c[1]),
        )
    } else {
        (Vec3::new(0.0, -c[2], c[1]), Vec3::new(1.0, 0.0, 0.0))
    };
    let row1 = row1.normalize();
    let row2 = row2.normalize();
    Mat3::from_rows(&[c.transpose(), row1.transpose(), row2.transpose()])
}

/// Largest absolute difference between `m` and its transpose
pub fn asymmetry(m: &Mat) -> f64 {
    (m - m.transpose()).amax()
}
