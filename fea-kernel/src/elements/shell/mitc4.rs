//! 4-node shell with Bathe-Dvorkin assumed transverse shear
//!
//! Covariant shear strains are sampled at the edge midpoints and
//! interpolated linearly across the element, which removes shear locking of
//! thin plates.

use nalgebra::{DMatrix, Vector2};

use super::{Shell, ShellFormulation};
use crate::error::{FEAError, FEAResult};
use crate::material::SectionModel;
use crate::math::{bilinear, quad_2x2, GaussPoint2d, ShapeDerivatives, ShapeValues};

/// Tying points in the parent square: bottom, top, left and right edge midpoints
const TYING_POINTS: [(f64, f64); 4] = [(0.0, -1.0), (0.0, 1.0), (-1.0, 0.0), (1.0, 0.0)];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mitc4;

/// Covariant shear rows `[gamma_r; gamma_s]` in local plate DOFs at `(r, s)`
fn covariant_shear(xl: &[[f64; 2]], r: f64, s: f64) -> DMatrix<f64> {
    let v = bilinear(r, s);
    let j = v.jacobian(xl);
    let mut g = DMatrix::zeros(2, 12);
    for k in 0..4 {
        // gamma_a = w,a + theta2 x,a - theta1 y,a
        g[(0, 3 * k)] = v.dn_dr[k];
        g[(0, 3 * k + 1)] = -v.n[k] * j[(0, 1)];
        g[(0, 3 * k + 2)] = v.n[k] * j[(0, 0)];
        g[(1, 3 * k)] = v.dn_ds[k];
        g[(1, 3 * k + 1)] = -v.n[k] * j[(1, 1)];
        g[(1, 3 * k + 2)] = v.n[k] * j[(1, 0)];
    }
    g
}

impl ShellFormulation for Mitc4 {
    const CLASS_NAME: &'static str = "ShellMITC4";
    const COROTATIONAL_CLASS_NAME: &'static str = "CorotShellMITC4";
    const NUM_NODES: usize = 4;
    const ACCEPTS_STRAIN_LOAD: bool = true;

    fn gauss_points() -> Vec<GaussPoint2d> {
        quad_2x2().to_vec()
    }

    fn shape(r: f64, s: f64) -> ShapeValues {
        bilinear(r, s)
    }

    fn shear_b(xl: &[[f64; 2]], gp: &GaussPoint2d, d: &ShapeDerivatives) -> FEAResult<DMatrix<f64>> {
        let [a, c, dl, b] = TYING_POINTS.map(|(r, s)| covariant_shear(xl, r, s));

        // gamma_r from A and C, gamma_s from D and B
        let mut tied = DMatrix::zeros(2, 12);
        let (r, s) = (gp.r, gp.s);
        for col in 0..12 {
            tied[(0, col)] = 0.5 * (1.0 - s) * a[(0, col)] + 0.5 * (1.0 + s) * c[(0, col)];
            tied[(1, col)] = 0.5 * (1.0 - r) * dl[(1, col)] + 0.5 * (1.0 + r) * b[(1, col)];
        }

        let j_inv = d.jacobian.try_inverse().ok_or_else(|| {
            FEAError::InvalidGeometry(format!("singular Jacobian at ({r}, {s})"))
        })?;
        let mut shear = DMatrix::zeros(2, 12);
        for col in 0..12 {
            let cart = j_inv * Vector2::new(tied[(0, col)], tied[(1, col)]);
            shear[(0, col)] = cart[0];
            shear[(1, col)] = cart[1];
        }
        Ok(shear)
    }
}

impl Shell<Mitc4> {
    /// Create a 4-node shell.
    ///
    /// # Arguments
    /// * `tag` - element tag
    /// * `nodes` - node tags, counter-clockwise
    /// * `section` - membrane-plate section copied to each of the four
    ///   integration points
    pub fn new(tag: usize, nodes: [usize; 4], section: SectionModel) -> FEAResult<Self> {
        Self::build(tag, nodes.to_vec(), section)
    }
}
