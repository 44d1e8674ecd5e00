//! Isoparametric shape functions for quadrilaterals

use nalgebra::Matrix2;

use crate::error::{FEAError, FEAResult};

/// Shape function values and parent-space derivatives at one point
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeValues {
    pub n: Vec<f64>,
    pub dn_dr: Vec<f64>,
    pub dn_ds: Vec<f64>,
}

/// Shape functions mapped to the element plane
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDerivatives {
    pub n: Vec<f64>,
    pub dn_dx: Vec<f64>,
    pub dn_dy: Vec<f64>,
    /// `[[x,r  y,r], [x,s  y,s]]`
    pub jacobian: Matrix2<f64>,
    pub det_j: f64,
}

/// Bilinear functions of the 4-node quadrilateral, nodes counter-clockwise
/// from (-1, -1)
pub fn bilinear(r: f64, s: f64) -> ShapeValues {
    const NODES: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let mut v = ShapeValues {
        n: vec![0.0; 4],
        dn_dr: vec![0.0; 4],
        dn_ds: vec![0.0; 4],
    };
    for (i, (ri, si)) in NODES.iter().enumerate() {
        v.n[i] = 0.25 * (1.0 + ri * r) * (1.0 + si * s);
        v.dn_dr[i] = 0.25 * ri * (1.0 + si * s);
        v.dn_ds[i] = 0.25 * si * (1.0 + ri * r);
    }
    v
}

/// Parent coordinates of the 9-node quadrilateral: corners, edge midpoints
/// (edges 1-2, 2-3, 3-4, 4-1), centre
pub const LAGRANGE9_NODES: [(f64, f64); 9] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (0.0, -1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (0.0, 0.0),
];

/// Quadratic Lagrange polynomial through -1, 0, 1 equal to one at `node`
fn lagrange_1d(node: f64, x: f64) -> (f64, f64) {
    if node < -0.5 {
        (0.5 * x * (x - 1.0), x - 0.5)
    } else if node > 0.5 {
        (0.5 * x * (x + 1.0), x + 0.5)
    } else {
        (1.0 - x * x, -2.0 * x)
    }
}

/// Biquadratic Lagrange functions of the 9-node quadrilateral
pub fn lagrange9(r: f64, s: f64) -> ShapeValues {
    let mut v = ShapeValues {
        n: vec![0.0; 9],
        dn_dr: vec![0.0; 9],
        dn_ds: vec![0.0; 9],
    };
    for (i, (ri, si)) in LAGRANGE9_NODES.iter().enumerate() {
        let (lr, dlr) = lagrange_1d(*ri, r);
        let (ls, dls) = lagrange_1d(*si, s);
        v.n[i] = lr * ls;
        v.dn_dr[i] = dlr * ls;
        v.dn_ds[i] = lr * dls;
    }
    v
}

impl ShapeValues {
    /// Jacobian of the map from the parent square to the plane of `xy`
    pub fn jacobian(&self, xy: &[[f64; 2]]) -> Matrix2<f64> {
        let mut j = Matrix2::zeros();
        for (k, p) in xy.iter().enumerate() {
            j[(0, 0)] += p[0] * self.dn_dr[k];
            j[(0, 1)] += p[1] * self.dn_dr[k];
            j[(1, 0)] += p[0] * self.dn_ds[k];
            j[(1, 1)] += p[1] * self.dn_ds[k];
        }
        j
    }

    /// Cartesian derivatives over the element whose nodes have in-plane
    /// coordinates `xy`.
    ///
    /// A Jacobian determinant not larger than `tol` is rejected as degenerate
    /// geometry.
    pub fn to_cartesian(&self, xy: &[[f64; 2]], tol: f64) -> FEAResult<ShapeDerivatives> {
        let jacobian = self.jacobian(xy);
        let det_j = jacobian.determinant();
        if !(det_j > tol) {
            return Err(FEAError::InvalidGeometry(format!(
                "Jacobian determinant {det_j:e} is not positive"
            )));
        }
        let inv = Matrix2::new(
            jacobian[(1, 1)] / det_j,
            -jacobian[(0, 1)] / det_j,
            -jacobian[(1, 0)] / det_j,
            jacobian[(0, 0)] / det_j,
        );
        let nn = self.n.len();
        let mut dn_dx = vec![0.0; nn];
        let mut dn_dy = vec![0.0; nn];
        for k in 0..nn {
            dn_dx[k] = inv[(0, 0)] * self.dn_dr[k] + inv[(0, 1)] * self.dn_ds[k];
            dn_dy[k] = inv[(1, 0)] * self.dn_dr[k] + inv[(1, 1)] * self.dn_ds[k];
        }
        Ok(ShapeDerivatives {
            n: self.n.clone(),
            dn_dx,
            dn_dy,
            jacobian,
            det_j,
        })
    }
}
